//! Active health checking.
//!
//! # Responsibilities
//! - Probe one target's `/health` endpoint on a fixed interval
//! - Retry a failed probe once before declaring the target unhealthy
//! - Recompute the rolling latency average on an independent interval
//! - Stop as soon as the target's lifecycle token is cancelled

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::config::HealthCheckConfig;
use crate::http::client::UpstreamClient;
use crate::load_balancer::target::{HealthState, Target};
use crate::observability::metrics;
use crate::resilience::timeouts::with_deadline;

const USER_AGENT: &str = "json-lb-health-check";

/// Background monitor bound to a single target.
pub struct HealthMonitor {
    target: Arc<Target>,
    client: UpstreamClient,
    config: HealthCheckConfig,
}

impl HealthMonitor {
    pub fn new(target: Arc<Target>, client: UpstreamClient, config: HealthCheckConfig) -> Self {
        Self {
            target,
            client,
            config,
        }
    }

    /// Run the monitor on the Tokio runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(self) {
        let cancel = self.target.cancellation_token();

        tracing::debug!(
            target_endpoint = %self.target.endpoint(),
            liveness_ms = self.config.liveness_interval_ms,
            latency_ms = self.config.latency_interval_ms,
            "Health monitor starting"
        );

        let mut liveness = time::interval(self.config.liveness_interval());
        liveness.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut aggregation = time::interval(self.config.latency_interval());
        aggregation.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = liveness.tick() => {
                    // A probe in flight must not outlive the target.
                    let healthy = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        healthy = self.check_liveness() => healthy,
                    };
                    self.commit_liveness(healthy);
                }
                _ = aggregation.tick() => {
                    let average = self.target.aggregate_latency(self.config.stale_after());
                    metrics::record_average_latency(self.target.endpoint(), average);
                }
            }
        }

        tracing::debug!(target_endpoint = %self.target.endpoint(), "Health monitor stopped");
    }

    /// One probe, plus a single retry after a short pause.
    async fn check_liveness(&self) -> bool {
        if self.probe().await {
            return true;
        }
        time::sleep(self.config.probe_retry_delay()).await;
        self.probe().await
    }

    async fn probe(&self) -> bool {
        let endpoint = self.target.endpoint();
        let request = match Request::builder()
            .method(Method::GET)
            .uri(self.target.health_url())
            .header(header::USER_AGENT, USER_AGENT)
            .body(Body::empty())
        {
            Ok(req) => req,
            Err(e) => {
                tracing::error!(target_endpoint = %endpoint, error = %e, "Failed to build health check request");
                return false;
            }
        };

        match with_deadline(self.config.probe_timeout(), self.client.request(request)).await {
            Ok(Ok(response)) => {
                let success = response.status().is_success();
                if !success {
                    tracing::debug!(target_endpoint = %endpoint, status = %response.status(), "Health probe failed: non-success status");
                }
                success
            }
            Ok(Err(e)) => {
                tracing::debug!(target_endpoint = %endpoint, error = %e, "Health probe failed: connection error");
                false
            }
            Err(e) => {
                tracing::debug!(target_endpoint = %endpoint, error = %e, "Health probe failed: timeout");
                false
            }
        }
    }

    fn commit_liveness(&self, healthy: bool) {
        let previous = self.target.set_healthy(healthy);
        let endpoint = self.target.endpoint();

        match (previous, healthy) {
            (HealthState::Healthy, true) | (HealthState::Unhealthy, false) => {}
            (_, true) => tracing::info!(target_endpoint = %endpoint, "Target is healthy"),
            (_, false) => tracing::warn!(target_endpoint = %endpoint, previous = ?previous, "Target is unhealthy"),
        }

        metrics::record_target_health(endpoint, healthy);
    }
}
