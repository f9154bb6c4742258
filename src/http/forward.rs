//! JSON forwarding to targets.
//!
//! # Responsibilities
//! - Pick a target from the pool and POST the body to `{endpoint}/json`
//! - Time every call and record the sample off the response path
//! - Retry transport failures per the retry policy, re-selecting each time
//! - Translate the outcome into the client response
//!
//! # Design Decisions
//! - The request body is buffered so a retry can replay it
//! - Backend status codes pass through untouched and are never retried
//! - Only 2xx responses carry the body and a JSON content type

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use hyper::body::Incoming;
use thiserror::Error;

use crate::config::ProxyConfig;
use crate::http::client::UpstreamClient;
use crate::http::request::X_REQUEST_ID;
use crate::load_balancer::{Pool, Target};
use crate::observability::metrics;
use crate::resilience::retries::RetryPolicy;
use crate::resilience::timeouts::{with_deadline, DeadlineExceeded};

const APPLICATION_JSON: &str = "application/json";

/// Failure to get any response out of a target.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("failed to build upstream request: {0}")]
    Request(#[from] axum::http::Error),

    #[error("error calling target: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),

    #[error("target did not respond: {0}")]
    Timeout(#[from] DeadlineExceeded),
}

impl ForwardError {
    /// Transport and timeout failures may succeed on another attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ForwardError::Request(_))
    }
}

/// Sends request bodies to targets selected from a pool.
#[derive(Clone)]
pub struct Forwarder {
    client: UpstreamClient,
    timeout: Duration,
    retry: RetryPolicy,
}

impl Forwarder {
    pub fn new(client: UpstreamClient, config: &ProxyConfig) -> Self {
        Self {
            client,
            timeout: config.forward_timeout(),
            retry: RetryPolicy::from_config(config),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Forward `body` to the next available target, retrying transport failures.
    pub async fn forward(
        &self,
        pool: &Pool,
        body: Bytes,
        request_id: Option<HeaderValue>,
    ) -> Response {
        let mut attempt = 0;

        loop {
            attempt += 1;

            let Some(target) = pool.select_target() else {
                tracing::warn!(attempt, pool_size = pool.len(), "No available instance");
                return service_unavailable();
            };

            match self.send(&target, body.clone(), request_id.clone()).await {
                Ok(response) => return relay(&target, response),
                Err(e) => {
                    tracing::error!(
                        target_endpoint = %target.endpoint(),
                        attempt,
                        error = %e,
                        "Upstream error"
                    );

                    if !(e.is_retryable() && self.retry.allows_retry_after(attempt)) {
                        return service_unavailable();
                    }

                    tracing::info!(attempt, delay = ?self.retry.delay, "Retrying after transport error");
                    self.retry.pause().await;
                }
            }
        }
    }

    /// One timed call to `target`. The latency sample is recorded whatever the outcome.
    pub async fn send(
        &self,
        target: &Arc<Target>,
        body: Bytes,
        request_id: Option<HeaderValue>,
    ) -> Result<Response<Incoming>, ForwardError> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(target.json_url())
            .header(header::CONTENT_TYPE, APPLICATION_JSON);
        if let Some(id) = request_id {
            builder = builder.header(X_REQUEST_ID, id);
        }
        let request = builder.body(Body::from(body))?;

        let started = Instant::now();
        let result = with_deadline(self.timeout, self.client.request(request)).await;
        let finished = Instant::now();

        let recorder = Arc::clone(target);
        tokio::spawn(async move {
            recorder.record_sample(started, finished);
        });

        Ok(result??)
    }
}

fn relay(target: &Target, response: Response<Incoming>) -> Response {
    let status = response.status();
    metrics::record_response_status(status.as_u16());

    if !status.is_success() {
        tracing::debug!(target_endpoint = %target.endpoint(), status = %status, "Passing through target status");
        return status.into_response();
    }

    tracing::debug!(target_endpoint = %target.endpoint(), "Responding from target");
    let (_, body) = response.into_parts();
    (
        status,
        [(header::CONTENT_TYPE, APPLICATION_JSON)],
        Body::new(body),
    )
        .into_response()
}

fn service_unavailable() -> Response {
    metrics::record_response_status(StatusCode::SERVICE_UNAVAILABLE.as_u16());
    StatusCode::SERVICE_UNAVAILABLE.into_response()
}
