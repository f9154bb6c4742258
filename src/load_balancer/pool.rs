//! Target pool management.
//!
//! # Responsibilities
//! - Own the ordered list of targets and the round-robin cursor
//! - Add targets and start their health monitors
//! - Remove targets and cancel their health monitors
//! - Select the next available target
//! - Report per-target status

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::{HealthCheckConfig, PoolConfig};
use crate::health::active::HealthMonitor;
use crate::http::client::UpstreamClient;
use crate::load_balancer::{
    round_robin::RoundRobin,
    target::{Target, TargetError},
};

/// Point-in-time view of one target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetStatus {
    pub endpoint: String,
    pub healthy: bool,
    pub available: bool,
}

#[derive(Debug, Default)]
struct PoolInner {
    targets: Vec<Arc<Target>>,
    selector: RoundRobin,
}

/// Ordered pool of targets with availability-aware round robin.
pub struct Pool {
    /// Targets and cursor change together under this lock.
    inner: Mutex<PoolInner>,
    client: UpstreamClient,
    health: HealthCheckConfig,
    max_latency_ms: f64,
    /// Parent of every target's monitor token.
    lifecycle: CancellationToken,
}

impl Pool {
    /// Create an empty pool whose monitors stop when `parent` is cancelled.
    pub fn new(
        config: &PoolConfig,
        health: HealthCheckConfig,
        client: UpstreamClient,
        parent: &CancellationToken,
    ) -> Self {
        Self {
            inner: Mutex::new(PoolInner::default()),
            client,
            health,
            max_latency_ms: config.availability_threshold_ms,
            lifecycle: parent.child_token(),
        }
    }

    /// Create a pool and add every configured target, failing on the first invalid one.
    pub fn with_targets(
        config: &PoolConfig,
        health: HealthCheckConfig,
        client: UpstreamClient,
        parent: &CancellationToken,
    ) -> Result<Self, TargetError> {
        let pool = Self::new(config, health, client, parent);
        for address in &config.targets {
            pool.add_target(address)?;
        }
        Ok(pool)
    }

    fn lock(&self) -> MutexGuard<'_, PoolInner> {
        self.inner.lock().expect("pool mutex poisoned")
    }

    /// Validate `address`, append it and start its health monitor.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn add_target(&self, address: &str) -> Result<Arc<Target>, TargetError> {
        let target = Arc::new(Target::with_lifecycle(address, self.lifecycle.child_token())?);

        let total = {
            let mut inner = self.lock();
            inner.targets.push(target.clone());
            inner.targets.len()
        };

        HealthMonitor::new(target.clone(), self.client.clone(), self.health.clone()).spawn();

        tracing::info!(target_endpoint = %target.endpoint(), pool_size = total, "Target added");
        Ok(target)
    }

    /// Remove the first target whose endpoint prefixes `match_key` and stop its monitor.
    ///
    /// Unknown keys are ignored.
    pub fn remove_target(&self, match_key: &str) -> Option<Arc<Target>> {
        let match_key = match_key.trim();
        let mut inner = self.lock();

        let index = inner
            .targets
            .iter()
            .position(|t| match_key.starts_with(t.endpoint()))?;

        let target = inner.targets.remove(index);
        target.cancel();

        tracing::info!(
            target_endpoint = %target.endpoint(),
            pool_size = inner.targets.len(),
            "Target removed"
        );
        Some(target)
    }

    /// Next available target in round-robin order, if any.
    pub fn select_target(&self) -> Option<Arc<Target>> {
        let mut inner = self.lock();
        let PoolInner { targets, selector } = &mut *inner;
        let picked = selector.next_available(targets, self.max_latency_ms);

        if picked.is_none() {
            tracing::debug!(pool_size = targets.len(), "No available target");
        }
        picked
    }

    /// Endpoint, health and availability of every target, in pool order.
    pub fn snapshot(&self) -> Vec<TargetStatus> {
        self.lock()
            .targets
            .iter()
            .map(|t| {
                let state = t.snapshot();
                TargetStatus {
                    endpoint: t.endpoint().to_string(),
                    healthy: state.is_healthy(),
                    available: state.is_available(self.max_latency_ms),
                }
            })
            .collect()
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.lock()
            .targets
            .iter()
            .map(|t| t.endpoint().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().targets.is_empty()
    }

    pub fn max_latency_ms(&self) -> f64 {
        self.max_latency_ms
    }

    /// Stop every health monitor. Targets stay listed.
    pub fn shutdown(&self) {
        self.lifecycle.cancel();
    }

    #[cfg(test)]
    fn cursor(&self) -> usize {
        self.lock().selector.cursor()
    }

    /// Append a target without starting its monitor.
    #[cfg(test)]
    fn push_unmonitored(&self, address: &str) -> Arc<Target> {
        let target = Arc::new(Target::with_lifecycle(address, self.lifecycle.child_token()).unwrap());
        self.lock().targets.push(target.clone());
        target
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        self.lifecycle.cancel();
    }
}
