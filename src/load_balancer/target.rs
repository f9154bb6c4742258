//! Target abstraction.
//!
//! # Responsibilities
//! - Represent a single backend instance
//! - Validate and canonicalize its address
//! - Track liveness and the rolling latency average
//! - Own the cancellation token of its health monitor

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::health::latency::LatencyWindow;

/// Errors raised while constructing a target.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TargetError {
    /// The address could not be parsed as a URL.
    #[error("malformed url `{address}`: {source}")]
    Malformed {
        address: String,
        #[source]
        source: url::ParseError,
    },

    /// Only plain `http` backends are supported.
    #[error("invalid url protocol, expected `http`, got `{0}`")]
    UnsupportedScheme(String),

    /// The URL parsed but carries no host.
    #[error("url `{0}` has no host")]
    MissingHost(String),
}

/// Health State enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HealthState {
    /// Not probed yet; treated as unhealthy.
    #[default]
    Unknown,
    Healthy,
    Unhealthy,
}

/// Reduce an address to `http://host[:port]`, discarding path and query.
pub fn canonical_endpoint(address: &str) -> Result<String, TargetError> {
    let url = Url::parse(address.trim()).map_err(|source| TargetError::Malformed {
        address: address.to_string(),
        source,
    })?;

    if url.scheme() != "http" {
        return Err(TargetError::UnsupportedScheme(url.scheme().to_string()));
    }

    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| TargetError::MissingHost(address.to_string()))?;

    Ok(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}

/// Mutable state of a target, guarded by the target lock.
#[derive(Debug, Clone, Default)]
pub struct TargetState {
    pub health: HealthState,
    pub window: LatencyWindow,
    pub average_latency_ms: f64,
    pub last_sample_at: Option<Instant>,
}

impl TargetState {
    pub fn is_healthy(&self) -> bool {
        self.health == HealthState::Healthy
    }

    /// Healthy and within the latency budget.
    pub fn is_available(&self, max_latency_ms: f64) -> bool {
        self.is_healthy() && self.average_latency_ms <= max_latency_ms
    }
}

/// A single backend instance.
#[derive(Debug)]
pub struct Target {
    endpoint: String,
    state: Mutex<TargetState>,
    cancel: CancellationToken,
}

impl Target {
    /// Validate `address` and build a target with its own lifecycle token.
    pub fn new(address: &str) -> Result<Self, TargetError> {
        Self::with_lifecycle(address, CancellationToken::new())
    }

    /// Validate `address` and bind the target to an existing lifecycle token.
    pub fn with_lifecycle(address: &str, cancel: CancellationToken) -> Result<Self, TargetError> {
        let endpoint = canonical_endpoint(address)?;
        Ok(Self {
            endpoint,
            state: Mutex::new(TargetState::default()),
            cancel,
        })
    }

    /// Canonical `scheme://host[:port]`.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn health_url(&self) -> String {
        format!("{}/health", self.endpoint)
    }

    pub fn json_url(&self) -> String {
        format!("{}/json", self.endpoint)
    }

    fn lock(&self) -> MutexGuard<'_, TargetState> {
        self.state.lock().expect("target state mutex poisoned")
    }

    // --- Health Logic ---

    pub fn is_healthy(&self) -> bool {
        self.lock().is_healthy()
    }

    pub fn is_available(&self, max_latency_ms: f64) -> bool {
        self.lock().is_available(max_latency_ms)
    }

    pub fn average_latency_ms(&self) -> f64 {
        self.lock().average_latency_ms
    }

    /// Consistent copy of the current state.
    pub fn snapshot(&self) -> TargetState {
        self.lock().clone()
    }

    /// Store a liveness result. Returns the previous state.
    pub fn set_healthy(&self, healthy: bool) -> HealthState {
        let next = if healthy {
            HealthState::Healthy
        } else {
            HealthState::Unhealthy
        };
        std::mem::replace(&mut self.lock().health, next)
    }

    // --- Latency Logic ---

    /// Record the round trip of a proxied call.
    pub fn record_sample(&self, started: Instant, finished: Instant) {
        let millis = finished.saturating_duration_since(started).as_millis();
        let millis = u64::try_from(millis).unwrap_or(u64::MAX);

        let mut state = self.lock();
        state.window.push(millis);
        state.last_sample_at = Some(finished);
    }

    /// Recompute the rolling average.
    ///
    /// A target with no sample newer than `stale_after` has its window and
    /// average reset to zero. Returns the new average.
    pub fn aggregate_latency(&self, stale_after: Duration) -> f64 {
        let mut state = self.lock();

        let stale = state
            .last_sample_at
            .map(|at| at.elapsed() > stale_after)
            .unwrap_or(true);

        if stale {
            state.window.clear();
            state.average_latency_ms = 0.0;
        } else if let Some(mean) = state.window.mean() {
            state.average_latency_ms = mean;
        }

        state.average_latency_ms
    }

    // --- Lifecycle ---

    /// Stop the health monitor. Idempotent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_strips_path_and_query() {
        let target = Target::new("http://localhost:8000/json?x=1").unwrap();
        assert_eq!(target.endpoint(), "http://localhost:8000");
        assert_eq!(target.health_url(), "http://localhost:8000/health");
        assert_eq!(target.json_url(), "http://localhost:8000/json");

        let target = Target::new("http://example.org/a/b").unwrap();
        assert_eq!(target.endpoint(), "http://example.org");
    }

    #[test]
    fn test_rejects_malformed_address() {
        let err = Target::new("http://localhost:8000json").unwrap_err();
        assert!(matches!(err, TargetError::Malformed { .. }));
    }

    #[test]
    fn test_rejects_other_schemes() {
        let err = Target::new("mailto://some@example.org").unwrap_err();
        assert_eq!(err, TargetError::UnsupportedScheme("mailto".into()));

        let err = Target::new("https://example.org").unwrap_err();
        assert_eq!(err, TargetError::UnsupportedScheme("https".into()));

        // Parses with `localhost` as the scheme.
        let err = Target::new("localhost:20000").unwrap_err();
        assert_eq!(err, TargetError::UnsupportedScheme("localhost".into()));
    }

    #[test]
    fn test_starts_unhealthy() {
        let target = Target::new("http://127.0.0.1:5678").unwrap();
        assert!(!target.is_healthy());
        assert!(!target.is_available(100.0));
        assert_eq!(target.snapshot().health, HealthState::Unknown);
    }

    #[test]
    fn test_availability_predicate() {
        let target = Target::new("http://127.0.0.1:5678").unwrap();
        assert_eq!(target.set_healthy(true), HealthState::Unknown);
        assert!(target.is_available(100.0));

        let now = Instant::now();
        target.record_sample(now, now + Duration::from_millis(101));
        assert_eq!(target.aggregate_latency(Duration::from_secs(60)), 101.0);
        assert!(!target.is_available(100.0));
        assert!(target.is_available(101.0));

        target.set_healthy(false);
        assert!(!target.is_available(f64::MAX));
    }

    #[test]
    fn test_record_sample_window() {
        let target = Target::new("http://127.0.0.1:5678").unwrap();
        let base = Instant::now();

        target.record_sample(base + Duration::from_millis(10), base + Duration::from_millis(20));
        let state = target.snapshot();
        assert_eq!(state.window.iter().collect::<Vec<_>>(), vec![10]);
        assert_eq!(state.last_sample_at, Some(base + Duration::from_millis(20)));

        for i in 0..31u64 {
            target.record_sample(
                base + Duration::from_millis(i),
                base + Duration::from_millis(2 * i + 20),
            );
        }

        let samples: Vec<u64> = target.snapshot().window.iter().collect();
        assert_eq!(samples.len(), 20);
        assert_eq!(samples[0], 31);
        assert_eq!(samples[19], 50);
    }

    #[test]
    fn test_stale_window_resets() {
        let target = Target::new("http://127.0.0.1:5678").unwrap();
        let long_ago = Instant::now() - Duration::from_secs(10);
        target.record_sample(long_ago, long_ago + Duration::from_millis(500));

        assert_eq!(target.aggregate_latency(Duration::from_secs(5)), 0.0);
        assert!(target.snapshot().window.is_empty());
    }

    #[test]
    fn test_fresh_window_averages() {
        let target = Target::new("http://127.0.0.1:5678").unwrap();
        let now = Instant::now();
        target.record_sample(now, now + Duration::from_millis(100));
        target.record_sample(now, now + Duration::from_millis(200));

        assert_eq!(target.aggregate_latency(Duration::from_secs(5)), 150.0);
        assert_eq!(target.average_latency_ms(), 150.0);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let parent = CancellationToken::new();
        let target = Target::with_lifecycle("http://127.0.0.1:5678", parent.child_token()).unwrap();
        assert!(!target.is_cancelled());

        target.cancel();
        target.cancel();
        assert!(target.is_cancelled());
        assert!(!parent.is_cancelled());
    }
}
