//! Retry logic.
//!
//! # Responsibilities
//! - Decide whether a failed forward gets another attempt
//! - Pause a fixed delay between attempts
//!
//! # Design Decisions
//! - Only transport failures are retried; backend status codes pass through
//! - Fixed delay, no jitter: at most one retry by default
//! - Each attempt re-selects a target from the pool

use std::time::Duration;

use crate::config::ProxyConfig;

/// Bounded, fixed-delay retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first try included.
    pub max_attempts: u32,
    /// Pause before each retry.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn from_config(config: &ProxyConfig) -> Self {
        Self::new(config.max_attempts, config.retry_delay())
    }

    /// Whether another attempt is allowed after `attempt` (1-based) failed.
    pub fn allows_retry_after(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    pub async fn pause(&self) {
        tokio::time::sleep(self.delay).await;
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ProxyConfig::default())
    }
}
