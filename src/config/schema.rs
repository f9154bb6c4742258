//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the load balancer.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the load balancer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LbConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Initial targets and selection settings.
    pub pool: PoolConfig,

    /// Per-target health monitor settings.
    pub health_check: HealthCheckConfig,

    /// Forwarding and retry settings.
    pub proxy: ProxyConfig,

    /// Management endpoint settings.
    pub admin: AdminConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:30000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:30000".to_string(),
        }
    }
}

/// Pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Targets added at startup (e.g., "http://127.0.0.1:20000").
    pub targets: Vec<String>,

    /// Highest average latency (ms) at which a healthy target is still selectable.
    pub availability_threshold_ms: f64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            availability_threshold_ms: 100.0,
        }
    }
}

/// Health monitor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Interval between liveness probes in milliseconds.
    pub liveness_interval_ms: u64,

    /// Timeout of a single liveness probe in milliseconds.
    pub probe_timeout_ms: u64,

    /// Pause before the single probe retry in milliseconds.
    pub probe_retry_delay_ms: u64,

    /// Interval between latency aggregations in milliseconds.
    pub latency_interval_ms: u64,

    /// Age of the newest sample after which the latency window is discarded.
    pub stale_after_ms: u64,
}

impl HealthCheckConfig {
    pub fn liveness_interval(&self) -> Duration {
        Duration::from_millis(self.liveness_interval_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn probe_retry_delay(&self) -> Duration {
        Duration::from_millis(self.probe_retry_delay_ms)
    }

    pub fn latency_interval(&self) -> Duration {
        Duration::from_millis(self.latency_interval_ms)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_millis(self.stale_after_ms)
    }
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            liveness_interval_ms: 1_000,
            probe_timeout_ms: 10,
            probe_retry_delay_ms: 100,
            latency_interval_ms: 2_000,
            stale_after_ms: 5_000,
        }
    }
}

/// Forwarding configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Timeout for a forwarded call in seconds.
    pub forward_timeout_secs: u64,

    /// Total attempts per request, first try included.
    pub max_attempts: u32,

    /// Fixed pause between attempts in milliseconds.
    pub retry_delay_ms: u64,

    /// Maximum accepted request body in bytes.
    pub max_body_size: usize,
}

impl ProxyConfig {
    pub fn forward_timeout(&self) -> Duration {
        Duration::from_secs(self.forward_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            forward_timeout_secs: 200,
            max_attempts: 2,
            retry_delay_ms: 1_500,
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Management endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AdminConfig {
    /// Bearer token required on management endpoints. Open when unset.
    pub api_key: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
