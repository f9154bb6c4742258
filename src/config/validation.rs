//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, threshold > 0)
//! - Check addresses parse (listener, metrics, initial targets)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: LbConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::LbConfig;
use crate::load_balancer::target::{canonical_endpoint, TargetError};

/// A single semantic problem in the configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("{field} is not a socket address: `{value}`")]
    BadSocketAddr { field: &'static str, value: String },

    #[error("invalid target `{address}`: {source}")]
    BadTarget {
        address: String,
        #[source]
        source: TargetError,
    },
}

pub fn validate_config(config: &LbConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BadSocketAddr {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::BadSocketAddr {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    let threshold = config.pool.availability_threshold_ms;
    if threshold.is_nan() || threshold <= 0.0 {
        errors.push(ValidationError::NotPositive { field: "pool.availability_threshold_ms" });
    }

    let health = &config.health_check;
    let durations = [
        ("health_check.liveness_interval_ms", health.liveness_interval_ms),
        ("health_check.probe_timeout_ms", health.probe_timeout_ms),
        ("health_check.latency_interval_ms", health.latency_interval_ms),
        ("health_check.stale_after_ms", health.stale_after_ms),
        ("proxy.forward_timeout_secs", config.proxy.forward_timeout_secs),
    ];
    for (field, value) in durations {
        if value == 0 {
            errors.push(ValidationError::NotPositive { field });
        }
    }

    if config.proxy.max_attempts == 0 {
        errors.push(ValidationError::NotPositive { field: "proxy.max_attempts" });
    }

    for address in &config.pool.targets {
        if let Err(source) = canonical_endpoint(address) {
            errors.push(ValidationError::BadTarget {
                address: address.clone(),
                source,
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
