//! Metrics collection and exposition.
//!
//! # Metrics
//! - `lb_response_status_total` (counter): responses sent by status code
//! - `lb_avg_response_millis` (gauge): rolling average latency per instance
//! - `lb_target_healthy` (gauge): 1=healthy, 0=unhealthy per instance
//!
//! Recording goes through the `metrics` facade and is a no-op until an
//! exporter is installed.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_response_status(status: u16) {
    counter!("lb_response_status_total", "status" => status.to_string()).increment(1);
}

pub fn record_average_latency(instance: &str, millis: f64) {
    gauge!("lb_avg_response_millis", "instance" => instance.to_string()).set(millis);
}

pub fn record_target_health(instance: &str, healthy: bool) {
    gauge!("lb_target_healthy", "instance" => instance.to_string()).set(if healthy { 1.0 } else { 0.0 });
}
