//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Structured key/value fields on every event
//! - Request ID flows through the HTTP layer via x-request-id
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
