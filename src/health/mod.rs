//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Per target (active.rs), two independent timers:
//!     Liveness tick
//!     → GET {endpoint}/health (retry once after a short pause)
//!     → target.healthy
//!
//!     Aggregation tick
//!     → latency.rs window (reset when stale)
//!     → target.average_latency_ms
//!
//! Proxy path:
//!     Forwarded call finishes
//!     → sample pushed into latency.rs window (spawned, off the response path)
//! ```
//!
//! # Design Decisions
//! - One monitor task per target, cancelled when the target leaves the pool
//! - Both timers commit under the target's lock; no lock is held across I/O
//! - Backend status codes on the proxy path never change health

pub mod active;
pub mod latency;
