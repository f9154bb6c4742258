//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to backend:
//!     → timeouts.rs (enforce probe / forward deadline)
//!     → On transport failure: retries.rs (fixed pause, re-select, try again)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Retries are bounded and request-scoped

pub mod retries;
pub mod timeouts;
