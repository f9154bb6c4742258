//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Proxy handler asks for a target
//!     → pool.rs (lock targets + cursor)
//!     → round_robin.rs (scan from cursor + 1, skip unavailable)
//!     → target.rs (healthy && average latency <= threshold)
//!     → Return target or None
//!
//! Management:
//!     add    → target.rs validates address → pool appends → monitor spawned
//!     remove → pool drops first prefix match → monitor cancelled
//! ```
//!
//! # Design Decisions
//! - Availability is evaluated on every selection, never cached
//! - Selection, addition and removal are serialized by the pool lock
//! - Round robin is fair among available targets only

pub mod pool;
pub mod round_robin;
pub mod target;

pub use pool::{Pool, TargetStatus};
pub use target::{Target, TargetError};
