//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → .env / environment overrides (LB_INSTANCELIST, LB_BIND_ADDRESS)
//!     → validation.rs (semantic checks)
//!     → LbConfig (validated, immutable)
//!     → handed to subsystems at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; pool membership changes go through the
//!   management endpoints instead
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::{
    AdminConfig, HealthCheckConfig, LbConfig, ListenerConfig, ObservabilityConfig, PoolConfig,
    ProxyConfig,
};
