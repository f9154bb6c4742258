//! Health- and latency-aware JSON load balancer library.

pub mod admin;
pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod resilience;

pub use config::schema::LbConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use load_balancer::{Pool, Target};
