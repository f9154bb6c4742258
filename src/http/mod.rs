//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, routes)
//!     → request.rs (assign x-request-id)
//!     → POST /json → forward.rs (select target, forward, retry)
//!     → management routes → admin
//!     → Send to client
//! ```

pub mod client;
pub mod forward;
pub mod request;
pub mod server;

pub use forward::{ForwardError, Forwarder};
pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
