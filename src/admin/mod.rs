//! Management endpoints: add/remove targets and report their status.

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, put},
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

pub fn setup_admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/addinstance", put(add_instance))
        .route("/removeinstance", put(remove_instance))
        .route("/status", get(node_status))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}
