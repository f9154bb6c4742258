use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::http::server::AppState;
use crate::load_balancer::TargetStatus;

/// Body of `GET /status`: endpoints grouped by state.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeStatus {
    pub healthy: Vec<String>,
    pub available: Vec<String>,
    pub all: Vec<String>,
}

impl NodeStatus {
    pub fn from_snapshot(snapshot: &[TargetStatus]) -> Self {
        let mut status = Self::default();
        for target in snapshot {
            if target.healthy {
                status.healthy.push(target.endpoint.clone());
            }
            if target.available {
                status.available.push(target.endpoint.clone());
            }
            status.all.push(target.endpoint.clone());
        }
        status
    }
}

/// `PUT /addinstance` with the target address as the body.
pub async fn add_instance(State(state): State<AppState>, body: String) -> StatusCode {
    match state.pool.add_target(body.trim()) {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(address = %body.trim(), error = %e, "Rejected instance");
            StatusCode::BAD_REQUEST
        }
    }
}

/// `PUT /removeinstance` with the target address as the body. Unknown addresses are ignored.
pub async fn remove_instance(State(state): State<AppState>, body: String) -> StatusCode {
    if state.pool.remove_target(&body).is_none() {
        tracing::debug!(address = %body.trim(), "No instance matched removal");
    }
    StatusCode::OK
}

pub async fn node_status(State(state): State<AppState>) -> Json<NodeStatus> {
    Json(NodeStatus::from_snapshot(&state.pool.snapshot()))
}
