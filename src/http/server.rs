//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy and management handlers
//! - Wire up middleware (tracing, body limit, request ID)
//! - Own the target pool and inject it into handlers
//! - Bind server to listener and drain on shutdown

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::HeaderMap,
    response::Response,
    routing::post,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::admin::setup_admin_router;
use crate::config::{AdminConfig, LbConfig};
use crate::http::client::{upstream_client, UpstreamClient};
use crate::http::forward::Forwarder;
use crate::http::request::{MakeRequestUuid, X_REQUEST_ID};
use crate::lifecycle::Shutdown;
use crate::load_balancer::{Pool, TargetError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<Pool>,
    pub forwarder: Forwarder,
    pub admin: AdminConfig,
}

/// HTTP server for the load balancer.
pub struct HttpServer {
    router: Router,
    config: LbConfig,
    pool: Arc<Pool>,
}

impl HttpServer {
    /// Build the pool from configuration and the router around it.
    ///
    /// Health monitors start immediately, so this must run inside a Tokio runtime.
    pub fn new(config: LbConfig, shutdown: &Shutdown) -> Result<Self, TargetError> {
        Self::with_client(config, shutdown, upstream_client())
    }

    pub fn with_client(
        config: LbConfig,
        shutdown: &Shutdown,
        client: UpstreamClient,
    ) -> Result<Self, TargetError> {
        let pool = Arc::new(Pool::with_targets(
            &config.pool,
            config.health_check.clone(),
            client.clone(),
            shutdown.token(),
        )?);

        let state = AppState {
            pool: pool.clone(),
            forwarder: Forwarder::new(client, &config.proxy),
            admin: config.admin.clone(),
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            pool,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &LbConfig, state: AppState) -> Router {
        Router::new()
            .route("/json", post(proxy_handler))
            .merge(setup_admin_router(state.clone()))
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.proxy.max_body_size))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
    }

    /// Run the server until `shutdown` is triggered, then stop every monitor.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            targets = self.pool.len(),
            "HTTP server starting"
        );

        let signal = shutdown.clone();
        let served = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { signal.wait().await })
            .await;

        self.pool.shutdown();
        tracing::info!("HTTP server stopped");
        served
    }

    /// Router with state applied, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn pool(&self) -> Arc<Pool> {
        self.pool.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &LbConfig {
        &self.config
    }
}

/// Forward a JSON body to the next available target.
async fn proxy_handler(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let request_id = headers.get(X_REQUEST_ID).cloned();
    tracing::debug!(
        request_id = ?request_id,
        bytes = body.len(),
        "Proxying request"
    );
    state.forwarder.forward(&state.pool, body, request_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_empty_pool_returns_503() {
        let shutdown = Shutdown::new();
        let server = HttpServer::new(LbConfig::default(), &shutdown).unwrap();

        let response = server
            .router()
            .oneshot(
                Request::post("/json")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.headers().contains_key(X_REQUEST_ID));
        shutdown.trigger();
    }

    #[tokio::test]
    async fn test_invalid_initial_target_fails() {
        let mut config = LbConfig::default();
        config.pool.targets = vec!["localhost:20000".into()];
        assert!(HttpServer::new(config, &Shutdown::new()).is_err());
    }

    #[tokio::test]
    async fn test_body_limit() {
        let mut config = LbConfig::default();
        config.proxy.max_body_size = 8;
        let server = HttpServer::new(config, &Shutdown::new()).unwrap();

        let response = server
            .router()
            .oneshot(Request::post("/json").body(Body::from("{\"a\":\"0123456789\"}")).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
