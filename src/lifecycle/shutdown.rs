//! Shutdown coordination for the load balancer.

use tokio_util::sync::CancellationToken;

/// Coordinator for graceful shutdown.
///
/// Wraps the root cancellation token. The HTTP server drains on it and every
/// pool derives its monitors' tokens from it, so one trigger stops both.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    token: CancellationToken,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Root token; derive child tokens from it.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Trigger the shutdown signal. Safe to call more than once.
    pub fn trigger(&self) {
        if !self.token.is_cancelled() {
            tracing::info!("Shutdown triggered");
        }
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolve once shutdown has been triggered.
    pub async fn wait(&self) {
        self.token.cancelled().await;
    }
}
