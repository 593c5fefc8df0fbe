//! Health Check Server - Liveness and Readiness Probes
//!
//! Exposes /live and /ready endpoints via axum 0.7 for Docker
//! health checks. Readiness follows the feed client's connection
//! state: ready while vessel data flows from either transport.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use tokio::sync::{broadcast, watch};
use tracing::{info, instrument};

use crate::domain::events::ConnectionState;

/// Shared health state polled by readiness probes.
#[derive(Debug, Clone)]
pub struct HealthState {
    /// Live view of the feed client's connection state.
    status: watch::Receiver<ConnectionState>,
}

impl HealthState {
    /// Track readiness from a connection state watch.
    pub fn new(status: watch::Receiver<ConnectionState>) -> Self {
        Self { status }
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.status.borrow()
    }

    /// Ready when connected or polling REST.
    pub fn is_ready(&self) -> bool {
        self.state().is_live()
    }
}

/// Axum-based health check HTTP server.
pub struct HealthServer {
    /// Health state shared with the probe handlers.
    state: Arc<HealthState>,
    /// Bind port (default 8080 from config).
    port: u16,
}

impl HealthServer {
    /// Create a new health server.
    pub fn new(state: Arc<HealthState>, port: u16) -> Self {
        Self { state, port }
    }

    /// Router serving both probes.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/live", get(Self::liveness))
            .route("/ready", get(Self::readiness))
            .with_state(Arc::clone(&self.state))
    }

    /// Serve until shutdown.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) -> anyhow::Result<()> {
        let app = self.router();

        let addr = format!("0.0.0.0:{}", self.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        info!(address = %addr, "Health server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }

    /// Liveness probe: always returns 200 if the process is running.
    async fn liveness() -> impl IntoResponse {
        (StatusCode::OK, "OK")
    }

    /// Readiness probe: 200 while vessel data is flowing.
    async fn readiness(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
        if state.is_ready() {
            (StatusCode::OK, "READY".to_string())
        } else {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("NOT READY ({})", state.state()),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readiness_follows_connection_state() {
        let (tx, rx) = watch::channel(ConnectionState::Connecting);
        let health = HealthState::new(rx);
        assert!(!health.is_ready());

        tx.send_replace(ConnectionState::Connected);
        assert!(health.is_ready());

        tx.send_replace(ConnectionState::Error);
        assert!(!health.is_ready());

        tx.send_replace(ConnectionState::UsingRest);
        assert!(health.is_ready());
    }
}
