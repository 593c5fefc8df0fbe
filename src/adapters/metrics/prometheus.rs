//! Prometheus Metrics Registry - Feed Observability
//!
//! Registers the `vessel_feed_*` metrics and keeps them current by
//! subscribing to the feed client's events. Exposed on `/metrics` for
//! Grafana dashboards.

use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use prometheus::{Encoder, Gauge, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

use crate::domain::events::{ConnectionState, EventKind, FeedEvent};
use crate::usecases::event_bus::handler;
use crate::usecases::feed_client::FeedClient;

const STATES: [ConnectionState; 5] = [
    ConnectionState::Disconnected,
    ConnectionState::Connecting,
    ConnectionState::Connected,
    ConnectionState::Error,
    ConnectionState::UsingRest,
];

/// Centralized Prometheus metrics for the feed client.
pub struct MetricsRegistry {
    /// Prometheus registry.
    registry: Registry,
    /// Vessel batches applied, by source.
    pub batches: IntCounterVec,
    /// Size of the current vessel set.
    pub vessels: IntGauge,
    /// Upstream total of the last batch.
    pub total_count: IntGauge,
    /// One-hot connection state.
    pub connection_state: IntGaugeVec,
    /// Reconnect attempts scheduled.
    pub reconnects: IntCounter,
    /// Error events.
    pub errors: IntCounter,
    /// Unix time of the last vessel batch.
    pub last_update_seconds: Gauge,
}

impl MetricsRegistry {
    /// Create and register all metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let batches = IntCounterVec::new(
            Opts::new("vessel_feed_batches_total", "Vessel batches applied"),
            &["source"],
        )?;

        let vessels = IntGauge::new(
            "vessel_feed_vessels",
            "Vessels in the current canonical set",
        )?;

        let total_count = IntGauge::new(
            "vessel_feed_total_count",
            "Upstream vessel total reported with the last batch",
        )?;

        let connection_state = IntGaugeVec::new(
            Opts::new(
                "vessel_feed_connection_state",
                "Current connection state (1 for the active state)",
            ),
            &["state"],
        )?;

        let reconnects = IntCounter::new(
            "vessel_feed_reconnects_total",
            "Primary transport reconnect attempts",
        )?;

        let errors = IntCounter::new("vessel_feed_errors_total", "Error events emitted")?;

        let last_update_seconds = Gauge::new(
            "vessel_feed_last_update_timestamp_seconds",
            "Unix time of the last applied vessel batch",
        )?;

        registry.register(Box::new(batches.clone()))?;
        registry.register(Box::new(vessels.clone()))?;
        registry.register(Box::new(total_count.clone()))?;
        registry.register(Box::new(connection_state.clone()))?;
        registry.register(Box::new(reconnects.clone()))?;
        registry.register(Box::new(errors.clone()))?;
        registry.register(Box::new(last_update_seconds.clone()))?;

        let metrics = Self {
            registry,
            batches,
            vessels,
            total_count,
            connection_state,
            reconnects,
            errors,
            last_update_seconds,
        };
        metrics.set_state(ConnectionState::Disconnected);
        Ok(metrics)
    }

    /// Update metrics from one client event.
    pub fn observe(&self, event: &FeedEvent) {
        match event {
            FeedEvent::Vessels(payload) => {
                self.batches
                    .with_label_values(&[payload.source.as_str()])
                    .inc();
                self.vessels.set(payload.vessels.len() as i64);
                self.total_count
                    .set(i64::try_from(payload.total_count).unwrap_or(i64::MAX));
                self.last_update_seconds
                    .set(payload.received_at.timestamp_millis() as f64 / 1000.0);
            }
            FeedEvent::Status { status } => self.set_state(*status),
            FeedEvent::Reconnect { .. } => self.reconnects.inc(),
            FeedEvent::Error { .. } => self.errors.inc(),
        }
    }

    /// Subscribe to every event kind of `client`.
    pub fn attach(self: &Arc<Self>, client: &FeedClient) {
        for kind in [
            EventKind::Vessels,
            EventKind::Status,
            EventKind::Error,
            EventKind::Reconnect,
        ] {
            let metrics = Arc::clone(self);
            client.on(kind, handler(move |event| metrics.observe(event)));
        }
    }

    /// Render all metrics in the text exposition format.
    pub fn encode(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    fn set_state(&self, current: ConnectionState) {
        for state in STATES {
            self.connection_state
                .with_label_values(&[state.as_str()])
                .set(i64::from(state == current));
        }
    }

    /// Serve Prometheus metrics on the configured bind address.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn serve(
        self: Arc<Self>,
        bind_address: String,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        let metrics_self = Arc::clone(&self);

        let app = Router::new().route(
            "/metrics",
            get(move || {
                let metrics = Arc::clone(&metrics_self);
                async move {
                    match metrics.encode() {
                        Ok(body) => (StatusCode::OK, body),
                        Err(e) => {
                            warn!(error = %e, "Failed to encode metrics");
                            (StatusCode::INTERNAL_SERVER_ERROR, String::new())
                        }
                    }
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind(&bind_address).await?;
        info!(address = %bind_address, "Prometheus metrics server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }
}
