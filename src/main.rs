//! Vessel Feed — Entry Point
//!
//! Wires configuration, logging, adapters and the feed client, then
//! runs until SIGINT.
//!
//! Wiring sequence:
//! 1. Load config.toml + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Load the session token from VESSEL_FEED_TOKEN
//! 4. Create the REST client, WebSocket transport and clock
//! 5. Spawn the feed client and attach metrics + event logging
//! 6. Spawn metrics, health and config-reload tasks
//! 7. Connect
//! 8. Wait for SIGINT → disconnect → stop servers → exit

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use vessel_feed::adapters::api::{HttpVesselApi, SessionToken};
use vessel_feed::adapters::clock::TokioClock;
use vessel_feed::adapters::feeds::WsTransport;
use vessel_feed::adapters::metrics::{HealthServer, HealthState, MetricsRegistry};
use vessel_feed::config;
use vessel_feed::config::hot_reload::ConfigWatcher;
use vessel_feed::domain::events::{EventKind, FeedEvent};
use vessel_feed::domain::tracking::{TrackingConfig, TrackingConfigPatch};
use vessel_feed::usecases::{FeedClient, FeedDeps, handler};

const CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration from config.toml ──────────────
    let config = config::loader::load_config(CONFIG_PATH).context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.client.log_level)),
        )
        .json()
        .init();

    info!(
        name = %config.client.name,
        version = env!("CARGO_PKG_VERSION"),
        origin = %config.feed.origin,
        "Starting vessel feed client"
    );

    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);

    // ── 3. Session token ────────────────────────────────────
    let tokens = Arc::new(SessionToken::from_env());

    // ── 4. Adapters ─────────────────────────────────────────
    let api = Arc::new(
        HttpVesselApi::new(tokens.clone(), config.api_settings())
            .context("Failed to create vessel API client")?,
    );
    let deps = FeedDeps {
        transport: Arc::new(WsTransport::new(config.connect_timeout())),
        api,
        clock: Arc::new(TokioClock),
        tokens,
    };

    // ── 5. Feed client + subscribers ────────────────────────
    let client = FeedClient::spawn(config.feed_settings()?, deps);
    attach_event_log(&client);

    let mut tasks = Vec::new();

    if config.metrics.enabled {
        let metrics = Arc::new(MetricsRegistry::new().context("Failed to register metrics")?);
        metrics.attach(&client);

        let bind_address = config.metrics.bind_address.clone();
        let metrics_shutdown = shutdown_tx.subscribe();
        tasks.push(tokio::spawn(async move {
            if let Err(e) = metrics.serve(bind_address, metrics_shutdown).await {
                error!(error = %e, "Metrics server failed");
            }
        }));
    }

    // ── 6. Health + config reload ───────────────────────────
    let health = HealthServer::new(
        Arc::new(HealthState::new(client.subscribe_status())),
        config.metrics.health_port,
    );
    let health_shutdown = shutdown_tx.subscribe();
    tasks.push(tokio::spawn(async move {
        if let Err(e) = health.run(health_shutdown).await {
            error!(error = %e, "Health server failed");
        }
    }));

    let (mut watcher, mut config_rx) = ConfigWatcher::new(CONFIG_PATH, config.clone());
    let watcher_shutdown = shutdown_tx.subscribe();
    tasks.push(tokio::spawn(async move {
        if let Err(e) = watcher.run(watcher_shutdown).await {
            error!(error = %e, "Config watcher failed");
        }
    }));

    let reload_client = client.clone();
    let mut current_tracking = config.tracking.clone();
    tasks.push(tokio::spawn(async move {
        while config_rx.changed().await.is_ok() {
            let next = config_rx.borrow_and_update().tracking.clone();
            if next == current_tracking {
                continue;
            }
            info!(region = %next.region, vessel_type = %next.vessel_type, "Tracking config reloaded");
            reload_client.update_config(TrackingConfigPatch::replace_with(&TrackingConfig::from(&next)));
            current_tracking = next;
        }
    }));

    // ── 7. Connect ──────────────────────────────────────────
    client.connect();
    info!("Feed client running");

    // ── 8. Wait for SIGINT ──────────────────────────────────
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for SIGINT, shutting down");
    } else {
        info!("SIGINT received, initiating graceful shutdown");
    }

    client.disconnect();
    let _ = shutdown_tx.send(());

    for task in tasks {
        if tokio::time::timeout(Duration::from_secs(5), task).await.is_err() {
            warn!("Background task did not stop in time");
        }
    }

    info!(vessels = client.vessels().len(), "Shutdown complete");
    Ok(())
}

/// Log every client event at a level matching its severity.
fn attach_event_log(client: &FeedClient) {
    client.on(
        EventKind::Vessels,
        handler(|event| {
            if let FeedEvent::Vessels(payload) = event {
                info!(
                    count = payload.vessels.len(),
                    total = payload.total_count,
                    source = %payload.source,
                    "Vessel batch received"
                );
            }
        }),
    );
    client.on(
        EventKind::Status,
        handler(|event| {
            if let FeedEvent::Status { status } = event {
                info!(%status, "Connection status changed");
            }
        }),
    );
    client.on(
        EventKind::Reconnect,
        handler(|event| {
            if let FeedEvent::Reconnect { attempt } = event {
                warn!(attempt, "Reconnecting to vessel feed");
            }
        }),
    );
    client.on(
        EventKind::Error,
        handler(|event| {
            if let FeedEvent::Error { message, error } = event {
                error!(%message, detail = ?error, "Vessel feed error");
            }
        }),
    );
}
