//! Config Hot-Reload
//!
//! The client can run for days, so the tracking selection in
//! config.toml is re-read on a timer instead of requiring a restart.
//! `main` forwards accepted `[tracking]` edits to the live feed client.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{broadcast, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

use super::AppConfig;
use super::loader::parse_config;

/// Default re-read period.
pub const DEFAULT_RELOAD_INTERVAL: Duration = Duration::from_secs(60);

/// Re-reads a config file on a fixed period and publishes edits.
///
/// An edit is published only when the file parses, passes validation and
/// differs from the current value. Whitespace or comment edits change
/// the fingerprint but publish nothing.
pub struct ConfigWatcher {
    path: PathBuf,
    period: Duration,
    tx: watch::Sender<AppConfig>,
    /// Fingerprint of the last file content that was examined.
    fingerprint: Option<u64>,
}

impl ConfigWatcher {
    pub fn new(config_path: &str, initial_config: AppConfig) -> (Self, watch::Receiver<AppConfig>) {
        let (tx, rx) = watch::channel(initial_config);
        let watcher = Self {
            path: PathBuf::from(config_path),
            period: DEFAULT_RELOAD_INTERVAL,
            tx,
            fingerprint: None,
        };
        (watcher, rx)
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.period = interval;
        self
    }

    /// Poll until `shutdown_rx` fires.
    #[instrument(skip(self, shutdown_rx), fields(path = %self.path.display()))]
    pub async fn run(&mut self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        self.fingerprint = self.read().await.ok().map(|(_, print)| print);
        info!(period_secs = self.period.as_secs(), "Watching config file");

        let first = tokio::time::Instant::now() + self.period;
        let mut ticker = tokio::time::interval_at(first, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    debug!("Config watcher stopped");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    self.check_and_reload().await;
                }
            }
        }
    }

    /// One poll. Returns whether a new config was published.
    pub(crate) async fn check_and_reload(&mut self) -> bool {
        let (content, print) = match self.read().await {
            Ok(read) => read,
            Err(e) => {
                warn!(error = %e, "Config file unreadable, keeping current");
                return false;
            }
        };
        if self.fingerprint == Some(print) {
            return false;
        }
        self.fingerprint = Some(print);

        let candidate = match parse_config(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "Rejected config edit, keeping current");
                return false;
            }
        };

        let published = self.tx.send_if_modified(|current| {
            if *current == candidate {
                return false;
            }
            *current = candidate;
            true
        });
        if published {
            info!("Config edit applied");
        } else {
            debug!("Config file touched without semantic change");
        }
        published
    }

    async fn read(&self) -> Result<(String, u64)> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading {}", self.path.display()))?;
        let mut hasher = DefaultHasher::new();
        content.hash(&mut hasher);
        let print = hasher.finish();
        Ok((content, print))
    }
}
