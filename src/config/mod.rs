//! Configuration Module - TOML-based Client Configuration
//!
//! Loads and validates configuration from `config.toml`. The session
//! token is the only secret and comes from the environment
//! (`VESSEL_FEED_TOKEN`), never from the file.

pub mod hot_reload;
pub mod loader;

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Url;
use serde::Deserialize;

use crate::adapters::api::client::VesselApiConfig;
use crate::domain::backoff::ReconnectPolicy;
use crate::domain::tracking::TrackingConfig;
use crate::usecases::feed_client::FeedSettings;

/// Top-level configuration.
///
/// Loaded from `config.toml` at startup. All fields are validated
/// before the client connects.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AppConfig {
  /// Process identity and logging.
  pub client: ClientConfig,
  /// Push transport and fallback timing.
  pub feed: FeedConfig,
  /// REST endpoints.
  pub api: ApiConfig,
  /// Initial subscription intent (hot-reloadable).
  #[serde(default)]
  pub tracking: TrackingSection,
  /// Metrics and monitoring.
  #[serde(default)]
  pub metrics: MetricsConfig,
}

/// Process identity configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientConfig {
  /// Human-readable instance name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
}

/// Feed transport configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeedConfig {
  /// Origin the application is served from; the WebSocket URL is
  /// derived from it.
  pub origin: String,
  /// REST poll period while fallback is engaged.
  #[serde(default = "default_poll_interval")]
  pub poll_interval_secs: u64,
  /// Reconnect backoff base.
  #[serde(default = "default_base_delay")]
  pub base_delay_ms: u64,
  /// Reconnect backoff cap (before jitter).
  #[serde(default = "default_max_delay")]
  pub max_delay_ms: u64,
  /// Upper bound of the random jitter added to each delay.
  #[serde(default = "default_jitter")]
  pub jitter_ms: u64,
  /// Reconnect attempts before switching to REST.
  #[serde(default = "default_max_reconnect_attempts")]
  pub max_reconnect_attempts: u32,
  /// WebSocket handshake timeout.
  #[serde(default = "default_connect_timeout")]
  pub connect_timeout_secs: u64,
}

/// REST endpoint configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiConfig {
  /// Base URL for `/api/vessels*`. Defaults to the feed origin.
  pub base_url: Option<String>,
  /// Request timeout in seconds.
  #[serde(default = "default_timeout")]
  pub timeout_seconds: u64,
}

/// Tracking configuration as written in TOML.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrackingSection {
  pub region: String,
  pub page: u32,
  pub page_size: u32,
  pub vessel_type: String,
  pub load_all_vessels: bool,
  pub track_port_vessels: bool,
  pub port_radius_km: f64,
  pub max_vessels: u32,
}

impl Default for TrackingSection {
  fn default() -> Self {
    TrackingConfig::default().into()
  }
}

impl From<TrackingConfig> for TrackingSection {
  fn from(c: TrackingConfig) -> Self {
    Self {
      region: c.region,
      page: c.page,
      page_size: c.page_size,
      vessel_type: c.vessel_type,
      load_all_vessels: c.load_all_vessels,
      track_port_vessels: c.track_port_vessels,
      port_radius_km: c.port_radius_km,
      max_vessels: c.max_vessels,
    }
  }
}

impl From<&TrackingSection> for TrackingConfig {
  fn from(s: &TrackingSection) -> Self {
    Self {
      region: s.region.clone(),
      page: s.page,
      page_size: s.page_size,
      vessel_type: s.vessel_type.clone(),
      load_all_vessels: s.load_all_vessels,
      track_port_vessels: s.track_port_vessels,
      port_radius_km: s.port_radius_km,
      max_vessels: s.max_vessels,
    }
  }
}

/// Metrics and monitoring configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MetricsConfig {
  /// Enable Prometheus metrics export.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Metrics server bind address.
  #[serde(default = "default_metrics_addr")]
  pub bind_address: String,
  /// Health check endpoint port.
  #[serde(default = "default_health_port")]
  pub health_port: u16,
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self {
      enabled: default_true(),
      bind_address: default_metrics_addr(),
      health_port: default_health_port(),
    }
  }
}

impl AppConfig {
  /// Feed client settings derived from `[feed]` and `[tracking]`.
  pub fn feed_settings(&self) -> Result<FeedSettings> {
    let origin = Url::parse(&self.feed.origin)
      .with_context(|| format!("Invalid feed origin: {}", self.feed.origin))?;

    let mut settings = FeedSettings::new(origin);
    settings.reconnect_policy = ReconnectPolicy::new(
      Duration::from_millis(self.feed.base_delay_ms),
      Duration::from_millis(self.feed.max_delay_ms),
      Duration::from_millis(self.feed.jitter_ms),
    );
    settings.poll_interval = Duration::from_secs(self.feed.poll_interval_secs);
    settings.max_reconnect_attempts = self.feed.max_reconnect_attempts;
    settings.tracking = TrackingConfig::from(&self.tracking);
    Ok(settings)
  }

  /// REST client settings; the base URL falls back to the feed origin.
  pub fn api_settings(&self) -> VesselApiConfig {
    VesselApiConfig {
      base_url: self
        .api
        .base_url
        .clone()
        .unwrap_or_else(|| self.feed.origin.clone()),
      timeout: Duration::from_secs(self.api.timeout_seconds),
    }
  }

  /// WebSocket handshake timeout.
  pub fn connect_timeout(&self) -> Duration {
    Duration::from_secs(self.feed.connect_timeout_secs)
  }
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_true() -> bool {
  true
}

fn default_poll_interval() -> u64 {
  900 // 15 min
}

fn default_base_delay() -> u64 {
  1000
}

fn default_max_delay() -> u64 {
  30_000
}

fn default_jitter() -> u64 {
  1000
}

fn default_max_reconnect_attempts() -> u32 {
  3
}

fn default_connect_timeout() -> u64 {
  10
}

fn default_timeout() -> u64 {
  30
}

fn default_metrics_addr() -> String {
  "0.0.0.0:9090".to_string()
}

fn default_health_port() -> u16 {
  8080
}
