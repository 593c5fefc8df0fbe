//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use reqwest::Url;
use tracing::info;

use super::AppConfig;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    origin = %config.feed.origin,
    region = %config.tracking.region,
    vessel_type = %config.tracking.vessel_type,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig = toml::from_str(content)
    .with_context(|| "Failed to parse config.toml")?;

  validate_config(&config)?;
  Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Parseable http(s) origin and API base URL
/// - Positive timing values
/// - Backoff cap not below the base
/// - Sensible pagination
pub fn validate_config(config: &AppConfig) -> Result<()> {
  // Feed validation
  let origin = Url::parse(&config.feed.origin)
    .with_context(|| format!("Invalid feed origin: {}", config.feed.origin))?;
  anyhow::ensure!(
    matches!(origin.scheme(), "http" | "https"),
    "Feed origin must be http or https, got {}",
    origin.scheme()
  );
  anyhow::ensure!(
    config.feed.poll_interval_secs > 0,
    "poll_interval_secs must be positive"
  );
  anyhow::ensure!(
    config.feed.base_delay_ms > 0,
    "base_delay_ms must be positive"
  );
  anyhow::ensure!(
    config.feed.max_delay_ms >= config.feed.base_delay_ms,
    "max_delay_ms ({}) must be >= base_delay_ms ({})",
    config.feed.max_delay_ms,
    config.feed.base_delay_ms
  );
  anyhow::ensure!(
    config.feed.connect_timeout_secs > 0,
    "connect_timeout_secs must be positive"
  );

  // API validation
  if let Some(base_url) = &config.api.base_url {
    Url::parse(base_url)
      .with_context(|| format!("Invalid API base URL: {base_url}"))?;
  }
  anyhow::ensure!(
    config.api.timeout_seconds > 0,
    "API timeout_seconds must be positive"
  );

  // Tracking validation
  anyhow::ensure!(
    config.tracking.page >= 1,
    "tracking.page is 1-based, got {}",
    config.tracking.page
  );
  anyhow::ensure!(
    config.tracking.page_size > 0,
    "tracking.page_size must be positive"
  );
  anyhow::ensure!(
    config.tracking.port_radius_km >= 0.0,
    "tracking.port_radius_km must not be negative, got {}",
    config.tracking.port_radius_km
  );

  Ok(())
}
