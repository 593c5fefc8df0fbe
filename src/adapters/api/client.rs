//! Vessel REST Client - Fallback Endpoint Adapter
//!
//! Wraps reqwest with bearer authentication, a cookie store (the
//! session cookie travels like `credentials: include`), and a request
//! timeout. Implements the `VesselApi` port for both fallback tiers.
//! No retries here: a failed tier falls through to the next one.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::domain::tracking::TrackingConfig;
use crate::domain::vessel::RawVessel;
use crate::ports::session::TokenProvider;
use crate::ports::vessel_api::{ApiError, PollingResponse, VesselApi};

/// Tier 1 path.
pub const POLLING_PATH: &str = "/api/vessels/polling";

/// Tier 2 path.
pub const GENERAL_PATH: &str = "/api/vessels";

/// Configuration for the vessel REST client.
#[derive(Debug, Clone)]
pub struct VesselApiConfig {
    /// Base URL the API paths are appended to.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for VesselApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP implementation of the fallback endpoints.
pub struct HttpVesselApi {
    /// Underlying HTTP client.
    http: Client,
    /// Session token source.
    tokens: Arc<dyn TokenProvider>,
    /// Client configuration.
    config: VesselApiConfig,
}

impl HttpVesselApi {
    /// Create a new REST client.
    pub fn new(tokens: Arc<dyn TokenProvider>, config: VesselApiConfig) -> Result<Self> {
        Url::parse(&config.base_url)
            .with_context(|| format!("Invalid API base URL: {}", config.base_url))?;

        let http = Client::builder()
            .timeout(config.timeout)
            .cookie_store(true)
            .pool_max_idle_per_host(5)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            tokens,
            config,
        })
    }

    /// Build the full URL for `path` with the tracking query parameters.
    pub fn endpoint(&self, path: &str, tracking: &TrackingConfig) -> Result<Url, ApiError> {
        let base = self.config.base_url.trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}{path}"))
            .map_err(|e| ApiError::InvalidUrl(format!("{base}{path}: {e}")))?;
        url.query_pairs_mut().extend_pairs(tracking.query_pairs());
        Ok(url)
    }

    /// GET `path` and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        tracking: &TrackingConfig,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path, tracking)?;
        debug!(%url, "GET");

        let mut request = self.http.get(url);
        if let Some(token) = self.tokens.token() {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, path, "Vessel API returned error status");
            return Err(ApiError::Status {
                status: status.as_u16(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl VesselApi for HttpVesselApi {
    #[instrument(skip_all, name = "fetch_polling")]
    async fn fetch_polling(&self, config: &TrackingConfig) -> Result<PollingResponse, ApiError> {
        self.get_json(POLLING_PATH, config).await
    }

    #[instrument(skip_all, name = "fetch_general")]
    async fn fetch_general(&self, config: &TrackingConfig) -> Result<Vec<RawVessel>, ApiError> {
        self.get_json(GENERAL_PATH, config).await
    }
}
