//! Vessel API Port - REST Fallback Endpoints
//!
//! Two pull endpoints queried in priority order during fallback:
//! - Tier 1 (`/api/vessels/polling`): fast, returns `{vessels, totalCount}`
//! - Tier 2 (`/api/vessels`): general, returns a bare array

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::tracking::TrackingConfig;
use crate::domain::vessel::{RawVessel, deserialize_total_count, deserialize_vessel_list};

/// Tier 1 response body.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PollingResponse {
    /// Raw vessel records.
    #[serde(default, deserialize_with = "deserialize_vessel_list")]
    pub vessels: Vec<RawVessel>,
    /// Upstream total across all pages.
    #[serde(rename = "totalCount", default, deserialize_with = "deserialize_total_count")]
    pub total_count: Option<u64>,
}

/// Failure of a single endpoint call.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    /// The server answered with a non-success status.
    #[error("HTTP status {status}")]
    Status { status: u16 },
    /// The request never produced a response.
    #[error("request failed: {0}")]
    Network(String),
    /// The request URL could not be built from the configured base.
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),
    /// The response body did not match the expected shape.
    #[error("invalid response body: {0}")]
    Decode(String),
}

/// REST endpoints used by the fallback poller.
#[async_trait]
pub trait VesselApi: Send + Sync + 'static {
    /// Tier 1: `GET /api/vessels/polling` with region/page/pageSize/vesselType.
    async fn fetch_polling(&self, config: &TrackingConfig) -> Result<PollingResponse, ApiError>;

    /// Tier 2: `GET /api/vessels` with the same query parameters.
    async fn fetch_general(&self, config: &TrackingConfig) -> Result<Vec<RawVessel>, ApiError>;
}
