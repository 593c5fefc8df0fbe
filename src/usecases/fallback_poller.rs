//! Fallback Poller - Two-Tier REST Fetch
//!
//! One fetch cycle tries the fast polling endpoint first and falls
//! through to the general endpoint when tier 1 fails, returns a non-ok
//! status, or returns no vessels. Tier 2's answer is final, including an
//! empty array. The tiers are awaited strictly in sequence so one
//! logical refresh never produces two competing batches.
//!
//! The recurring 15-minute schedule is owned by the feed client.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::error::FeedError;
use crate::domain::events::FeedSource;
use crate::domain::normalize::normalize;
use crate::domain::tracking::TrackingConfig;
use crate::domain::vessel::VesselRecord;
use crate::ports::vessel_api::VesselApi;

/// Result of one successful fetch cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    /// Normalized vessels.
    pub vessels: Vec<VesselRecord>,
    /// Upstream total, or the batch size when the tier did not report one.
    pub total_count: u64,
    /// Tier that produced the batch.
    pub source: FeedSource,
}

/// Pull-based secondary transport.
#[derive(Clone)]
pub struct FallbackPoller {
    api: Arc<dyn VesselApi>,
}

impl FallbackPoller {
    /// Create a poller over the given REST endpoints.
    pub fn new(api: Arc<dyn VesselApi>) -> Self {
        Self { api }
    }

    /// Run one fetch cycle with the given tracking snapshot.
    #[instrument(skip(self, config), fields(region = %config.region, page = config.page))]
    pub async fn fetch_once(&self, config: &TrackingConfig) -> Result<FetchOutcome, FeedError> {
        match self.api.fetch_polling(config).await {
            Ok(response) if !response.vessels.is_empty() => {
                let vessels = normalize(&response.vessels, config);
                let total_count = response.total_count.unwrap_or(vessels.len() as u64);
                info!(
                    received = response.vessels.len(),
                    kept = vessels.len(),
                    total_count,
                    "Fetched vessels from polling endpoint"
                );
                return Ok(FetchOutcome {
                    vessels,
                    total_count,
                    source: FeedSource::RestPolling,
                });
            }
            Ok(_) => {
                debug!("Polling endpoint returned no vessels, trying general endpoint");
            }
            Err(e) => {
                warn!(error = %e, "Polling endpoint failed, trying general endpoint");
            }
        }

        let raw = self.api.fetch_general(config).await?;
        let vessels = normalize(&raw, config);
        info!(
            received = raw.len(),
            kept = vessels.len(),
            "Fetched vessels from general endpoint"
        );

        Ok(FetchOutcome {
            total_count: vessels.len() as u64,
            vessels,
            source: FeedSource::RestApi,
        })
    }
}

impl std::fmt::Debug for FallbackPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackPoller").finish_non_exhaustive()
    }
}
