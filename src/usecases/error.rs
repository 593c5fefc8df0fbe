//! Feed error taxonomy.
//!
//! None of these escape the public `FeedClient` surface as return
//! values; the client converts them into `error` events.

use thiserror::Error;

use crate::ports::transport::TransportError;
use crate::ports::vessel_api::ApiError;

/// Failures inside the feed subsystem.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The primary transport could not be constructed this cycle.
    #[error("failed to open primary transport: {0}")]
    TransportConstruction(#[from] TransportError),
    /// The live primary link failed.
    #[error("primary transport error: {0}")]
    TransportRuntime(String),
    /// An inbound payload could not be decoded.
    #[error("malformed feed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
    /// Both REST tiers failed; the last error is from tier 2.
    #[error("REST fallback failed: {0}")]
    Rest(#[from] ApiError),
}
