//! Feed Protocol - JSON Messages on the Primary Transport
//!
//! Outbound control messages pushed by the client and inbound messages
//! pushed by the server. Anything that does not parse as an
//! `InboundMessage` is ignored by the client.

use serde::{Deserialize, Serialize};

use crate::domain::tracking::TrackingConfig;
use crate::domain::vessel::{RawVessel, deserialize_total_count, deserialize_vessel_list};

/// Client → server control message.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ControlMessage {
    /// `{"type":"config", ...TrackingConfig}`
    Config(TrackingConfig),
    /// `{"type":"refresh"}`
    Refresh,
}

impl ControlMessage {
    /// Serialize to the JSON text frame.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Server → client message.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InboundMessage {
    /// A full vessel batch.
    Vessels {
        #[serde(default, deserialize_with = "deserialize_vessel_list")]
        vessels: Vec<RawVessel>,
        #[serde(rename = "totalCount", default, deserialize_with = "deserialize_total_count")]
        total_count: Option<u64>,
    },
    /// Server-side failure report.
    Error {
        #[serde(default)]
        message: Option<String>,
    },
}

impl InboundMessage {
    /// Parse a text frame.
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
