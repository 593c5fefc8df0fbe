//! Feed events and connection state.
//!
//! Every notification the feed client delivers to the rest of the
//! application is a `FeedEvent`. Subscribers register per `EventKind`
//! and receive the matching variant, so payload shapes are static.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::vessel::VesselRecord;

/// Connection state of the feed client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
    /// Primary transport abandoned; REST polling is active.
    UsingRest,
}

impl ConnectionState {
    /// Stable wire/log name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Error => "error",
            Self::UsingRest => "using-rest",
        }
    }

    /// Whether vessel data is currently flowing from some transport.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Connected | Self::UsingRest)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which transport produced a vessel batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeedSource {
    /// Primary push transport.
    Websocket,
    /// Tier 1 REST polling endpoint.
    RestPolling,
    /// Tier 2 general REST endpoint.
    RestApi,
}

impl FeedSource {
    /// Stable wire/log name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Websocket => "websocket",
            Self::RestPolling => "rest-polling",
            Self::RestApi => "rest-api",
        }
    }
}

impl std::fmt::Display for FeedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a `vessels` event.
#[derive(Debug, Clone)]
pub struct VesselsPayload {
    /// The new canonical vessel set.
    pub vessels: Arc<Vec<VesselRecord>>,
    /// Upstream total (may exceed `vessels.len()` when paginated).
    pub total_count: u64,
    pub source: FeedSource,
    /// When the batch was accepted by the client.
    pub received_at: DateTime<Utc>,
}

/// Event discriminant used for subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Vessels,
    Status,
    Error,
    Reconnect,
}

/// Notification delivered to subscribers.
#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// A fresh canonical vessel set.
    Vessels(VesselsPayload),
    /// Connection state changed.
    Status { status: ConnectionState },
    /// Something failed; the cache keeps its last good value.
    Error {
        message: String,
        error: Option<String>,
    },
    /// A reconnect attempt is starting.
    Reconnect { attempt: u32 },
}

impl FeedEvent {
    /// Subscription key for this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Vessels(_) => EventKind::Vessels,
            Self::Status { .. } => EventKind::Status,
            Self::Error { .. } => EventKind::Error,
            Self::Reconnect { .. } => EventKind::Reconnect,
        }
    }

    /// Convenience constructor for error events.
    pub fn error(message: impl Into<String>, error: Option<String>) -> Self {
        Self::Error {
            message: message.into(),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_names() {
        assert_eq!(ConnectionState::UsingRest.to_string(), "using-rest");
        assert_eq!(
            serde_json::to_string(&ConnectionState::UsingRest).unwrap(),
            "\"using-rest\""
        );
        assert!(ConnectionState::Connected.is_live());
        assert!(!ConnectionState::Connecting.is_live());
    }

    #[test]
    fn test_source_names() {
        assert_eq!(FeedSource::RestApi.as_str(), "rest-api");
        assert_eq!(
            serde_json::to_string(&FeedSource::RestPolling).unwrap(),
            "\"rest-polling\""
        );
    }

    #[test]
    fn test_event_kind() {
        assert_eq!(FeedEvent::Reconnect { attempt: 1 }.kind(), EventKind::Reconnect);
        assert_eq!(FeedEvent::error("boom", None).kind(), EventKind::Error);
    }

    #[test]
    fn test_vessels_payload_shares_the_set() {
        let vessels = Arc::new(Vec::new());
        let event = FeedEvent::Vessels(VesselsPayload {
            vessels: Arc::clone(&vessels),
            total_count: 0,
            source: FeedSource::Websocket,
            received_at: Utc::now(),
        });
        let copy = event.clone();

        assert_eq!(copy.kind(), EventKind::Vessels);
        match copy {
            FeedEvent::Vessels(payload) => assert!(Arc::ptr_eq(&payload.vessels, &vessels)),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
