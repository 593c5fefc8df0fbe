//! Domain layer - Vessel models and pure feed logic.
//!
//! This module contains the pure domain logic for the vessel feed client.
//! No transport or runtime dependencies allowed here (hexagonal
//! architecture inner ring). Everything is testable in isolation.

pub mod backoff;
pub mod events;
pub mod normalize;
pub mod tracking;
pub mod vessel;

// Re-export core types for convenience
pub use backoff::ReconnectPolicy;
pub use events::{ConnectionState, EventKind, FeedEvent, FeedSource, VesselsPayload};
pub use normalize::normalize;
pub use tracking::{TrackingConfig, TrackingConfigPatch};
pub use vessel::{RawVessel, VesselId, VesselRecord};
