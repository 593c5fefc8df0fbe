//! Use Cases Layer - Feed Orchestration
//!
//! Orchestrates domain logic with port interfaces to keep the
//! canonical vessel set flowing to subscribers.
//!
//! Use cases:
//! - `FeedClient`: Connection state machine, reconnect and fallback
//! - `FallbackPoller`: Two-tier REST fetch
//! - `EventBus`: Isolated subscriber fan-out

pub mod error;
pub mod event_bus;
pub mod fallback_poller;
pub mod feed_client;

pub use error::FeedError;
pub use event_bus::{EventBus, Handler, handler};
pub use fallback_poller::{FallbackPoller, FetchOutcome};
pub use feed_client::{FeedClient, FeedDeps, FeedSettings, websocket_url};
