//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the usecases layer requires from
//! the outside world. Adapters implement these traits; tests inject fakes.
//!
//! Port categories:
//! - `Transport`: Push-based live connection (WebSocket-equivalent)
//! - `VesselApi`: Pull-based REST endpoints used during fallback
//! - `Clock`: Timers and wall-clock time
//! - `TokenProvider`: Opaque session token from the auth layer
//! - `protocol`: JSON control/data messages on the primary transport

pub mod clock;
pub mod protocol;
pub mod session;
pub mod transport;
pub mod vessel_api;

pub use clock::Clock;
pub use session::TokenProvider;
pub use transport::{Transport, TransportError, TransportEvent, TransportEvents, TransportLink};
pub use vessel_api::{ApiError, PollingResponse, VesselApi};
