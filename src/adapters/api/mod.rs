//! Vessel REST API Adapter
//!
//! HTTP client for the two fallback endpoints used while the push
//! feed is unavailable.
//!
//! Sub-modules:
//! - `auth`: session token used for bearer auth and the WebSocket query
//! - `client`: reqwest client implementing the `VesselApi` port

pub mod auth;
pub mod client;

pub use auth::SessionToken;
pub use client::{HttpVesselApi, VesselApiConfig};
