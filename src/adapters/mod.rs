//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (HTTP client, WebSocket, tokio timers) and
//! hosts the observability servers.
//!
//! Adapter categories:
//! - `api`: vessel REST endpoints and session token
//! - `clock`: tokio-backed timer and wall clock
//! - `feeds`: WebSocket push transport
//! - `metrics`: Prometheus metrics export and health checks

pub mod api;
pub mod clock;
pub mod feeds;
pub mod metrics;
