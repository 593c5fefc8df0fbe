//! Metrics and Monitoring Adapters
//!
//! Prometheus metrics fed from client events, plus liveness and
//! readiness endpoints, both served with axum 0.7.

pub mod health;
pub mod prometheus;

pub use health::{HealthServer, HealthState};
pub use prometheus::MetricsRegistry;
