//! Clock Port - Time Source for Timers
//!
//! The feed client never touches the runtime's timer APIs directly.
//! Reconnect and poll timers sleep through this trait so tests can
//! substitute virtual time.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Source of delays and timestamps.
#[async_trait]
pub trait Clock: Send + Sync + 'static {
    /// Suspend the calling task for `duration`.
    async fn sleep(&self, duration: Duration);

    /// Current wall-clock time, used to stamp vessel batches.
    fn now(&self) -> DateTime<Utc>;
}
