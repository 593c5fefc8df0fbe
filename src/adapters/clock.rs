//! Tokio Clock - Runtime Timer Adapter
//!
//! Implements the `Clock` port on top of `tokio::time`. Under a paused
//! test runtime the same adapter runs on virtual time.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::ports::clock::Clock;

/// Clock backed by the tokio timer wheel and the system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_sleep_follows_runtime_time() {
        let start = tokio::time::Instant::now();
        TokioClock.sleep(Duration::from_secs(900)).await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(900));
        assert!(elapsed < Duration::from_secs(901));
    }
}
