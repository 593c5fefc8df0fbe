//! Reconnect backoff policy.
//!
//! Exponential backoff with uniform jitter and a hard cap:
//! `delay = min(base * 1.5^min(attempt, 10) + jitter, max)`.
//! The exponent clamp keeps the computation bounded while jitter still
//! varies each call below the cap.

use std::time::Duration;

use rand::Rng;

/// Growth factor per attempt.
const MULTIPLIER: f64 = 1.5;

/// Exponent never grows past this.
const MAX_EXPONENT: u32 = 10;

/// Stateless reconnect delay calculator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconnectPolicy {
    /// Delay before the first retry (before jitter).
    pub base_delay: Duration,
    /// Upper bound on any delay.
    pub max_delay: Duration,
    /// Exclusive upper bound on random jitter.
    pub max_jitter: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(1_000),
            max_delay: Duration::from_millis(30_000),
            max_jitter: Duration::from_millis(1_000),
        }
    }
}

impl ReconnectPolicy {
    /// Create a policy with explicit bounds.
    pub fn new(base_delay: Duration, max_delay: Duration, max_jitter: Duration) -> Self {
        Self {
            base_delay,
            max_delay,
            max_jitter,
        }
    }

    /// Delay before reconnect attempt `attempt` (0-based), with fresh jitter.
    pub fn next_delay(&self, attempt: u32) -> Duration {
        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::rng().random_range(0..jitter_ms))
        };
        self.delay_with_jitter(attempt, jitter)
    }

    /// Deterministic core of `next_delay` with caller-supplied jitter.
    pub fn delay_with_jitter(&self, attempt: u32, jitter: Duration) -> Duration {
        (self.base_component(attempt) + jitter).min(self.max_delay)
    }

    /// Non-jitter component: `base * 1.5^min(attempt, 10)`, uncapped.
    pub fn base_component(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(MAX_EXPONENT) as i32;
        self.base_delay.mul_f64(MULTIPLIER.powi(exponent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_attempt_between_one_and_two_seconds() {
        let policy = ReconnectPolicy::default();
        for _ in 0..100 {
            let delay = policy.next_delay(0);
            assert!(delay >= Duration::from_millis(1_000));
            assert!(delay < Duration::from_millis(2_000));
        }
    }

    #[test]
    fn test_growth_is_one_and_a_half() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.base_component(0), Duration::from_millis(1_000));
        assert_eq!(policy.base_component(1), Duration::from_millis(1_500));
        assert_eq!(policy.base_component(2), Duration::from_millis(2_250));
    }

    #[test]
    fn test_capped_at_max() {
        let policy = ReconnectPolicy::default();
        assert_eq!(
            policy.delay_with_jitter(9, Duration::from_millis(999)),
            Duration::from_millis(30_000)
        );
        assert_eq!(policy.next_delay(50), Duration::from_millis(30_000));
    }

    #[test]
    fn test_exponent_clamped_at_ten() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.base_component(10), policy.base_component(11));
        assert_eq!(policy.base_component(10), policy.base_component(u32::MAX));
    }

    #[test]
    fn test_zero_jitter_is_deterministic() {
        let policy = ReconnectPolicy::new(
            Duration::from_millis(100),
            Duration::from_secs(5),
            Duration::ZERO,
        );
        assert_eq!(policy.next_delay(1), Duration::from_millis(150));
    }
}
