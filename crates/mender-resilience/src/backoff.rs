//! Exponential backoff: `min(cap, base * 2^attempt * priority * (1 ± jitter))`.

use std::time::Duration;

use rand::Rng;

use mender_core::config::ResilienceConfig;
use mender_core::models::Priority;

#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub cap: Duration,
    /// Fraction of the computed delay, applied symmetrically.
    pub jitter_ratio: f64,
}

impl BackoffPolicy {
    pub fn new(base: Duration, cap: Duration, jitter_ratio: f64) -> Self {
        Self {
            base,
            cap,
            jitter_ratio: jitter_ratio.clamp(0.0, 1.0),
        }
    }

    pub fn from_config(config: &ResilienceConfig) -> Self {
        Self::new(
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.max_delay_ms),
            config.jitter_ratio,
        )
    }

    /// Delay before retry number `attempt` (0-indexed), with a random jitter draw.
    pub fn delay_for(&self, attempt: u32, priority: Priority) -> Duration {
        let jitter = if self.jitter_ratio > 0.0 {
            rand::rng().random_range(-self.jitter_ratio..=self.jitter_ratio)
        } else {
            0.0
        };
        self.delay_with_jitter(attempt, priority, jitter)
    }

    /// Deterministic form of [`delay_for`](Self::delay_for); `jitter` is a signed fraction.
    pub fn delay_with_jitter(&self, attempt: u32, priority: Priority, jitter: f64) -> Duration {
        let exp = attempt.min(31) as i32;
        let base_ms = self.base.as_secs_f64() * 1000.0;
        let raw_ms = base_ms * 2f64.powi(exp) * priority.delay_multiplier() * (1.0 + jitter);
        let cap_ms = self.cap.as_secs_f64() * 1000.0;
        Duration::from_micros((raw_ms.clamp(0.0, cap_ms) * 1000.0).round() as u64)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from_config(&ResilienceConfig::default())
    }
}
