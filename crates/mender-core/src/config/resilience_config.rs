use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Retry, timeout and circuit-breaker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResilienceConfig {
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
    /// Retries after the first attempt.
    pub retries: u32,
    /// Backoff base delay in milliseconds.
    pub base_delay_ms: u64,
    /// Backoff cap in milliseconds.
    pub max_delay_ms: u64,
    /// Jitter as a fraction of the computed delay (0.3 = ±30%).
    pub jitter_ratio: f64,
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,
    /// How long the circuit stays open before a half-open trial.
    pub reset_timeout_ms: u64,
    /// Trial calls allowed while half-open.
    pub half_open_max_attempts: u32,
}

impl ResilienceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn reset_timeout(&self) -> Duration {
        Duration::from_millis(self.reset_timeout_ms)
    }
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            timeout_ms: defaults::DEFAULT_OPERATION_TIMEOUT_MS,
            retries: defaults::DEFAULT_RETRIES,
            base_delay_ms: defaults::DEFAULT_BASE_DELAY_MS,
            max_delay_ms: defaults::DEFAULT_MAX_DELAY_MS,
            jitter_ratio: defaults::DEFAULT_JITTER_RATIO,
            failure_threshold: defaults::DEFAULT_FAILURE_THRESHOLD,
            reset_timeout_ms: defaults::DEFAULT_RESET_TIMEOUT_MS,
            half_open_max_attempts: defaults::DEFAULT_HALF_OPEN_MAX_ATTEMPTS,
        }
    }
}
