use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Periodic monitoring and check-history configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// Interval between quick checks (seconds).
    pub quick_interval_secs: u64,
    /// Interval between full checks (seconds).
    pub full_interval_secs: u64,
    /// Apply automated low-risk repairs after each full check.
    pub auto_repair: bool,
    /// Reports retained in check history.
    pub history_limit: usize,
    /// Reports per trend window.
    pub trend_window: usize,
    /// Score delta that separates improving/declining from stable.
    pub trend_threshold: f64,
    /// Records sampled per collection by a quick check.
    pub quick_sample_size: usize,
}

impl MonitoringConfig {
    pub fn quick_interval(&self) -> Duration {
        Duration::from_secs(self.quick_interval_secs.max(1))
    }

    pub fn full_interval(&self) -> Duration {
        Duration::from_secs(self.full_interval_secs.max(1))
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            quick_interval_secs: defaults::DEFAULT_QUICK_INTERVAL_SECS,
            full_interval_secs: defaults::DEFAULT_FULL_INTERVAL_SECS,
            auto_repair: defaults::DEFAULT_AUTO_REPAIR,
            history_limit: defaults::DEFAULT_CHECK_HISTORY_LIMIT,
            trend_window: defaults::DEFAULT_TREND_WINDOW,
            trend_threshold: defaults::DEFAULT_TREND_THRESHOLD,
            quick_sample_size: defaults::DEFAULT_QUICK_SAMPLE_SIZE,
        }
    }
}
