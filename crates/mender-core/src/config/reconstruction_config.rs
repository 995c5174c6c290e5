use serde::{Deserialize, Serialize};

use super::defaults;

/// A relaxed mastery tier: once the evidence gates are met, `threshold` replaces the strict one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MasteryTier {
    /// Minimum total attempts (0 = no gate).
    pub min_attempts: u32,
    /// Minimum failed attempts (0 = no gate).
    pub min_failures: u32,
    /// Minimum observed success rate.
    pub min_success_rate: f64,
    /// Threshold applied once the gates are met.
    pub threshold: f64,
}

/// Reconstruction subsystem configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructionConfig {
    /// Results retained in reconstruction history.
    pub history_limit: usize,
    /// Strict mastery threshold before any tier applies.
    pub mastery_threshold: f64,
    /// Relationships weaker than this are not materialized.
    pub relationship_min_strength: f64,
    /// Expected solve time for Easy problems (seconds).
    pub expected_time_easy_secs: f64,
    /// Expected solve time for Medium problems (seconds).
    pub expected_time_medium_secs: f64,
    /// Expected solve time for Hard problems (seconds).
    pub expected_time_hard_secs: f64,
    /// Relaxed tiers, evaluated in order; later tiers win.
    pub mastery_tiers: Vec<MasteryTier>,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            history_limit: defaults::DEFAULT_RECONSTRUCTION_HISTORY_LIMIT,
            mastery_threshold: defaults::DEFAULT_MASTERY_THRESHOLD,
            relationship_min_strength: defaults::DEFAULT_RELATIONSHIP_MIN_STRENGTH,
            expected_time_easy_secs: defaults::DEFAULT_EXPECTED_TIME_EASY_SECS,
            expected_time_medium_secs: defaults::DEFAULT_EXPECTED_TIME_MEDIUM_SECS,
            expected_time_hard_secs: defaults::DEFAULT_EXPECTED_TIME_HARD_SECS,
            mastery_tiers: vec![
                MasteryTier {
                    min_attempts: 8,
                    min_failures: 0,
                    min_success_rate: 0.75,
                    threshold: 0.75,
                },
                MasteryTier {
                    min_attempts: 12,
                    min_failures: 0,
                    min_success_rate: 0.70,
                    threshold: 0.70,
                },
                MasteryTier {
                    min_attempts: 0,
                    min_failures: 15,
                    min_success_rate: 0.60,
                    threshold: 0.60,
                },
            ],
        }
    }
}
