//! Stand-alone collaborators used when the host injects none.

use std::collections::HashSet;

use chrono::Duration;

use mender_core::traits::{ReviewScheduler, ScheduleUpdate, SchedulingInput, TagSimilarity};

/// Review intervals in days for boxes 1 through 7.
pub const BOX_INTERVALS_DAYS: [i64; 7] = [1, 3, 7, 14, 30, 60, 90];

/// Leitner-style boxes: the box is the success streak plus one, capped at 7,
/// and the next review falls one box interval after the latest attempt.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedIntervalScheduler;

impl ReviewScheduler for FixedIntervalScheduler {
    fn schedule(&self, input: &SchedulingInput) -> ScheduleUpdate {
        let box_level = (input.consecutive_successes + 1).clamp(1, BOX_INTERVALS_DAYS.len() as u32);
        let days = BOX_INTERVALS_DAYS[(box_level - 1) as usize];
        ScheduleUpdate {
            box_level,
            next_review: input.last_attempt_date + Duration::days(days),
        }
    }
}

/// `|shared| / max(|a|, |b|)` over distinct tags.
#[derive(Debug, Default, Clone, Copy)]
pub struct SharedTagRatio;

impl TagSimilarity for SharedTagRatio {
    fn similarity(&self, tags1: &[String], tags2: &[String]) -> f64 {
        let a: HashSet<&str> = tags1.iter().map(String::as_str).collect();
        let b: HashSet<&str> = tags2.iter().map(String::as_str).collect();
        let larger = a.len().max(b.len());
        if larger == 0 {
            return 0.0;
        }
        a.intersection(&b).count() as f64 / larger as f64
    }
}
