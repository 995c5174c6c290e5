//! Per-session performance summaries for completed sessions.

use std::collections::{BTreeMap, HashSet};

use serde_json::json;

use mender_core::config::ReconstructionConfig;
use mender_core::constants::SESSION_COMPLETED;
use mender_core::record::{get_str, Record};
use mender_core::traits::WriteOp;

use super::common::{
    attempt_success, attempt_time, changed_since, difficulty_rank, index_by_id, record_id,
};
use super::{Plan, PlanContext};

const DIFFICULTY_LABELS: [&str; 3] = ["Easy", "Medium", "Hard"];

/// Accuracy below this flags `accuracy`.
const LOW_ACCURACY: f64 = 0.7;
/// Accuracy above this, while faster than expected, flags `difficulty_progression`.
const HIGH_ACCURACY: f64 = 0.9;
/// Average time beyond this multiple of the expected time flags `time_management`.
const SLOW_FACTOR: f64 = 1.5;

/// Most frequent difficulty rank; ties go to the harder one.
pub fn predominant_difficulty(ranks: &[u8]) -> Option<u8> {
    let mut counts = [0usize; DIFFICULTY_LABELS.len()];
    for rank in ranks {
        if let Some(count) = counts.get_mut(usize::from(*rank)) {
            *count += 1;
        }
    }
    counts
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0)
        .max_by_key(|(rank, count)| (**count, *rank))
        .map(|(rank, _)| rank as u8)
}

pub fn expected_time_secs(rank: Option<u8>, config: &ReconstructionConfig) -> f64 {
    match rank {
        Some(0) => config.expected_time_easy_secs,
        Some(2) => config.expected_time_hard_secs,
        _ => config.expected_time_medium_secs,
    }
}

pub fn improvement_areas(accuracy: f64, avg_time: f64, expected: f64) -> Vec<&'static str> {
    let mut areas = Vec::new();
    if accuracy < LOW_ACCURACY {
        areas.push("accuracy");
    }
    if avg_time > SLOW_FACTOR * expected {
        areas.push("time_management");
    }
    if accuracy > HIGH_ACCURACY && avg_time < expected {
        areas.push("difficulty_progression");
    }
    areas
}

pub fn plan(ctx: &PlanContext<'_>) -> Plan {
    let mut plan = Plan::default();
    let problems = index_by_id(ctx.records("problems"));
    let analysed: HashSet<&str> = ctx
        .records("session_analytics")
        .iter()
        .filter_map(|r| get_str(r, "session_id"))
        .collect();

    let mut by_session: BTreeMap<&str, Vec<&Record>> = BTreeMap::new();
    for attempt in ctx.records("attempts") {
        if let Some(session_id) = get_str(attempt, "session_id") {
            by_session.entry(session_id).or_default().push(attempt);
        }
    }

    for session in ctx.records("sessions") {
        if get_str(session, "status") != Some(SESSION_COMPLETED) {
            continue;
        }
        let Some(id) = record_id(session) else {
            continue;
        };
        if ctx.preserve_existing && analysed.contains(id) {
            plan.skipped += 1;
            continue;
        }
        let attempts = by_session.get(id).map(Vec::as_slice).unwrap_or(&[]);
        if attempts.is_empty() {
            plan.skipped += 1;
            plan.detail(format!("session {id} is completed but has no attempts"));
            continue;
        }
        if ctx.since.is_some() && !changed_since(attempts, ctx.since) {
            plan.skipped += 1;
            continue;
        }

        let count = attempts.len() as f64;
        let accuracy = attempts.iter().filter(|a| attempt_success(a)).count() as f64 / count;
        let total_time: f64 = attempts.iter().map(|a| attempt_time(a)).sum();
        let avg_time = total_time / count;

        let ranks: Vec<u8> = attempts
            .iter()
            .filter_map(|a| {
                get_str(a, "difficulty")
                    .or_else(|| {
                        get_str(a, "problem_id")
                            .and_then(|pid| problems.get(pid))
                            .and_then(|p| get_str(p, "difficulty"))
                    })
                    .and_then(difficulty_rank)
            })
            .collect();
        let predominant = predominant_difficulty(&ranks);
        let expected = expected_time_secs(predominant, ctx.config);
        let efficiency = if avg_time > 0.0 {
            (expected / avg_time).min(1.0) * accuracy
        } else {
            accuracy
        };

        let record = json!({
            "session_id": id,
            "accuracy": accuracy,
            "total_time": total_time,
            "avg_time": avg_time,
            "predominant_difficulty": predominant.map(|r| DIFFICULTY_LABELS[usize::from(r)]),
            "efficiency": efficiency,
            "improvement_areas": improvement_areas(accuracy, avg_time, expected),
        });
        plan.writes.push(WriteOp::put("session_analytics", record));
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_go_to_the_harder_difficulty() {
        assert_eq!(predominant_difficulty(&[1, 2]), Some(2));
        assert_eq!(predominant_difficulty(&[0, 0, 2]), Some(0));
        assert_eq!(predominant_difficulty(&[]), None);
    }

    #[test]
    fn unknown_difficulty_expects_medium_time() {
        let config = ReconstructionConfig::default();
        assert_eq!(expected_time_secs(None, &config), 1_800.0);
        assert_eq!(expected_time_secs(Some(0), &config), 900.0);
    }

    #[test]
    fn improvement_rules() {
        assert_eq!(improvement_areas(0.5, 2_000.0, 1_800.0), vec!["accuracy"]);
        assert_eq!(improvement_areas(0.8, 3_000.0, 1_800.0), vec!["time_management"]);
        assert_eq!(
            improvement_areas(0.95, 600.0, 900.0),
            vec!["difficulty_progression"]
        );
        assert!(improvement_areas(0.8, 600.0, 900.0).is_empty());
    }
}
