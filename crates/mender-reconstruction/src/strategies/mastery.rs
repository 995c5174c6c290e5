//! Per-tag mastery aggregated from the attempt log.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use mender_core::config::ReconstructionConfig;
use mender_core::record::{get_bool, get_datetime, get_f64, get_str, get_u64, timestamp_value};
use mender_core::traits::WriteOp;

use super::common::{attempt_date, attempt_success, index_by_id, same_f64, tags};
use super::{Plan, PlanContext};

/// Whether a tag with `total` attempts, `failed` of them unsuccessful, at
/// success `rate` counts as mastered. Every tier whose gates are met replaces
/// the threshold; later tiers win.
pub fn meets_mastery(total: u64, failed: u64, rate: f64, config: &ReconstructionConfig) -> bool {
    if total == 0 {
        return false;
    }
    let threshold = config
        .mastery_tiers
        .iter()
        .rev()
        .find(|tier| {
            total >= u64::from(tier.min_attempts)
                && failed >= u64::from(tier.min_failures)
                && rate >= tier.min_success_rate
        })
        .map_or(config.mastery_threshold, |tier| tier.threshold);
    rate >= threshold
}

/// `(1 - rate) * whole days since the last attempt`; 1 for an untouched tag.
pub fn decay_score(
    total: u64,
    rate: f64,
    last_attempt: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> f64 {
    if total == 0 {
        return 1.0;
    }
    let days = last_attempt
        .map(|last| (now - last).num_days().max(0))
        .unwrap_or(0);
    (1.0 - rate) * days as f64
}

#[derive(Default)]
struct TagTally {
    total: u64,
    successful: u64,
    last_attempt: Option<DateTime<Utc>>,
    changed: bool,
}

pub fn plan(ctx: &PlanContext<'_>) -> Plan {
    let mut plan = Plan::default();
    let problems = index_by_id(ctx.records("problems"));
    let existing: HashMap<&str, &Value> = ctx
        .records("tag_mastery")
        .iter()
        .filter_map(|r| get_str(r, "tag").map(|t| (t, r)))
        .collect();

    let mut tallies: BTreeMap<String, TagTally> = BTreeMap::new();
    let mut unowned = 0;
    for attempt in ctx.records("attempts") {
        let Some(problem) = get_str(attempt, "problem_id").and_then(|id| problems.get(id)) else {
            unowned += 1;
            continue;
        };
        let date = attempt_date(attempt);
        let changed = match ctx.since {
            None => true,
            Some(cutoff) => date.is_some_and(|d| d > cutoff),
        };
        for tag in tags(problem) {
            let tally = tallies.entry(tag).or_default();
            tally.total += 1;
            if attempt_success(attempt) {
                tally.successful += 1;
            }
            tally.last_attempt = tally.last_attempt.max(date);
            tally.changed |= changed;
        }
    }
    if unowned > 0 {
        plan.detail(format!("{unowned} attempts reference no known problem"));
    }

    for (tag, tally) in tallies {
        if !tally.changed {
            plan.skipped += 1;
            continue;
        }
        let rate = tally.successful as f64 / tally.total as f64;
        let failed = tally.total - tally.successful;
        let mastered = meets_mastery(tally.total, failed, rate, ctx.config);

        if ctx.preserve_existing {
            if let Some(stored) = existing.get(tag.as_str()) {
                let unchanged = get_u64(stored, "total_attempts") == Some(tally.total)
                    && get_u64(stored, "successful_attempts") == Some(tally.successful)
                    && same_f64(get_f64(stored, "success_rate"), rate)
                    && get_bool(stored, "mastered") == Some(mastered)
                    && get_datetime(stored, "last_attempt_date") == tally.last_attempt;
                if unchanged {
                    plan.skipped += 1;
                    continue;
                }
            }
        }

        let record = json!({
            "tag": tag,
            "total_attempts": tally.total,
            "successful_attempts": tally.successful,
            "success_rate": rate,
            "mastered": mastered,
            "decay_score": decay_score(tally.total, rate, tally.last_attempt, ctx.now),
            "last_attempt_date": tally.last_attempt.map(timestamp_value),
            "last_updated": timestamp_value(ctx.now),
        });
        plan.writes.push(WriteOp::put("tag_mastery", record));
    }
    plan
}
