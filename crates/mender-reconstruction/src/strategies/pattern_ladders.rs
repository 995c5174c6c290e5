//! Per-tag ladders of standard problems, easiest first.

use std::collections::{BTreeSet, HashSet};

use serde_json::json;

use mender_core::record::{get_str, timestamp_value, Record};
use mender_core::traits::WriteOp;

use super::common::{difficulty_rank, record_id, tags};
use super::{Plan, PlanContext};

/// Difficulty rank then id; unknown difficulties sort last.
pub fn ladder_order(a: &Record, b: &Record) -> std::cmp::Ordering {
    let rank = |r: &Record| get_str(r, "difficulty").and_then(difficulty_rank).unwrap_or(u8::MAX);
    rank(a)
        .cmp(&rank(b))
        .then_with(|| record_id(a).cmp(&record_id(b)))
}

pub fn plan(ctx: &PlanContext<'_>) -> Plan {
    let mut plan = Plan::default();
    let standard = ctx.records("standard_problems");
    let existing: HashSet<&str> = ctx
        .records("pattern_ladders")
        .iter()
        .filter_map(|r| get_str(r, "tag"))
        .collect();

    let mut tracked: BTreeSet<String> = ctx
        .records("tag_mastery")
        .iter()
        .filter_map(|r| get_str(r, "tag").map(str::to_string))
        .collect();
    if tracked.is_empty() {
        tracked = standard.iter().flat_map(tags).collect();
    }

    for tag in tracked {
        if ctx.preserve_existing && existing.contains(tag.as_str()) {
            plan.skipped += 1;
            continue;
        }
        let mut rungs: Vec<&Record> = standard
            .iter()
            .filter(|p| tags(p).iter().any(|t| *t == tag))
            .collect();
        if rungs.is_empty() {
            plan.skipped += 1;
            plan.detail(format!("no standard problems carry tag {tag}"));
            continue;
        }
        rungs.sort_by(|a, b| ladder_order(a, b));
        let problems: Vec<_> = rungs
            .iter()
            .map(|p| {
                json!({
                    "id": p.get("id"),
                    "title": p.get("title"),
                    "difficulty": p.get("difficulty"),
                })
            })
            .collect();
        plan.writes.push(WriteOp::put(
            "pattern_ladders",
            json!({
                "tag": tag,
                "problems": problems,
                "last_updated": timestamp_value(ctx.now),
            }),
        ));
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn easier_first_then_by_id() {
        let mut problems = vec![
            json!({"id": "b", "difficulty": "Hard"}),
            json!({"id": "c", "difficulty": "Easy"}),
            json!({"id": "a", "difficulty": "Easy"}),
            json!({"id": "d"}),
        ];
        problems.sort_by(ladder_order);
        let ids: Vec<_> = problems.iter().map(|p| p["id"].as_str().unwrap()).collect();
        assert_eq!(ids, ["a", "c", "b", "d"]);
    }
}
