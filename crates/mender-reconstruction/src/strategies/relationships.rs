//! Relationships between standard problems that share tags.

use std::collections::HashSet;

use serde_json::json;

use mender_core::record::{get_str, timestamp_value, Record};
use mender_core::traits::WriteOp;

use super::common::{difficulty_rank, record_id, tags};
use super::{Plan, PlanContext};

/// Relationship id for an ordered pair.
pub fn relationship_id(id1: &str, id2: &str) -> String {
    format!("{id1}::{id2}")
}

/// `similar` on equal difficulty, otherwise direction relative to the first problem.
pub fn relationship_type(difficulty1: Option<&str>, difficulty2: Option<&str>) -> &'static str {
    let r1 = difficulty1.and_then(difficulty_rank);
    let r2 = difficulty2.and_then(difficulty_rank);
    match r1.cmp(&r2) {
        std::cmp::Ordering::Equal => "similar",
        std::cmp::Ordering::Less => "prerequisite",
        std::cmp::Ordering::Greater => "followup",
    }
}

pub fn plan(ctx: &PlanContext<'_>) -> Plan {
    let mut plan = Plan::default();
    let existing: HashSet<&str> = ctx
        .records("problem_relationships")
        .iter()
        .filter_map(record_id)
        .collect();

    let mut problems: Vec<(&str, &Record, Vec<String>)> = ctx
        .records("standard_problems")
        .iter()
        .filter_map(|p| record_id(p).map(|id| (id, p, tags(p))))
        .collect();
    problems.sort_by(|a, b| a.0.cmp(b.0));

    for (i, (id1, p1, tags1)) in problems.iter().enumerate() {
        for (id2, p2, tags2) in &problems[i + 1..] {
            if !tags1.iter().any(|t| tags2.contains(t)) {
                continue;
            }
            let strength = ctx.similarity.similarity(tags1, tags2);
            if strength < ctx.config.relationship_min_strength {
                continue;
            }
            let id = relationship_id(id1, id2);
            if ctx.preserve_existing && existing.contains(id.as_str()) {
                plan.skipped += 1;
                continue;
            }
            plan.writes.push(WriteOp::put(
                "problem_relationships",
                json!({
                    "id": id,
                    "problem_id1": id1,
                    "problem_id2": id2,
                    "strength": strength,
                    "relationship_type": relationship_type(
                        get_str(p1, "difficulty"),
                        get_str(p2, "difficulty"),
                    ),
                    "created_at": timestamp_value(ctx.now),
                }),
            ));
        }
    }
    plan
}
