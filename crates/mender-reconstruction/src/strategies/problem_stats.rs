//! Attempt counters and review schedule on each problem.

use serde_json::json;

use mender_core::record::{get_datetime, get_u64, set_path, timestamp_value};
use mender_core::traits::{SchedulingInput, WriteOp};

use super::common::{attempt_date, attempt_success, attempts_by_problem, changed_since, record_id};
use super::{Plan, PlanContext};

pub fn plan(ctx: &PlanContext<'_>) -> Plan {
    let mut plan = Plan::default();
    let by_problem = attempts_by_problem(ctx.records("attempts"));

    for problem in ctx.records("problems") {
        let Some(id) = record_id(problem) else {
            plan.errors.push("problem without an id".to_string());
            continue;
        };
        let group = by_problem.get(id).map(Vec::as_slice).unwrap_or(&[]);
        if ctx.since.is_some() && !changed_since(group, ctx.since) {
            plan.skipped += 1;
            continue;
        }

        let total = group.len() as u64;
        let successful = group.iter().filter(|a| attempt_success(a)).count() as u64;
        let unsuccessful = total - successful;

        let schedule = group.last().and_then(|latest| {
            let last_attempt_date = attempt_date(latest)?;
            let streak = group.iter().rev().take_while(|a| attempt_success(a)).count();
            let input = SchedulingInput {
                problem_id: id.to_string(),
                current_box: get_u64(problem, "box_level").map(|b| b as u32),
                total_attempts: total as u32,
                last_attempt_date,
                last_success: attempt_success(latest),
                consecutive_successes: streak as u32,
            };
            Some(ctx.scheduler.schedule(&input))
        });
        if !group.is_empty() && schedule.is_none() {
            plan.detail(format!("problem {id}: latest attempt has no date, schedule left as is"));
        }

        if ctx.preserve_existing {
            let same_stats = get_u64(problem, "attempt_stats.TotalAttempts") == Some(total)
                && get_u64(problem, "attempt_stats.SuccessfulAttempts") == Some(successful)
                && get_u64(problem, "attempt_stats.UnsuccessfulAttempts") == Some(unsuccessful);
            let same_schedule = schedule.as_ref().map_or(true, |s| {
                get_u64(problem, "box_level") == Some(u64::from(s.box_level))
                    && get_datetime(problem, "next_review") == Some(s.next_review)
            });
            if same_stats && same_schedule {
                plan.skipped += 1;
                continue;
            }
        }

        let mut updated = problem.clone();
        set_path(
            &mut updated,
            "attempt_stats",
            json!({
                "TotalAttempts": total,
                "SuccessfulAttempts": successful,
                "UnsuccessfulAttempts": unsuccessful,
            }),
        );
        if let Some(s) = schedule {
            set_path(&mut updated, "box_level", json!(s.box_level));
            set_path(&mut updated, "next_review", timestamp_value(s.next_review));
        }
        plan.writes.push(WriteOp::put("problems", updated));
    }
    plan
}
