//! Rehome attempts whose session is missing: one recovered session per UTC day.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde_json::{json, Value};

use mender_core::constants::SESSION_COMPLETED;
use mender_core::record::{get_str, set_path, timestamp_value, Record};
use mender_core::traits::WriteOp;

use super::common::{attempt_date, record_id};
use super::{Plan, PlanContext};

pub const RECOVERED_SESSION_TYPE: &str = "recovered";

pub fn plan(ctx: &PlanContext<'_>) -> Plan {
    let mut plan = Plan::default();
    let sessions: HashSet<&str> = ctx.records("sessions").iter().filter_map(record_id).collect();

    let mut by_day: BTreeMap<NaiveDate, Vec<&Record>> = BTreeMap::new();
    for attempt in ctx.records("attempts") {
        let homed = get_str(attempt, "session_id").is_some_and(|s| sessions.contains(s));
        if homed {
            continue;
        }
        match attempt_date(attempt) {
            Some(date) => by_day.entry(date.date_naive()).or_default().push(attempt),
            None => {
                plan.skipped += 1;
                plan.detail(format!(
                    "attempt {} has no attempt_date and cannot be placed in a session",
                    record_id(attempt).unwrap_or("<unknown>")
                ));
            }
        }
    }

    for (day, attempts) in by_day {
        let session_id = uuid::Uuid::new_v4().to_string();
        let started = attempts.iter().filter_map(|a| attempt_date(a)).min();
        let attempt_ids: Vec<&str> = attempts.iter().filter_map(|a| record_id(a)).collect();
        plan.writes.push(WriteOp::put(
            "sessions",
            json!({
                "id": session_id,
                "date": started.map(timestamp_value),
                "status": SESSION_COMPLETED,
                "session_type": RECOVERED_SESSION_TYPE,
                "recovered": true,
                "attempt_count": attempts.len(),
                "attempts": attempt_ids,
            }),
        ));
        for attempt in attempts {
            let mut patched = attempt.clone();
            set_path(&mut patched, "session_id", Value::String(session_id.clone()));
            plan.writes.push(WriteOp::put("attempts", patched));
        }
        plan.detail(format!(
            "recovered session {session_id} for {day} with {} attempts",
            attempt_ids.len()
        ));
    }
    plan
}
