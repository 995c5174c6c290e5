//! Record builders matching the default catalog's field names.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};

use mender_core::record::timestamp_value;

/// Midnight UTC on the given day.
pub fn day(year: i32, month: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, d, 0, 0, 0)
        .single()
        .unwrap_or_else(|| panic!("invalid date {year}-{month}-{d}"))
}

fn tags_value(tags: &[&str]) -> Value {
    json!(tags)
}

pub fn standard_problem(id: &str, difficulty: &str, tags: &[&str]) -> Value {
    json!({
        "id": id,
        "title": format!("Problem {id}"),
        "difficulty": difficulty,
        "tags": tags_value(tags),
    })
}

pub fn problem(id: &str, difficulty: &str, tags: &[&str]) -> Value {
    json!({
        "id": id,
        "title": format!("Problem {id}"),
        "difficulty": difficulty,
        "tags": tags_value(tags),
    })
}

pub fn problem_of(id: &str, standard_problem_id: &str, difficulty: &str, tags: &[&str]) -> Value {
    let mut record = problem(id, difficulty, tags);
    record["standard_problem_id"] = json!(standard_problem_id);
    record
}

pub fn session(id: &str, status: &str, date: DateTime<Utc>) -> Value {
    json!({
        "id": id,
        "date": timestamp_value(date),
        "status": status,
        "session_type": "standard",
    })
}

pub fn completed_session(id: &str, date: DateTime<Utc>) -> Value {
    session(id, mender_core::constants::SESSION_COMPLETED, date)
}

pub fn attempt(
    id: &str,
    problem_id: &str,
    session_id: Option<&str>,
    success: bool,
    time_spent_secs: f64,
    date: DateTime<Utc>,
) -> Value {
    json!({
        "id": id,
        "problem_id": problem_id,
        "session_id": session_id,
        "success": success,
        "time_spent": time_spent_secs,
        "attempt_date": timestamp_value(date),
    })
}

pub fn tag_mastery(tag: &str, total: u64, successful: u64, last_attempt: DateTime<Utc>) -> Value {
    let rate = if total > 0 {
        successful as f64 / total as f64
    } else {
        0.0
    };
    json!({
        "tag": tag,
        "total_attempts": total,
        "successful_attempts": successful,
        "success_rate": rate,
        "mastered": false,
        "decay_score": 1.0,
        "last_attempt_date": timestamp_value(last_attempt),
        "last_updated": timestamp_value(last_attempt),
    })
}

pub fn session_analytics(session_id: &str) -> Value {
    json!({
        "session_id": session_id,
        "accuracy": 1.0,
        "total_time": 0.0,
        "avg_time": 0.0,
        "predominant_difficulty": "Easy",
        "efficiency": 1.0,
        "improvement_areas": [],
    })
}

pub fn problem_relationship(id1: &str, id2: &str) -> Value {
    json!({
        "id": format!("{id1}::{id2}"),
        "problem_id1": id1,
        "problem_id2": id2,
        "strength": 1.0,
        "relationship_type": "similar",
    })
}

pub fn tag_relationship(id: &str, prerequisites: &[&str]) -> Value {
    json!({
        "id": id,
        "prerequisites": tags_value(prerequisites),
    })
}
