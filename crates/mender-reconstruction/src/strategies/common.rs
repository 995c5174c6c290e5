//! Field accessors and groupings shared by the planners.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use mender_core::record::{get_bool, get_datetime, get_f64, get_str, get_string_list, Record};

pub fn record_id(record: &Record) -> Option<&str> {
    get_str(record, "id").filter(|id| !id.is_empty())
}

pub fn attempt_success(attempt: &Record) -> bool {
    get_bool(attempt, "success").unwrap_or(false)
}

pub fn attempt_time(attempt: &Record) -> f64 {
    get_f64(attempt, "time_spent").unwrap_or(0.0)
}

pub fn attempt_date(attempt: &Record) -> Option<DateTime<Utc>> {
    get_datetime(attempt, "attempt_date")
}

/// Easy < Medium < Hard. Unknown labels rank as `None`.
pub fn difficulty_rank(label: &str) -> Option<u8> {
    match label.to_ascii_lowercase().as_str() {
        "easy" => Some(0),
        "medium" => Some(1),
        "hard" => Some(2),
        _ => None,
    }
}

pub fn tags(record: &Record) -> Vec<String> {
    get_string_list(record, "tags")
}

/// Records keyed by their `id`.
pub fn index_by_id(records: &[Record]) -> HashMap<&str, &Record> {
    records
        .iter()
        .filter_map(|r| record_id(r).map(|id| (id, r)))
        .collect()
}

/// Attempts grouped by `problem_id`, each group sorted oldest first.
pub fn attempts_by_problem(attempts: &[Record]) -> BTreeMap<&str, Vec<&Record>> {
    let mut groups: BTreeMap<&str, Vec<&Record>> = BTreeMap::new();
    for attempt in attempts {
        if let Some(problem_id) = get_str(attempt, "problem_id") {
            groups.entry(problem_id).or_default().push(attempt);
        }
    }
    for group in groups.values_mut() {
        group.sort_by_key(|a| attempt_date(a));
    }
    groups
}

/// Whether any attempt in `group` is newer than `since` (always true without a cutoff).
pub fn changed_since(group: &[&Record], since: Option<DateTime<Utc>>) -> bool {
    match since {
        None => true,
        Some(cutoff) => group
            .iter()
            .any(|a| attempt_date(a).is_some_and(|d| d > cutoff)),
    }
}

/// Float equality at storage precision.
pub fn same_f64(a: Option<f64>, b: f64) -> bool {
    a.is_some_and(|a| (a - b).abs() < 1e-9)
}
