//! Business-logic phase: counter consistency, data freshness and, at critical
//! priority, statistical anomalies.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use mender_core::constants::{
    MAX_ATTEMPT_SECS, MIN_ATTEMPTS_FOR_PERFECT_RATE, MIN_ATTEMPT_SECS, SESSION_COMPLETED,
    STALE_MASTERY_DAYS, STALE_SESSION_HOURS,
};
use mender_core::errors::MenderResult;
use mender_core::models::{
    BusinessCheckKind, BusinessFinding, BusinessLogicPhaseResult, FindingLevel,
};
use mender_core::record::{get_datetime, get_f64, get_str, get_u64, Record};
use mender_core::schema::SchemaRegistry;
use mender_core::traits::DocumentStore;

/// The collections the phase reads. Unregistered or out-of-scope ones stay
/// empty, except that `attempts` is read whenever a collection whose counters
/// are checked against it is in scope.
#[derive(Debug, Default)]
pub struct BusinessSnapshot {
    pub problems: Vec<Record>,
    pub sessions: Vec<Record>,
    pub attempts: Vec<Record>,
    pub tag_mastery: Vec<Record>,
}

impl BusinessSnapshot {
    pub async fn load<S: DocumentStore>(
        store: &S,
        registry: &SchemaRegistry,
        scope: &[String],
    ) -> MenderResult<Self> {
        let in_scope = |collection: &str| scope.iter().any(|c| c == collection);
        let attempt_log = ["problems", "sessions", "attempts"].into_iter().any(|c| in_scope(c));
        let mut snapshot = Self::default();
        for (collection, slot) in [
            ("problems", &mut snapshot.problems),
            ("sessions", &mut snapshot.sessions),
            ("attempts", &mut snapshot.attempts),
            ("tag_mastery", &mut snapshot.tag_mastery),
        ] {
            let wanted = in_scope(collection) || (collection == "attempts" && attempt_log);
            if wanted && registry.get(collection).is_some() {
                *slot = store.get_all(collection).await?;
            }
        }
        Ok(snapshot)
    }
}

fn finding(
    kind: BusinessCheckKind,
    level: FindingLevel,
    collection: &str,
    record: &Record,
    message: String,
) -> BusinessFinding {
    let key = match collection {
        "tag_mastery" => get_str(record, "tag"),
        _ => get_str(record, "id"),
    };
    BusinessFinding {
        kind,
        level,
        collection: collection.to_string(),
        record_id: key.unwrap_or("<unknown>").to_string(),
        message,
    }
}

fn count_by<'a>(attempts: &'a [Record], field: &str) -> HashMap<&'a str, u64> {
    let mut counts = HashMap::new();
    for attempt in attempts {
        if let Some(id) = get_str(attempt, field) {
            *counts.entry(id).or_insert(0) += 1;
        }
    }
    counts
}

/// Stored counters that disagree with a fresh scan of `attempts`.
pub fn counter_findings(snapshot: &BusinessSnapshot) -> Vec<BusinessFinding> {
    let mut findings = Vec::new();
    let by_problem = count_by(&snapshot.attempts, "problem_id");
    for problem in &snapshot.problems {
        let Some(stored) = get_u64(problem, "attempt_stats.TotalAttempts") else {
            continue;
        };
        let actual = get_str(problem, "id")
            .and_then(|id| by_problem.get(id))
            .copied()
            .unwrap_or(0);
        if stored != actual {
            findings.push(finding(
                BusinessCheckKind::CounterMismatch,
                FindingLevel::Error,
                "problems",
                problem,
                format!("attempt_stats.TotalAttempts is {stored}, attempt log has {actual}"),
            ));
        }
    }

    let by_session = count_by(&snapshot.attempts, "session_id");
    for session in &snapshot.sessions {
        let Some(stored) = get_u64(session, "attempt_count") else {
            continue;
        };
        let actual = get_str(session, "id")
            .and_then(|id| by_session.get(id))
            .copied()
            .unwrap_or(0);
        if stored != actual {
            findings.push(finding(
                BusinessCheckKind::CounterMismatch,
                FindingLevel::Warning,
                "sessions",
                session,
                format!("attempt_count is {stored}, attempt log has {actual}"),
            ));
        }
    }
    findings
}

/// Open sessions past the stale window and mastery not recalculated recently.
pub fn freshness_findings(snapshot: &BusinessSnapshot, now: DateTime<Utc>) -> Vec<BusinessFinding> {
    let mut findings = Vec::new();
    let stale_session = now - Duration::hours(STALE_SESSION_HOURS);
    for session in &snapshot.sessions {
        if get_str(session, "status") == Some(SESSION_COMPLETED) {
            continue;
        }
        if let Some(date) = get_datetime(session, "date").filter(|d| *d < stale_session) {
            findings.push(finding(
                BusinessCheckKind::StaleSession,
                FindingLevel::Warning,
                "sessions",
                session,
                format!("session still open since {}", date.to_rfc3339()),
            ));
        }
    }

    let stale_mastery = now - Duration::days(STALE_MASTERY_DAYS);
    for mastery in &snapshot.tag_mastery {
        let updated = get_datetime(mastery, "last_updated");
        if updated.map_or(true, |u| u < stale_mastery) {
            findings.push(finding(
                BusinessCheckKind::StaleMastery,
                FindingLevel::Warning,
                "tag_mastery",
                mastery,
                format!("mastery not recalculated in over {STALE_MASTERY_DAYS} days"),
            ));
        }
    }
    findings
}

/// Perfect success on too few attempts and implausible attempt durations.
pub fn anomaly_findings(snapshot: &BusinessSnapshot) -> Vec<BusinessFinding> {
    let mut findings = Vec::new();
    for problem in &snapshot.problems {
        let total = get_u64(problem, "attempt_stats.TotalAttempts").unwrap_or(0);
        let successful = get_u64(problem, "attempt_stats.SuccessfulAttempts").unwrap_or(0);
        if total > 0 && total < MIN_ATTEMPTS_FOR_PERFECT_RATE && successful == total {
            findings.push(finding(
                BusinessCheckKind::SuspiciousSuccessRate,
                FindingLevel::Warning,
                "problems",
                problem,
                format!("100% success rate on only {total} attempts"),
            ));
        }
    }
    for attempt in &snapshot.attempts {
        let Some(secs) = get_f64(attempt, "time_spent") else {
            continue;
        };
        if !(MIN_ATTEMPT_SECS..=MAX_ATTEMPT_SECS).contains(&secs) {
            findings.push(finding(
                BusinessCheckKind::AbnormalDuration,
                FindingLevel::Warning,
                "attempts",
                attempt,
                format!("attempt took {secs}s"),
            ));
        }
    }
    findings
}

fn all_findings(
    snapshot: &BusinessSnapshot,
    now: DateTime<Utc>,
    with_anomalies: bool,
) -> Vec<BusinessFinding> {
    let mut findings = counter_findings(snapshot);
    findings.extend(freshness_findings(snapshot, now));
    if with_anomalies {
        findings.extend(anomaly_findings(snapshot));
    }
    findings
}

pub fn evaluate(
    snapshot: &BusinessSnapshot,
    now: DateTime<Utc>,
    with_anomalies: bool,
) -> BusinessLogicPhaseResult {
    BusinessLogicPhaseResult::from_findings(all_findings(snapshot, now, with_anomalies), with_anomalies)
}

/// Findings are kept only for collections in `scope`.
pub async fn run<S: DocumentStore>(
    store: &S,
    registry: &SchemaRegistry,
    scope: &[String],
    with_anomalies: bool,
) -> MenderResult<BusinessLogicPhaseResult> {
    let snapshot = BusinessSnapshot::load(store, registry, scope).await?;
    let mut findings = all_findings(&snapshot, Utc::now(), with_anomalies);
    findings.retain(|f| scope.contains(&f.collection));
    Ok(BusinessLogicPhaseResult::from_findings(findings, with_anomalies))
}
