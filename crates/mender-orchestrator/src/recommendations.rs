//! Actionable recommendations derived from phase results.
//!
//! Examples: "run reconstruction for tag_mastery", "review 3 manual-review violations".

use mender_core::models::{
    BusinessCheckKind, PhaseResults, Recommendation, RecommendationPriority, Severity,
    ViolationType,
};

fn push(
    recs: &mut Vec<Recommendation>,
    priority: RecommendationPriority,
    action: impl Into<String>,
    reason: impl Into<String>,
) {
    recs.push(Recommendation {
        priority,
        action: action.into(),
        reason: reason.into(),
    });
}

/// Generate recommendations, highest priority first.
pub fn generate(results: &PhaseResults) -> Vec<Recommendation> {
    let mut recs = Vec::new();

    if let Some(schema) = &results.schema {
        for c in schema.collections.iter().filter(|c| c.invalid_records > 0) {
            push(
                &mut recs,
                RecommendationPriority::High,
                format!("fix {} invalid records in {}", c.invalid_records, c.collection),
                format!("{} of {} records failed schema validation", c.invalid_records, c.records_checked),
            );
        }
    }

    if let Some(referential) = &results.referential {
        let critical = referential
            .violations
            .iter()
            .filter(|v| v.severity == Severity::Critical)
            .count();
        let automated = referential.suggestions.iter().filter(|s| s.automated).count();
        let manual = referential.suggestions.len() - automated;
        let cycles = referential
            .violations
            .iter()
            .filter(|v| v.violation_type == ViolationType::CircularReference)
            .count();
        if automated > 0 {
            let priority = if critical > 0 {
                RecommendationPriority::High
            } else {
                RecommendationPriority::Medium
            };
            push(
                &mut recs,
                priority,
                format!("execute {automated} automated repairs"),
                format!("{critical} critical referential violations found"),
            );
        }
        if manual > 0 {
            push(
                &mut recs,
                RecommendationPriority::Medium,
                format!("review {manual} manual-review violations"),
                "these violations have no safe automated repair",
            );
        }
        if cycles > 0 {
            push(
                &mut recs,
                RecommendationPriority::Medium,
                format!("break {cycles} circular references"),
                "relationship graphs must stay acyclic",
            );
        }
    }

    if let Some(business) = &results.business_logic {
        let mismatches = business.count_kind(BusinessCheckKind::CounterMismatch);
        if mismatches > 0 {
            push(
                &mut recs,
                RecommendationPriority::High,
                "run reconstruction for problem_stats",
                format!("{mismatches} stored counters disagree with the attempt log"),
            );
        }
        let stale_mastery = business.count_kind(BusinessCheckKind::StaleMastery);
        if stale_mastery > 0 {
            push(
                &mut recs,
                RecommendationPriority::Medium,
                "run reconstruction for tag_mastery",
                format!("{stale_mastery} mastery records are stale"),
            );
        }
        let stale_sessions = business.count_kind(BusinessCheckKind::StaleSession);
        if stale_sessions > 0 {
            push(
                &mut recs,
                RecommendationPriority::Low,
                format!("close or recover {stale_sessions} stale sessions"),
                "sessions left open for more than a day",
            );
        }
        let anomalies = business.count_kind(BusinessCheckKind::SuspiciousSuccessRate)
            + business.count_kind(BusinessCheckKind::AbnormalDuration);
        if anomalies > 0 {
            push(
                &mut recs,
                RecommendationPriority::Low,
                format!("inspect {anomalies} statistical anomalies"),
                "implausible success rates or attempt durations",
            );
        }
    }

    if let Some(storage) = &results.storage_health {
        let priority = if storage.score < 60.0 {
            RecommendationPriority::High
        } else {
            RecommendationPriority::Medium
        };
        for issue in &storage.issues {
            push(&mut recs, priority, "reduce storage pressure", issue.clone());
        }
    }

    recs.sort_by(|a, b| b.priority.cmp(&a.priority));
    recs
}

#[cfg(test)]
mod tests {
    use super::*;
    use mender_core::models::{BusinessFinding, BusinessLogicPhaseResult, FindingLevel};

    fn finding(kind: BusinessCheckKind) -> BusinessFinding {
        BusinessFinding {
            kind,
            level: FindingLevel::Warning,
            collection: "tag_mastery".into(),
            record_id: "array".into(),
            message: String::new(),
        }
    }

    #[test]
    fn healthy_results_need_nothing() {
        assert!(generate(&PhaseResults::default()).is_empty());
    }

    #[test]
    fn stale_mastery_suggests_reconstruction() {
        let results = PhaseResults {
            business_logic: Some(BusinessLogicPhaseResult::from_findings(
                vec![
                    finding(BusinessCheckKind::StaleMastery),
                    finding(BusinessCheckKind::StaleSession),
                ],
                false,
            )),
            ..Default::default()
        };
        let recs = generate(&results);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].action, "run reconstruction for tag_mastery");
        assert_eq!(recs[1].priority, RecommendationPriority::Low);
    }
}
