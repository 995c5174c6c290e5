use mender_core::models::{BusinessCheckKind, BusinessFinding, BusinessLogicPhaseResult, FindingLevel, StorageHealth};
use mender_core::record::{get_path, set_path};
use proptest::prelude::*;
use serde_json::json;

proptest! {
    #[test]
    fn storage_score_stays_in_range(usage in 0u64..2_000, quota in 0u64..2_000, latency in 0.0f64..5_000.0) {
        let health = StorageHealth { usage_bytes: usage, quota_bytes: quota, latency_ms: latency, record_count: 0 };
        let score = health.score();
        prop_assert!((0.0..=100.0).contains(&score));
    }

    #[test]
    fn business_score_stays_in_range(errors in 0usize..30, warnings in 0usize..60) {
        let finding = |level| BusinessFinding {
            kind: BusinessCheckKind::CounterMismatch,
            level,
            collection: "problems".into(),
            record_id: "p".into(),
            message: String::new(),
        };
        let findings = std::iter::repeat_with(|| finding(FindingLevel::Error)).take(errors)
            .chain(std::iter::repeat_with(|| finding(FindingLevel::Warning)).take(warnings))
            .collect();
        let result = BusinessLogicPhaseResult::from_findings(findings, false);
        prop_assert!((0.0..=100.0).contains(&result.score));
        prop_assert_eq!(result.errors, errors);
        prop_assert_eq!(result.warnings, warnings);
    }

    #[test]
    fn set_then_get_path(a in "[a-z]{1,8}", b in "[a-z]{1,8}", n in any::<i64>()) {
        let mut rec = json!({});
        let path = format!("{a}.{b}");
        prop_assert!(set_path(&mut rec, &path, json!(n)));
        prop_assert_eq!(get_path(&rec, &path), Some(&json!(n)));
    }
}
