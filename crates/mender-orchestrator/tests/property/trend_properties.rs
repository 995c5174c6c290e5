use proptest::prelude::*;

use mender_core::models::TrendDirection;
use mender_orchestrator::health_trend;

proptest! {
    #[test]
    fn constant_history_is_stable(score in 0.0f64..=100.0, len in 10usize..100) {
        let trend = health_trend(&vec![score; len], 5, 2.0);
        prop_assert_eq!(trend.direction, TrendDirection::Stable);
        prop_assert_eq!(trend.reports_considered, 10);
    }

    #[test]
    fn short_history_is_insufficient(scores in prop::collection::vec(0.0f64..=100.0, 0..10)) {
        let trend = health_trend(&scores, 5, 2.0);
        prop_assert_eq!(trend.direction, TrendDirection::InsufficientData);
        prop_assert_eq!(trend.reports_considered, scores.len());
    }

    #[test]
    fn a_jump_beyond_the_threshold_is_improving(base in 0.0f64..90.0, jump in 2.5f64..10.0) {
        let mut scores = vec![base; 5];
        scores.extend(vec![base + jump; 5]);
        prop_assert_eq!(health_trend(&scores, 5, 2.0).direction, TrendDirection::Improving);
    }
}
