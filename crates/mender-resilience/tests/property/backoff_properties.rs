//! Property tests: backoff delays stay within the cap and respect priority ordering.

use std::time::Duration;

use proptest::prelude::*;

use mender_core::models::Priority;
use mender_resilience::BackoffPolicy;

fn policy() -> BackoffPolicy {
    BackoffPolicy::new(Duration::from_millis(100), Duration::from_secs(5), 0.3)
}

fn priority() -> impl Strategy<Value = Priority> {
    prop_oneof![
        Just(Priority::Low),
        Just(Priority::Normal),
        Just(Priority::High),
        Just(Priority::Critical),
    ]
}

proptest! {
    #[test]
    fn prop_delay_never_exceeds_cap(attempt in 0u32..64, p in priority()) {
        let d = policy().delay_for(attempt, p);
        prop_assert!(d <= Duration::from_secs(5));
    }

    #[test]
    fn prop_delay_within_jitter_band(attempt in 0u32..6, jitter in -0.3f64..=0.3) {
        let p = policy();
        let d = p.delay_with_jitter(attempt, Priority::Normal, jitter).as_secs_f64() * 1000.0;
        let nominal = (100.0 * 2f64.powi(attempt as i32)).min(5000.0);
        prop_assert!(d <= (nominal * 1.3).min(5000.0) + 0.001);
        prop_assert!(d >= (nominal * 0.7).min(5000.0) - 0.001);
    }

    #[test]
    fn prop_unjittered_delays_are_non_decreasing(attempts in 1u32..40) {
        let p = policy();
        let delays: Vec<Duration> = (0..attempts)
            .map(|a| p.delay_with_jitter(a, Priority::Normal, 0.0))
            .collect();
        prop_assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn prop_higher_priority_never_waits_longer(attempt in 0u32..16, jitter in -0.3f64..=0.3) {
        let p = policy();
        let low = p.delay_with_jitter(attempt, Priority::Low, jitter);
        let normal = p.delay_with_jitter(attempt, Priority::Normal, jitter);
        let high = p.delay_with_jitter(attempt, Priority::High, jitter);
        prop_assert!(high <= normal);
        prop_assert!(normal <= low);
    }
}
