use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use mender_core::config::ReconstructionConfig;
use mender_reconstruction::{decay_score, meets_mastery};

proptest! {
    #[test]
    fn strict_rate_always_masters(total in 1u64..200, rate in 0.8f64..=1.0) {
        let failed = total - (total as f64 * rate).round() as u64;
        prop_assert!(meets_mastery(total, failed, rate, &ReconstructionConfig::default()));
    }

    #[test]
    fn rate_below_every_tier_never_masters(total in 0u64..200, failed in 0u64..200, rate in 0.0f64..0.6) {
        prop_assert!(!meets_mastery(total, failed, rate, &ReconstructionConfig::default()));
    }

    #[test]
    fn decay_is_non_negative_and_zero_when_perfect(
        total in 1u64..100,
        rate in 0.0f64..=1.0,
        idle_days in 0i64..400,
    ) {
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        let last = now - Duration::days(idle_days);
        let decay = decay_score(total, rate, Some(last), now);
        prop_assert!(decay >= 0.0);
        prop_assert_eq!(decay_score(total, 1.0, Some(last), now), 0.0);
        prop_assert!(decay <= idle_days as f64);
    }
}

#[test]
fn untouched_tags_decay_fully() {
    let now = Utc::now();
    assert_eq!(decay_score(0, 0.0, None, now), 1.0);
}
