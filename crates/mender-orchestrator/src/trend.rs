//! Health trend over the check history.

use mender_core::models::{HealthTrend, TrendDirection};

/// Compare the mean of the newest `window` scores with the `window` before
/// them. `scores` are ordered oldest first.
pub fn health_trend(scores: &[f64], window: usize, threshold: f64) -> HealthTrend {
    let window = window.max(1);
    if scores.len() < 2 * window {
        return HealthTrend {
            direction: TrendDirection::InsufficientData,
            recent_average: None,
            previous_average: None,
            reports_considered: scores.len(),
        };
    }

    let recent = &scores[scores.len() - window..];
    let previous = &scores[scores.len() - 2 * window..scores.len() - window];
    let recent_average = mean(recent);
    let previous_average = mean(previous);
    let delta = recent_average - previous_average;

    let direction = if delta > threshold {
        TrendDirection::Improving
    } else if delta < -threshold {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    };

    HealthTrend {
        direction,
        recent_average: Some(recent_average),
        previous_average: Some(previous_average),
        reports_considered: 2 * window,
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fewer_than_two_windows_is_insufficient() {
        let trend = health_trend(&[90.0; 9], 5, 2.0);
        assert_eq!(trend.direction, TrendDirection::InsufficientData);
        assert_eq!(trend.reports_considered, 9);
        assert!(trend.recent_average.is_none());
    }

    #[test]
    fn improving_declining_stable() {
        let mut scores = vec![80.0; 5];
        scores.extend([85.0; 5]);
        assert_eq!(health_trend(&scores, 5, 2.0).direction, TrendDirection::Improving);

        scores.reverse();
        assert_eq!(health_trend(&scores, 5, 2.0).direction, TrendDirection::Declining);

        let flat: Vec<f64> = (0..10).map(|i| 90.0 + (i % 2) as f64).collect();
        assert_eq!(health_trend(&flat, 5, 2.0).direction, TrendDirection::Stable);
    }

    #[test]
    fn only_the_newest_two_windows_count() {
        let mut scores = vec![0.0; 20];
        scores.extend([90.0; 10]);
        let trend = health_trend(&scores, 5, 2.0);
        assert_eq!(trend.direction, TrendDirection::Stable);
        assert_eq!(trend.previous_average, Some(90.0));
    }
}
