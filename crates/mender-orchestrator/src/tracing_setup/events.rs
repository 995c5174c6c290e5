//! Structured log events for orchestrator operations.

use mender_core::models::{CheckType, SystemErrorInfo, TrendDirection};

pub fn check_completed(check_type: CheckType, score: f64, errors: usize, warnings: usize, ms: u64) {
    tracing::info!(
        event = "check_completed",
        check_type = check_type.as_str(),
        score = score,
        errors = errors,
        warnings = warnings,
        duration_ms = ms,
        "integrity check completed"
    );
}

pub fn check_failed(check_type: CheckType, error: &SystemErrorInfo) {
    tracing::error!(
        event = "check_failed",
        check_type = check_type.as_str(),
        category = ?error.category,
        error = %error.message,
        "integrity check could not run"
    );
}

pub fn monitoring_started(quick_secs: u64, full_secs: u64, auto_repair: bool) {
    tracing::info!(
        event = "monitoring_started",
        quick_interval_secs = quick_secs,
        full_interval_secs = full_secs,
        auto_repair = auto_repair,
        "periodic monitoring started"
    );
}

pub fn monitoring_stopped(tasks: usize) {
    tracing::info!(event = "monitoring_stopped", tasks = tasks, "periodic monitoring stopped");
}

pub fn auto_repair_applied(attempted: usize, successful: usize) {
    tracing::info!(
        event = "auto_repair_applied",
        attempted = attempted,
        successful = successful,
        "automated repairs applied"
    );
}

/// Log a trend transition away from stable.
pub fn trend_changed(direction: TrendDirection, recent: f64, previous: f64) {
    tracing::warn!(
        event = "health_trend_changed",
        direction = ?direction,
        recent_average = recent,
        previous_average = previous,
        "health trend changed"
    );
}
