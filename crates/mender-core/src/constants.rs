/// mender version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Schema errors kept per collection in a check report.
pub const MAX_SCHEMA_ERRORS_PER_COLLECTION: usize = 10;

/// Non-completed sessions older than this are stale.
pub const STALE_SESSION_HOURS: i64 = 24;

/// Mastery records not recalculated within this window are stale.
pub const STALE_MASTERY_DAYS: i64 = 7;

/// A perfect success rate on fewer attempts than this is suspicious.
pub const MIN_ATTEMPTS_FOR_PERFECT_RATE: u64 = 3;

/// Plausible attempt duration bounds, in seconds.
pub const MIN_ATTEMPT_SECS: f64 = 1.0;
pub const MAX_ATTEMPT_SECS: f64 = 4.0 * 3600.0;

/// Status string of a finished session.
pub const SESSION_COMPLETED: &str = "completed";
