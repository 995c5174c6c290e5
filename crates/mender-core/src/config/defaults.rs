// Single source of truth for all default values.

// --- Storage ---
pub const DEFAULT_DB_FILENAME: &str = "mender.db";
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5_000;
pub const DEFAULT_QUOTA_BYTES: u64 = 536_870_912; // 512 MB
pub const DEFAULT_BACKUP_RETENTION: usize = 10;

// --- Resilience ---
pub const DEFAULT_OPERATION_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_BASE_DELAY_MS: u64 = 100;
pub const DEFAULT_MAX_DELAY_MS: u64 = 5_000;
pub const DEFAULT_JITTER_RATIO: f64 = 0.3;
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
pub const DEFAULT_RESET_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_HALF_OPEN_MAX_ATTEMPTS: u32 = 3;

// --- Referential ---
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300; // 5 minutes
pub const DEFAULT_CACHE_CAPACITY: u64 = 256;
pub const DEFAULT_MAX_REPAIRS: usize = 100;

// --- Reconstruction ---
pub const DEFAULT_RECONSTRUCTION_HISTORY_LIMIT: usize = 25;
pub const DEFAULT_MASTERY_THRESHOLD: f64 = 0.80;
pub const DEFAULT_RELATIONSHIP_MIN_STRENGTH: f64 = 0.3;
pub const DEFAULT_EXPECTED_TIME_EASY_SECS: f64 = 900.0;
pub const DEFAULT_EXPECTED_TIME_MEDIUM_SECS: f64 = 1_800.0;
pub const DEFAULT_EXPECTED_TIME_HARD_SECS: f64 = 2_700.0;

// --- Monitoring ---
pub const DEFAULT_QUICK_INTERVAL_SECS: u64 = 300; // 5 minutes
pub const DEFAULT_FULL_INTERVAL_SECS: u64 = 86_400; // 24 hours
pub const DEFAULT_AUTO_REPAIR: bool = false;
pub const DEFAULT_CHECK_HISTORY_LIMIT: usize = 100;
pub const DEFAULT_TREND_WINDOW: usize = 5;
pub const DEFAULT_TREND_THRESHOLD: f64 = 2.0;
pub const DEFAULT_QUICK_SAMPLE_SIZE: usize = 10;

// --- Observability ---
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_JSON_LOGS: bool = true;
