use serde::{Deserialize, Serialize};

use super::defaults;

/// Referential integrity checker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferentialConfig {
    /// Result cache time-to-live in seconds.
    pub cache_ttl_secs: u64,
    /// Maximum cached scan results.
    pub cache_capacity: u64,
    /// Upper bound on repairs applied by one `execute_repairs` call.
    pub max_repairs: usize,
}

impl Default for ReferentialConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: defaults::DEFAULT_CACHE_TTL_SECS,
            cache_capacity: defaults::DEFAULT_CACHE_CAPACITY,
            max_repairs: defaults::DEFAULT_MAX_REPAIRS,
        }
    }
}
