//! Configuration. Every section is optional in TOML; missing keys fall back to [`defaults`].

pub mod defaults;
mod monitoring_config;
mod observability_config;
mod reconstruction_config;
mod referential_config;
mod resilience_config;
mod storage_config;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{MenderError, MenderResult};

pub use monitoring_config::MonitoringConfig;
pub use observability_config::ObservabilityConfig;
pub use reconstruction_config::{MasteryTier, ReconstructionConfig};
pub use referential_config::ReferentialConfig;
pub use resilience_config::ResilienceConfig;
pub use storage_config::StorageConfig;

/// Root configuration for a mender engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MenderConfig {
    pub storage: StorageConfig,
    pub resilience: ResilienceConfig,
    pub referential: ReferentialConfig,
    pub reconstruction: ReconstructionConfig,
    pub monitoring: MonitoringConfig,
    pub observability: ObservabilityConfig,
}

impl MenderConfig {
    /// Parse a TOML document. An empty document yields the defaults.
    pub fn from_toml(toml_str: &str) -> MenderResult<Self> {
        toml::from_str(toml_str).map_err(|e| MenderError::Config {
            reason: e.to_string(),
        })
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: &Path) -> MenderResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| MenderError::Config {
            reason: format!("read {}: {e}", path.display()),
        })?;
        Self::from_toml(&content)
    }

    /// Serialize back to TOML.
    pub fn to_toml(&self) -> MenderResult<String> {
        toml::to_string(self).map_err(|e| MenderError::Config {
            reason: e.to_string(),
        })
    }
}
