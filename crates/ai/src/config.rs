use std::path::{Path, PathBuf};

use ai_bt::UtilityConfig;
use ai_hsm::HsmConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tunables for a whole simulation.
///
/// ```yaml
/// seed: 42
/// utility:
///   bias_increase: 2.0
///   max_bias: 3.0
/// hsm:
///   submachine_entry: reset
/// ```
///
/// Every field is optional; missing ones keep their defaults.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Global seed for every per-agent random stream.
    pub seed: u64,
    pub utility: UtilityConfig,
    pub hsm: HsmConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config from {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    Parse(#[from] serde_yaml::Error),
}

impl AiConfig {
    pub fn from_yaml_str(src: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(src)?)
    }

    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }
}
