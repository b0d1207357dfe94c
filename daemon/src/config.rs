//! Daemon configuration with TOML file support.

use dao_client::ClientConfig;
use dao_types::GovernanceParams;
use dao_utils::LogFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("invalid config: {0}")]
    Parse(String),

    #[error("cannot serialize config: {0}")]
    Serialize(String),
}

/// Configuration for a daemon run.
///
/// Loaded from a TOML file via [`DaemonConfig::from_toml_file`]; every key
/// is optional. CLI flags and `DAO_*` environment variables override file
/// values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter, e.g. "info" or "warn,dao_governance=debug".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Engine parameters.
    #[serde(default)]
    pub governance: GovernanceParams,

    /// Confirmation polling and read-retry tuning.
    #[serde(default)]
    pub client: ClientConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            governance: GovernanceParams::default(),
            client: ClientConfig::default(),
        }
    }
}
