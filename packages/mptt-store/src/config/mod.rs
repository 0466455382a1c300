//! Store configuration
//!
//! Versioned YAML file plus environment overrides:
//!
//! ```yaml
//! version: 1
//! database:
//!   path: mptt.db          # or ":memory:"
//!   busy_timeout_ms: 5000
//! logging:
//!   level: info            # trace | debug | info | warn | error | off
//!   format: compact        # compact | json
//! ```
//!
//! Environment: `MPTT_DATABASE_PATH`, `MPTT_LOG_LEVEL` (applied last).

pub mod error;

pub use error::{ConfigError, ConfigResult};

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing_subscriber::filter::LevelFilter;

pub const SUPPORTED_VERSIONS: &[u32] = &[1];

pub const ENV_DATABASE_PATH: &str = "MPTT_DATABASE_PATH";
pub const ENV_LOG_LEVEL: &str = "MPTT_LOG_LEVEL";

/// Database connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct DatabaseConfig {
    /// SQLite file, or `:memory:`
    pub path: String,
    /// How long a writer waits for the database lock
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "mptt.db".to_string(),
            busy_timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

impl LoggingConfig {
    pub fn level_filter(&self) -> ConfigResult<LevelFilter> {
        self.level
            .parse::<LevelFilter>()
            .map_err(|_| ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                value: self.level.clone(),
                hint: "Use one of trace, debug, info, warn, error, off.".to_string(),
            })
    }
}

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFileV1 {
    #[serde(default)]
    version: Option<u32>,
    #[serde(default)]
    database: DatabaseConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

/// Complete runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

impl StoreConfig {
    /// Load and validate a YAML configuration file
    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let file: ConfigFileV1 = serde_yaml::from_str(content)?;

        let version = file.version.ok_or(ConfigError::MissingVersion)?;
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(ConfigError::UnsupportedVersion {
                found: version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }

        let config = Self {
            database: file.database,
            logging: file.logging,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        let file = ConfigFileV1 {
            version: Some(1),
            database: self.database.clone(),
            logging: self.logging.clone(),
        };
        Ok(serde_yaml::to_string(&file)?)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "database.path".to_string(),
                value: self.database.path.clone(),
                hint: "Give a file path or ':memory:'.".to_string(),
            });
        }
        if self.database.busy_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "database.busy_timeout_ms".to_string(),
                value: "0".to_string(),
                hint: "Must be at least 1.".to_string(),
            });
        }
        self.logging.level_filter()?;
        Ok(())
    }

    /// Apply `MPTT_DATABASE_PATH` / `MPTT_LOG_LEVEL` from the process environment
    pub fn apply_env_overrides(&mut self) -> ConfigResult<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    pub fn apply_overrides_from(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> ConfigResult<()> {
        if let Some(path) = lookup(ENV_DATABASE_PATH).filter(|p| !p.is_empty()) {
            self.database.path = path;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|l| !l.is_empty()) {
            self.logging.level = level;
        }
        self.validate()
    }
}
