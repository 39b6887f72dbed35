//! Process configuration resolved from environment variables.
//!
//! # Responsibility
//! - Decide where the store lives and how logging is set up.
//!
//! # Invariants
//! - Blank variables count as unset.
//! - A configured log level is validated here, before logging starts.

use crate::logging::{default_log_level, init_logging, normalize_level, normalize_log_dir};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Database file path variable.
pub const ENV_DB_PATH: &str = "ACCESS_DB_PATH";
/// Log level variable (`trace|debug|info|warn|error`).
pub const ENV_LOG_LEVEL: &str = "ACCESS_LOG_LEVEL";
/// Absolute log directory variable. File logging is off when unset.
pub const ENV_LOG_DIR: &str = "ACCESS_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "access_registry.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidLogLevel(String),
    InvalidLogDir(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLogLevel(message) => write!(f, "{ENV_LOG_LEVEL}: {message}"),
            Self::InvalidLogDir(message) => write!(f, "{ENV_LOG_DIR}: {message}"),
        }
    }
}

impl Error for ConfigError {}

/// Resolved core configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: &'static str,
    pub log_dir: Option<PathBuf>,
}

impl CoreConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let db_path = read(ENV_DB_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));

        let log_level = match read(ENV_LOG_LEVEL) {
            Some(value) => normalize_level(&value).map_err(ConfigError::InvalidLogLevel)?,
            None => default_log_level(),
        };

        let log_dir = read(ENV_LOG_DIR)
            .map(|value| normalize_log_dir(&value).map_err(ConfigError::InvalidLogDir))
            .transpose()?;

        Ok(Self {
            db_path,
            log_level,
            log_dir,
        })
    }

    /// Starts file logging when a log directory is configured.
    ///
    /// Returns `Ok(false)` when logging stays off.
    pub fn init_logging(&self) -> Result<bool, String> {
        let Some(log_dir) = self.log_dir.as_ref() else {
            return Ok(false);
        };
        let log_dir = log_dir
            .to_str()
            .ok_or_else(|| format!("log_dir is not valid UTF-8: {}", log_dir.display()))?;
        init_logging(self.log_level, log_dir)?;
        Ok(true)
    }
}
