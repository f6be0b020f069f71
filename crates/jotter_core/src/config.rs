//! Runtime configuration resolved from the environment.
//!
//! # Responsibility
//! - Resolve database path, storage key, logging and load policy settings.
//! - Keep defaults in one place for CLI and FFI front ends.
//!
//! # Invariants
//! - Blank environment values are treated as unset.
//! - Invalid values are rejected, never silently replaced by defaults.

use crate::logging::{default_log_level, normalize_level};
use crate::service::note_store::{LoadPolicy, StoreOptions, DEFAULT_STORAGE_KEY};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "JOTTER_DB_PATH";
pub const ENV_STORAGE_KEY: &str = "JOTTER_STORAGE_KEY";
pub const ENV_LOG_LEVEL: &str = "JOTTER_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "JOTTER_LOG_DIR";
pub const ENV_ON_CORRUPT: &str = "JOTTER_ON_CORRUPT";

const DEFAULT_DB_FILE_NAME: &str = "jotter.sqlite3";

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidLoadPolicy(String),
    InvalidLogLevel(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLoadPolicy(value) => write!(
                f,
                "invalid {ENV_ON_CORRUPT} value `{value}`; expected fail|reset"
            ),
            Self::InvalidLogLevel(value) => write!(
                f,
                "invalid {ENV_LOG_LEVEL} value `{value}`; expected trace|debug|info|warn|error"
            ),
        }
    }
}

impl Error for ConfigError {}

/// Resolved settings shared by front ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JotterConfig {
    /// SQLite file holding the key-value store.
    pub db_path: PathBuf,
    /// Key under which the note array is persisted.
    pub storage_key: String,
    /// Normalized log level.
    pub log_level: &'static str,
    /// File logging directory; logging stays off when `None`.
    pub log_dir: Option<PathBuf>,
    pub on_corrupt: LoadPolicy,
}

impl Default for JotterConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            log_level: default_log_level(),
            log_dir: None,
            on_corrupt: LoadPolicy::default(),
        }
    }
}

impl JotterConfig {
    /// Resolves configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves configuration through `lookup`, starting from defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(key) = read(ENV_STORAGE_KEY) {
            config.storage_key = key;
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level =
                normalize_level(&level).map_err(|_| ConfigError::InvalidLogLevel(level))?;
        }
        if let Some(dir) = read(ENV_LOG_DIR) {
            config.log_dir = Some(PathBuf::from(dir));
        }
        if let Some(policy) = read(ENV_ON_CORRUPT) {
            config.on_corrupt =
                LoadPolicy::parse(&policy).ok_or(ConfigError::InvalidLoadPolicy(policy))?;
        }
        Ok(config)
    }

    /// Store options derived from this configuration.
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            storage_key: self.storage_key.clone(),
            on_corrupt: self.on_corrupt,
        }
    }
}
