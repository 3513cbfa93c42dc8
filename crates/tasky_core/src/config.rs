//! Core runtime configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config.

use crate::logging::{self, default_log_level, normalize_level, LoggingError};
use crate::service::kanban::KANBAN_BASE_KEY;
use crate::service::save_policy::SavePolicy;
use crate::storage_key::{BaseKey, BaseKeyError};
use crate::store::{SqliteKvStore, StoreResult};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_NOTES_DEBOUNCE_MS: u64 = 500;
const DEFAULT_GRAPH_AUTOSAVE_SECS: u64 = 10;

/// Configuration loading/validation failures.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config json: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

impl From<BaseKeyError> for ConfigError {
    fn from(value: BaseKeyError) -> Self {
        Self::Invalid(value.to_string())
    }
}

/// Tunables for logging, storage and save timers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute log directory; file logging is off when unset.
    pub log_dir: Option<PathBuf>,
    /// SQLite file; an in-memory store is used when unset.
    pub database_path: Option<PathBuf>,
    /// Quiet period before note edits are written.
    pub notes_debounce_ms: u64,
    /// Graph editor auto-save period.
    pub graph_autosave_secs: u64,
    /// Base key of the kanban board.
    pub kanban_board_key: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level().to_string(),
            log_dir: None,
            database_path: None,
            notes_debounce_ms: DEFAULT_NOTES_DEBOUNCE_MS,
            graph_autosave_secs: DEFAULT_GRAPH_AUTOSAVE_SECS,
            kanban_board_key: KANBAN_BASE_KEY.to_string(),
        }
    }
}

impl CoreConfig {
    /// Parses and validates a JSON config document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        normalize_level(&self.log_level).map_err(|err| ConfigError::Invalid(err.to_string()))?;
        if let Some(log_dir) = &self.log_dir {
            if !log_dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log_dir must be absolute, got `{}`",
                    log_dir.display()
                )));
            }
        }
        if self.graph_autosave_secs == 0 {
            return Err(ConfigError::Invalid(
                "graph_autosave_secs must be greater than 0".to_string(),
            ));
        }
        self.kanban_base_key()?;
        Ok(())
    }

    /// Notes write immediately when the debounce is zero.
    pub fn notes_save_policy(&self) -> SavePolicy {
        match self.notes_debounce_ms {
            0 => SavePolicy::Immediate,
            ms => SavePolicy::Debounced(Duration::from_millis(ms)),
        }
    }

    pub fn graph_autosave(&self) -> Duration {
        Duration::from_secs(self.graph_autosave_secs)
    }

    pub fn kanban_base_key(&self) -> Result<BaseKey, BaseKeyError> {
        BaseKey::new(self.kanban_board_key.as_str())
    }

    /// Starts file logging when `log_dir` is set; returns whether it did.
    pub fn init_logging(&self) -> Result<bool, LoggingError> {
        let Some(log_dir) = &self.log_dir else {
            return Ok(false);
        };
        logging::init_logging(&self.log_level, log_dir)?;
        Ok(true)
    }

    /// Opens the configured store: the database file, or memory when unset.
    pub fn open_store(&self) -> StoreResult<SqliteKvStore> {
        match &self.database_path {
            Some(path) => SqliteKvStore::open(path),
            None => SqliteKvStore::open_in_memory(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig};
    use crate::service::save_policy::SavePolicy;
    use std::time::Duration;

    #[test]
    fn empty_object_yields_defaults() {
        let config = CoreConfig::from_json_str("{}").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(
            config.notes_save_policy(),
            SavePolicy::Debounced(Duration::from_millis(500))
        );
        assert_eq!(config.graph_autosave(), Duration::from_secs(10));
    }

    #[test]
    fn zero_debounce_means_immediate() {
        let config = CoreConfig::from_json_str(r#"{"notes_debounce_ms": 0}"#).unwrap();
        assert_eq!(config.notes_save_policy(), SavePolicy::Immediate);
    }

    #[test]
    fn unknown_fields_and_bad_values_are_rejected() {
        assert!(matches!(
            CoreConfig::from_json_str(r#"{"colour": "red"}"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            CoreConfig::from_json_str(r#"{"log_level": "chatty"}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            CoreConfig::from_json_str(r#"{"kanban_board_key": "a::b"}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            CoreConfig::from_json_str(r#"{"graph_autosave_secs": 0}"#),
            Err(ConfigError::Invalid(_))
        ));
    }
}
