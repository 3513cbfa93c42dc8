//! Process-wide logging bootstrap.
//!
//! # Responsibility
//! - Start rotating file logs once per process.
//! - Record panics in the log before the previous hook runs.
//!
//! # Invariants
//! - Repeating `init_logging` with the same level and directory is a no-op.
//! - Any other re-initialization fails with `LoggingError::Conflict`.
//! - Log lines carry metadata only (`event=... module=... status=...`),
//!   never task titles, note bodies or reminder texts.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::any::Any;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "tasky";
const ROTATE_AT_BYTES: u64 = 5 * 1024 * 1024;
const KEPT_LOG_FILES: usize = 4;
const PANIC_PAYLOAD_LIMIT: usize = 160;
const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

static ACTIVE_LOGGER: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

struct ActiveLogger {
    status: LoggingStatus,
    _handle: LoggerHandle,
}

/// Configuration the running logger was started with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingStatus {
    pub level: &'static str,
    pub log_dir: PathBuf,
}

/// Logging setup failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoggingError {
    UnsupportedLevel(String),
    InvalidDirectory(String),
    CreateDirectory { path: PathBuf, message: String },
    Backend(String),
    /// Already running with a different level or directory.
    Conflict { active: String, requested: String },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLevel(level) => {
                write!(f, "unknown log level `{level}`, use one of {}", LEVELS.join("|"))
            }
            Self::InvalidDirectory(message) => write!(f, "invalid log directory: {message}"),
            Self::CreateDirectory { path, message } => {
                write!(f, "cannot create `{}`: {message}", path.display())
            }
            Self::Backend(message) => write!(f, "logger backend failed: {message}"),
            Self::Conflict { active, requested } => {
                write!(f, "logger runs with {active}, cannot switch to {requested}")
            }
        }
    }
}

impl Error for LoggingError {}

/// Starts file logging at `level` into the absolute directory `log_dir`.
pub fn init_logging(level: &str, log_dir: impl AsRef<Path>) -> Result<(), LoggingError> {
    let requested = LoggingStatus {
        level: normalize_level(level)?,
        log_dir: checked_log_dir(log_dir.as_ref())?,
    };

    let active = ACTIVE_LOGGER.get_or_try_init(|| start_logger(&requested))?;
    active.status.accepts(&requested)
}

/// Running configuration, or `None` before `init_logging` succeeded.
pub fn logging_status() -> Option<LoggingStatus> {
    ACTIVE_LOGGER.get().map(|active| active.status.clone())
}

/// `debug` for debug builds, `info` for release builds.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

/// Maps user input (any case, `warning` alias) to a canonical level name.
pub fn normalize_level(level: &str) -> Result<&'static str, LoggingError> {
    let lowered = level.trim().to_ascii_lowercase();
    let wanted = match lowered.as_str() {
        "warning" => "warn",
        other => other,
    };
    LEVELS
        .iter()
        .copied()
        .find(|name| *name == wanted)
        .ok_or(LoggingError::UnsupportedLevel(lowered))
}

impl LoggingStatus {
    fn accepts(&self, requested: &LoggingStatus) -> Result<(), LoggingError> {
        if self.log_dir != requested.log_dir {
            return Err(LoggingError::Conflict {
                active: format!("directory `{}`", self.log_dir.display()),
                requested: format!("directory `{}`", requested.log_dir.display()),
            });
        }
        if self.level != requested.level {
            return Err(LoggingError::Conflict {
                active: format!("level `{}`", self.level),
                requested: format!("level `{}`", requested.level),
            });
        }
        Ok(())
    }
}

fn checked_log_dir(log_dir: &Path) -> Result<PathBuf, LoggingError> {
    if log_dir.as_os_str().is_empty() {
        return Err(LoggingError::InvalidDirectory("path is empty".to_string()));
    }
    if log_dir.is_relative() {
        return Err(LoggingError::InvalidDirectory(format!(
            "`{}` is not absolute",
            log_dir.display()
        )));
    }
    Ok(log_dir.to_path_buf())
}

fn start_logger(status: &LoggingStatus) -> Result<ActiveLogger, LoggingError> {
    std::fs::create_dir_all(&status.log_dir).map_err(|err| LoggingError::CreateDirectory {
        path: status.log_dir.clone(),
        message: err.to_string(),
    })?;

    let files = FileSpec::default()
        .directory(&status.log_dir)
        .basename(LOG_FILE_BASENAME);
    let handle = Logger::try_with_str(status.level)
        .and_then(|logger| {
            logger
                .log_to_file(files)
                .rotate(
                    Criterion::Size(ROTATE_AT_BYTES),
                    Naming::Numbers,
                    Cleanup::KeepLogFiles(KEPT_LOG_FILES),
                )
                .write_mode(WriteMode::BufferAndFlush)
                .append()
                .format_for_files(flexi_logger::detailed_format)
                .start()
        })
        .map_err(|err| LoggingError::Backend(err.to_string()))?;

    install_panic_hook();
    info!(
        "event=logging_init module=logging status=ok level={} os={} version={}",
        status.level,
        std::env::consts::OS,
        env!("CARGO_PKG_VERSION")
    );

    Ok(ActiveLogger {
        status: status.clone(),
        _handle: handle,
    })
}

fn install_panic_hook() {
    if PANIC_HOOK.set(()).is_err() {
        return;
    }

    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map_or_else(|| "unknown".to_string(), |loc| format!("{}:{}", loc.file(), loc.line()));
        error!(
            "event=panic module=logging status=error location={location} payload={}",
            single_line(&panic_payload(info.payload()), PANIC_PAYLOAD_LIMIT)
        );
        previous(info);
    }));
}

fn panic_payload(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "<non-string payload>".to_string()
    }
}

/// Replaces control characters with spaces and caps at `limit` chars.
fn single_line(value: &str, limit: usize) -> String {
    let mut chars = value
        .chars()
        .map(|ch| if ch.is_control() { ' ' } else { ch });
    let mut line: String = chars.by_ref().take(limit).collect();
    if chars.next().is_some() {
        line.push_str("...");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::{
        checked_log_dir, init_logging, logging_status, normalize_level, panic_payload,
        single_line, LoggingError,
    };
    use std::path::Path;

    #[test]
    fn levels_are_case_insensitive_and_accept_warning() {
        assert_eq!(normalize_level(" DEBUG ").unwrap(), "debug");
        assert_eq!(normalize_level("Warning").unwrap(), "warn");
        assert_eq!(
            normalize_level("loud"),
            Err(LoggingError::UnsupportedLevel("loud".to_string()))
        );
    }

    #[test]
    fn log_dir_must_be_absolute() {
        assert!(matches!(
            checked_log_dir(Path::new("logs/dev")),
            Err(LoggingError::InvalidDirectory(_))
        ));
        assert!(checked_log_dir(Path::new("")).is_err());
    }

    #[test]
    fn single_line_removes_breaks_and_caps_length() {
        assert_eq!(single_line("a\nb\rc", 10), "a b c");
        assert_eq!(single_line("abcdefghij", 4), "abcd...");
        assert_eq!(single_line("abcd", 4), "abcd");
    }

    #[test]
    fn panic_payload_reads_both_string_kinds() {
        let borrowed: Box<dyn std::any::Any + Send> = Box::new("static text");
        let owned: Box<dyn std::any::Any + Send> = Box::new(String::from("owned text"));
        let other: Box<dyn std::any::Any + Send> = Box::new(7_u8);

        assert_eq!(panic_payload(borrowed.as_ref()), "static text");
        assert_eq!(panic_payload(owned.as_ref()), "owned text");
        assert_eq!(panic_payload(other.as_ref()), "<non-string payload>");
    }

    #[test]
    fn repeated_init_is_accepted_but_changes_are_rejected() {
        let log_dir = tempfile::tempdir().unwrap();
        let other_dir = tempfile::tempdir().unwrap();

        init_logging("info", log_dir.path()).unwrap();
        init_logging("INFO", log_dir.path()).unwrap();

        assert!(matches!(
            init_logging("debug", log_dir.path()),
            Err(LoggingError::Conflict { .. })
        ));
        assert!(matches!(
            init_logging("info", other_dir.path()),
            Err(LoggingError::Conflict { .. })
        ));

        let status = logging_status().unwrap();
        assert_eq!(status.level, "info");
        assert_eq!(status.log_dir, log_dir.path());
    }
}
