//! SQLite bootstrap for the durable key-value store.
//!
//! # Responsibility
//! - Open connections for `SqliteKvStore` and bring their schema up to date.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`.
//! - No key-value reads or writes happen before migrations succeed.
//! - A failed upgrade leaves the previous schema version in place.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failures while opening or upgrading the key-value database.
#[derive(Debug)]
pub enum DbError {
    /// The connection itself could not be established.
    Open {
        target: String,
        source: rusqlite::Error,
    },
    /// Migration `version` failed and the upgrade was rolled back.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
    /// The database was written by a newer build.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    Sqlite(rusqlite::Error),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { target, source } => write!(f, "cannot open store `{target}`: {source}"),
            Self::Migration { version, source } => {
                write!(f, "store migration {version} failed: {source}")
            }
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "store schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::Sqlite(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } | Self::Migration { source, .. } => Some(source),
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
