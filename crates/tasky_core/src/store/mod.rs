//! Key-value persistence contract shared by every feature.
//!
//! # Responsibility
//! - Define the synchronous string-to-string store every controller writes to.
//! - Provide one durable (SQLite) and one ephemeral (in-memory) backend.
//!
//! # Invariants
//! - Values are opaque strings; callers own (de)serialization.
//! - `set_many` is all-or-nothing per backend guarantees.
//! - No transactional guarantee exists across separate `set` calls.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;
mod sqlite;

pub use memory::MemoryKvStore;
pub use sqlite::SqliteKvStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure reported by a key-value backend.
#[derive(Debug)]
pub enum StoreError {
    /// SQLite transport or bootstrap error.
    Db(DbError),
    /// Connection is open but the `kv_entries` table is missing.
    MissingTable(&'static str),
    /// Failure from a non-SQLite backend.
    Backend(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::MissingTable(table) => write!(f, "key-value store requires table `{table}`"),
            Self::Backend(message) => write!(f, "key-value backend failure: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::MissingTable(_) | Self::Backend(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Synchronous key-value store, the local-storage analog.
pub trait KvStore {
    /// Returns the raw value under `key`, `None` when absent.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    /// Overwrites the value under `key`.
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
    /// Removes `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> StoreResult<()>;
    /// Writes every entry atomically: either all land or none do.
    fn set_many(&self, entries: &[(String, String)]) -> StoreResult<()>;
    /// Lists stored keys starting with `prefix`, sorted ascending.
    fn keys_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>>;
}
