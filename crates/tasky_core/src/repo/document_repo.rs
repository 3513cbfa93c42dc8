//! JSON document load/save helpers shared by all controllers.

use crate::store::{KvStore, StoreError};
use log::{debug, error, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type PersistResult<T> = Result<T, PersistError>;

/// Failure while writing a document.
#[derive(Debug)]
pub enum PersistError {
    Encode(serde_json::Error),
    Store(StoreError),
}

impl Display for PersistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode(err) => write!(f, "failed to encode document: {err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PersistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for PersistError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

impl From<StoreError> for PersistError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// How a load call obtained its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Decoded from stored data.
    Stored,
    /// Nothing stored under the key.
    Missing,
    /// Stored data could not be read or decoded; default substituted.
    Recovered,
}

/// Loads and decodes the document under `key`.
///
/// Never fails: a missing key yields `D::default()`, and a read or decode
/// failure is logged at `warn` and also yields `D::default()`.
pub fn load_document<S, D>(store: &S, key: &str, module: &'static str) -> (D, LoadSource)
where
    S: KvStore + ?Sized,
    D: DeserializeOwned + Default,
{
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!("event=doc_load module={module} status=missing key={key}");
            return (D::default(), LoadSource::Missing);
        }
        Err(err) => {
            warn!(
                "event=doc_load module={module} status=error error_code=store_read_failed key={key} error={err}"
            );
            return (D::default(), LoadSource::Recovered);
        }
    };

    match serde_json::from_str::<D>(&raw) {
        Ok(document) => {
            debug!(
                "event=doc_load module={module} status=ok key={key} bytes={}",
                raw.len()
            );
            (document, LoadSource::Stored)
        }
        Err(err) => {
            warn!(
                "event=doc_load module={module} status=error error_code=decode_failed key={key} error={err}"
            );
            (D::default(), LoadSource::Recovered)
        }
    }
}

/// Encodes `document` and overwrites `key`.
pub fn save_document<S, D>(store: &S, key: &str, document: &D) -> PersistResult<()>
where
    S: KvStore + ?Sized,
    D: Serialize + ?Sized,
{
    let encoded = serde_json::to_string(document)?;
    store.set(key, &encoded)?;
    Ok(())
}

/// `save_document` with the swallow-and-log write policy.
///
/// Returns whether the write landed.
pub fn save_document_or_log<S, D>(
    store: &S,
    key: &str,
    document: &D,
    module: &'static str,
) -> bool
where
    S: KvStore + ?Sized,
    D: Serialize + ?Sized,
{
    match save_document(store, key, document) {
        Ok(()) => {
            debug!("event=doc_save module={module} status=ok key={key}");
            true
        }
        Err(err) => {
            error!(
                "event=doc_save module={module} status=error error_code=store_write_failed key={key} error={err}"
            );
            false
        }
    }
}

/// Encodes several documents and writes them with one `set_many`.
///
/// Returns whether the write landed; failures are logged.
pub fn save_documents_atomic_or_log<S, D>(
    store: &S,
    documents: &[(String, &D)],
    module: &'static str,
) -> bool
where
    S: KvStore + ?Sized,
    D: Serialize + ?Sized,
{
    let encoded: Result<Vec<(String, String)>, serde_json::Error> = documents
        .iter()
        .map(|(key, document)| serde_json::to_string(document).map(|value| (key.clone(), value)))
        .collect();

    let result = encoded
        .map_err(PersistError::from)
        .and_then(|entries| store.set_many(&entries).map_err(PersistError::from));

    match result {
        Ok(()) => {
            debug!(
                "event=doc_save module={module} status=ok mode=atomic documents={}",
                documents.len()
            );
            true
        }
        Err(err) => {
            error!(
                "event=doc_save module={module} status=error mode=atomic error_code=store_write_failed error={err}"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{load_document, save_document, LoadSource};
    use crate::store::{KvStore, MemoryKvStore};

    #[test]
    fn missing_key_loads_default() {
        let store = MemoryKvStore::new();
        let (items, source): (Vec<u32>, _) = load_document(&store, "absent", "test");
        assert!(items.is_empty());
        assert_eq!(source, LoadSource::Missing);
    }

    #[test]
    fn corrupt_payload_loads_default_without_error() {
        let store = MemoryKvStore::new();
        store.set("numbers", "{not json").unwrap();
        let (items, source): (Vec<u32>, _) = load_document(&store, "numbers", "test");
        assert!(items.is_empty());
        assert_eq!(source, LoadSource::Recovered);
    }

    #[test]
    fn saved_document_loads_back() {
        let store = MemoryKvStore::new();
        save_document(&store, "numbers", &vec![3_u32, 1, 2]).unwrap();
        let (items, source): (Vec<u32>, _) = load_document(&store, "numbers", "test");
        assert_eq!(items, vec![3, 1, 2]);
        assert_eq!(source, LoadSource::Stored);
    }
}
