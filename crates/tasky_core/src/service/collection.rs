//! Flat, id-keyed record collections (notes, reminders, issues).
//!
//! # Invariants
//! - Insertion order is the stored and default display order.
//! - Record ids are unique within one collection.

use crate::model::project::Project;
use crate::model::{Record, RecordId};
use crate::repo::document_repo::LoadSource;
use crate::service::save_policy::SavePolicy;
use crate::service::scoped_document::ScopedDocument;
use crate::storage_key::BaseKey;
use crate::store::KvStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type CollectionResult<T> = Result<T, CollectionError>;

/// Errors from collection mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    /// No record with this id in the active namespace.
    NotFound(RecordId),
    /// A record with this id already exists.
    DuplicateId(RecordId),
    /// Caller input failed validation.
    InvalidInput(String),
}

impl Display for CollectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::DuplicateId(id) => write!(f, "record already exists: {id}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
        }
    }
}

impl Error for CollectionError {}

/// A `Vec<T>` document with record-level CRUD.
pub struct RecordCollection<'s, S: KvStore + ?Sized, T> {
    inner: ScopedDocument<'s, S, Vec<T>>,
}

impl<'s, S, T> RecordCollection<'s, S, T>
where
    S: KvStore + ?Sized,
    T: Record + Serialize + DeserializeOwned,
{
    pub fn open(
        store: &'s S,
        base_key: BaseKey,
        active: Option<&Project>,
        policy: SavePolicy,
        module: &'static str,
    ) -> Self {
        Self {
            inner: ScopedDocument::open(store, base_key, active, policy, module),
        }
    }

    pub fn items(&self) -> &[T] {
        self.inner.document()
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    pub fn get(&self, id: RecordId) -> Option<&T> {
        self.items().iter().find(|item| item.record_id() == id)
    }

    /// Appends `record`; rejects an id already present.
    pub fn insert(&mut self, record: T) -> CollectionResult<RecordId> {
        let id = record.record_id();
        self.inner.try_mutate(|items| {
            if items.iter().any(|item| item.record_id() == id) {
                return Err(CollectionError::DuplicateId(id));
            }
            items.push(record);
            Ok(id)
        })
    }

    /// Applies `change` to the record with `id` and returns its new value.
    pub fn update<R>(
        &mut self,
        id: RecordId,
        change: impl FnOnce(&mut T) -> R,
    ) -> CollectionResult<R> {
        self.inner.try_mutate(|items| {
            let item = items
                .iter_mut()
                .find(|item| item.record_id() == id)
                .ok_or(CollectionError::NotFound(id))?;
            Ok(change(item))
        })
    }

    /// Removes and returns the record with `id`.
    pub fn remove(&mut self, id: RecordId) -> CollectionResult<T> {
        self.inner.try_mutate(|items| {
            let index = items
                .iter()
                .position(|item| item.record_id() == id)
                .ok_or(CollectionError::NotFound(id))?;
            Ok(items.remove(index))
        })
    }

    /// Removes every record matching `predicate`; returns how many.
    pub fn remove_where(&mut self, predicate: impl Fn(&T) -> bool) -> usize {
        if !self.items().iter().any(&predicate) {
            return 0;
        }
        self.inner.mutate(|items| {
            let before = items.len();
            items.retain(|item| !predicate(item));
            before - items.len()
        })
    }

    pub fn key(&self) -> &str {
        self.inner.key()
    }

    pub fn last_load(&self) -> LoadSource {
        self.inner.last_load()
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.is_dirty()
    }

    pub fn reload(&mut self) {
        self.inner.reload();
    }

    pub fn rescope(&mut self, active: Option<&Project>) {
        self.inner.rescope(active);
    }

    pub fn tick(&mut self, now: Instant) -> bool {
        self.inner.tick(now)
    }

    pub fn flush(&mut self) -> bool {
        self.inner.flush()
    }
}
