//! Project-scoped document holder shared by every feature controller.
//!
//! # Responsibility
//! - Own one feature document for the active project.
//! - Resolve the storage key, load, and write back per `SavePolicy`.
//!
//! # Invariants
//! - On rescope, pending changes are flushed to the old key before the new
//!   key is loaded; the old document is then discarded, never merged.
//! - Load never fails (see `load_document`); write failures are logged.

use crate::model::project::Project;
use crate::repo::document_repo::{load_document, save_document_or_log, LoadSource};
use crate::service::save_policy::{SavePolicy, SaveScheduler};
use crate::storage_key::BaseKey;
use crate::store::KvStore;
use log::info;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Instant;

/// Lifecycle hooks the workspace drives on every controller.
pub trait ProjectScoped {
    /// Re-resolves storage keys for `active` and reloads.
    fn rescope(&mut self, active: Option<&Project>);
    /// Writes pending changes whose save timer elapsed by `now`.
    ///
    /// Changes made through `mutate`/`try_mutate` are stamped with
    /// `Instant::now()`, so `now` must come from the same clock.
    fn tick(&mut self, now: Instant);
    /// Writes pending changes regardless of timers.
    fn flush(&mut self);
}

/// One feature document bound to a store and a project namespace.
pub struct ScopedDocument<'s, S: KvStore + ?Sized, D> {
    store: &'s S,
    base_key: BaseKey,
    key: String,
    module: &'static str,
    document: D,
    scheduler: SaveScheduler,
    last_load: LoadSource,
}

impl<'s, S, D> ScopedDocument<'s, S, D>
where
    S: KvStore + ?Sized,
    D: Serialize + DeserializeOwned + Default,
{
    /// Binds to `base_key` under `active` and loads the stored document.
    pub fn open(
        store: &'s S,
        base_key: BaseKey,
        active: Option<&Project>,
        policy: SavePolicy,
        module: &'static str,
    ) -> Self {
        let key = base_key.resolve(active);
        let (document, last_load) = load_document(store, &key, module);
        Self {
            store,
            base_key,
            key,
            module,
            document,
            scheduler: SaveScheduler::new(policy, Instant::now()),
            last_load,
        }
    }

    /// Storage key currently in use.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn base_key(&self) -> &BaseKey {
        &self.base_key
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn last_load(&self) -> LoadSource {
        self.last_load
    }

    pub fn is_dirty(&self) -> bool {
        self.scheduler.is_dirty()
    }

    pub fn policy(&self) -> SavePolicy {
        self.scheduler.policy()
    }

    /// Applies `change`; on `Ok` the document is marked dirty and, under
    /// `SavePolicy::Immediate`, written before returning.
    pub fn try_mutate<R, E>(
        &mut self,
        change: impl FnOnce(&mut D) -> Result<R, E>,
    ) -> Result<R, E> {
        self.try_mutate_at(Instant::now(), change)
    }

    /// `try_mutate` with the change stamped at `now` instead of the wall clock.
    pub fn try_mutate_at<R, E>(
        &mut self,
        now: Instant,
        change: impl FnOnce(&mut D) -> Result<R, E>,
    ) -> Result<R, E> {
        let output = change(&mut self.document)?;
        self.after_change(now);
        Ok(output)
    }

    /// Infallible form of `try_mutate`.
    pub fn mutate<R>(&mut self, change: impl FnOnce(&mut D) -> R) -> R {
        self.mutate_at(Instant::now(), change)
    }

    pub fn mutate_at<R>(&mut self, now: Instant, change: impl FnOnce(&mut D) -> R) -> R {
        let output = change(&mut self.document);
        self.after_change(now);
        output
    }

    /// Writes if the save timer elapsed; returns whether a write happened.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.scheduler.is_due(now) {
            return false;
        }
        self.write(now);
        true
    }

    /// Writes pending changes now; returns whether a write happened.
    pub fn flush(&mut self) -> bool {
        if !self.scheduler.is_dirty() {
            return false;
        }
        self.write(Instant::now());
        true
    }

    /// Switches to the namespace of `active`.
    pub fn rescope(&mut self, active: Option<&Project>) {
        self.flush();
        let next_key = self.base_key.resolve(active);
        info!(
            "event=doc_rescope module={} status=ok from_key={} to_key={}",
            self.module, self.key, next_key
        );
        self.key = next_key;
        self.reload();
    }

    /// Discards in-memory state and reloads from the current key.
    ///
    /// Used after the store was changed by someone else.
    pub fn reload(&mut self) {
        let (document, source) = load_document(self.store, &self.key, self.module);
        self.document = document;
        self.last_load = source;
        self.scheduler.clear(Instant::now());
    }

    fn after_change(&mut self, now: Instant) {
        if self.scheduler.record_change(now) {
            self.write(now);
        }
    }

    fn write(&mut self, now: Instant) {
        // Last write wins; a failed write is not retried.
        save_document_or_log(self.store, &self.key, &self.document, self.module);
        self.scheduler.mark_saved(now);
    }
}

#[cfg(test)]
mod tests {
    use super::ScopedDocument;
    use crate::service::save_policy::SavePolicy;
    use crate::storage_key::BaseKey;
    use crate::store::{KvStore, MemoryKvStore};
    use std::convert::Infallible;
    use std::time::{Duration, Instant};

    fn open(
        store: &MemoryKvStore,
        policy: SavePolicy,
    ) -> ScopedDocument<'_, MemoryKvStore, Vec<u32>> {
        ScopedDocument::open(store, BaseKey::new("numbers").unwrap(), None, policy, "test")
    }

    #[test]
    fn debounce_measures_from_the_callers_clock() {
        let store = MemoryKvStore::new();
        let mut doc = open(&store, SavePolicy::Debounced(Duration::from_millis(500)));
        let start = Instant::now() + Duration::from_secs(60);

        doc.mutate_at(start, |numbers| numbers.push(1));
        assert!(!doc.tick(start + Duration::from_millis(100)));
        assert_eq!(store.get("numbers").unwrap(), None);

        let later = start + Duration::from_millis(300);
        let pushed: Result<(), Infallible> = doc.try_mutate_at(later, |numbers| {
            numbers.push(2);
            Ok(())
        });
        pushed.unwrap();
        assert!(!doc.tick(start + Duration::from_millis(700)));
        assert!(doc.tick(start + Duration::from_millis(800)));
        assert_eq!(store.get("numbers").unwrap().as_deref(), Some("[1,2]"));
        assert!(!doc.is_dirty());
    }

    #[test]
    fn failed_change_leaves_document_clean() {
        let store = MemoryKvStore::new();
        let mut doc = open(&store, SavePolicy::Immediate);

        let refused: Result<(), &str> = doc.try_mutate(|_| Err("rejected"));
        assert_eq!(refused, Err("rejected"));
        assert!(!doc.is_dirty());
        assert_eq!(store.get("numbers").unwrap(), None);

        doc.mutate(|numbers| numbers.push(7));
        assert_eq!(store.get("numbers").unwrap().as_deref(), Some("[7]"));
    }
}
