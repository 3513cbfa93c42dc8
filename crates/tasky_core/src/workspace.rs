//! Explicit application context: registry plus every feature controller.
//!
//! # Responsibility
//! - Build all controllers scoped to the active project.
//! - Propagate active-project changes to every controller.
//! - Drive save timers and remove a deleted project's stored data.
//!
//! # Invariants
//! - All controllers always resolve keys against the same active project.
//! - Switching projects flushes pending saves to the old namespace first.
//!
//! The store is assumed to be written by this process only; after an
//! external write, call `reload_all`.

use crate::config::{ConfigError, CoreConfig};
use crate::model::project::{Project, ProjectId};
use crate::service::graph::{GraphController, GRAPH_BASE_KEY};
use crate::service::issues::{IssuesController, ISSUES_BASE_KEY};
use crate::service::kanban::KanbanBoard;
use crate::service::notes::{NotesController, NOTES_BASE_KEY};
use crate::service::project_registry::{
    ProjectPatch, ProjectRegistry, ProjectResult, SubscriptionId,
};
use crate::service::reminders::{RemindersController, REMINDERS_BASE_KEY};
use crate::service::scoped_document::ProjectScoped;
use crate::storage_key::{BaseKey, NAMESPACE_SEPARATOR};
use crate::store::KvStore;
use log::{error, info};
use std::time::Instant;

/// Registry and controllers sharing one store.
pub struct Workspace<'s, S: KvStore + ?Sized> {
    store: &'s S,
    registry: ProjectRegistry<'s, S>,
    notes: NotesController<'s, S>,
    reminders: RemindersController<'s, S>,
    issues: IssuesController<'s, S>,
    kanban: KanbanBoard<'s, S>,
    graph: GraphController<'s, S>,
}

impl<'s, S: KvStore + ?Sized> Workspace<'s, S> {
    /// Loads the registry and opens every controller for its active project.
    pub fn new(store: &'s S, config: &CoreConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let registry = ProjectRegistry::load(store);
        let active = registry.active().cloned();
        let active = active.as_ref();

        let notes = NotesController::open(
            store,
            BaseKey::new(NOTES_BASE_KEY)?,
            active,
            config.notes_save_policy(),
        );
        let reminders = RemindersController::open(store, BaseKey::new(REMINDERS_BASE_KEY)?, active);
        let issues = IssuesController::open(store, BaseKey::new(ISSUES_BASE_KEY)?, active);
        let kanban = KanbanBoard::open(store, &config.kanban_base_key()?, active)?;
        let graph = GraphController::open(
            store,
            BaseKey::new(GRAPH_BASE_KEY)?,
            active,
            config.graph_autosave(),
        );

        info!(
            "event=workspace_open module=workspace status=ok projects={} active={}",
            registry.list().len(),
            active.is_some()
        );
        Ok(Self {
            store,
            registry,
            notes,
            reminders,
            issues,
            kanban,
            graph,
        })
    }

    pub fn registry(&self) -> &ProjectRegistry<'s, S> {
        &self.registry
    }

    pub fn active_project(&self) -> Option<&Project> {
        self.registry.active()
    }

    pub fn create_project(
        &mut self,
        name: impl Into<String>,
        description: Option<String>,
    ) -> ProjectResult<Project> {
        self.registry.create(name, description)
    }

    pub fn update_project(&mut self, id: ProjectId, patch: ProjectPatch) -> ProjectResult<Project> {
        self.registry.update(id, patch)
    }

    /// Selects the active project and re-scopes every controller.
    pub fn set_active_project(&mut self, id: Option<ProjectId>) -> ProjectResult<()> {
        if self.registry.active_id() == id {
            return Ok(());
        }
        self.registry.set_active(id)?;
        let active = self.registry.active().cloned();
        self.rescope_all(active.as_ref());
        Ok(())
    }

    /// Deletes an inactive project and every key stored in its namespace.
    ///
    /// Returns `false` when the registry refused (active or unknown).
    pub fn delete_project(&mut self, id: ProjectId) -> bool {
        if !self.registry.delete(id) {
            return false;
        }
        self.purge_namespace(id);
        true
    }

    pub fn subscribe(
        &mut self,
        listener: impl FnMut(Option<&Project>) + 'static,
    ) -> SubscriptionId {
        self.registry.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.registry.unsubscribe(id)
    }

    pub fn notes(&self) -> &NotesController<'s, S> {
        &self.notes
    }

    pub fn notes_mut(&mut self) -> &mut NotesController<'s, S> {
        &mut self.notes
    }

    pub fn reminders(&self) -> &RemindersController<'s, S> {
        &self.reminders
    }

    pub fn reminders_mut(&mut self) -> &mut RemindersController<'s, S> {
        &mut self.reminders
    }

    pub fn issues(&self) -> &IssuesController<'s, S> {
        &self.issues
    }

    pub fn issues_mut(&mut self) -> &mut IssuesController<'s, S> {
        &mut self.issues
    }

    pub fn kanban(&self) -> &KanbanBoard<'s, S> {
        &self.kanban
    }

    pub fn kanban_mut(&mut self) -> &mut KanbanBoard<'s, S> {
        &mut self.kanban
    }

    pub fn graph(&self) -> &GraphController<'s, S> {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut GraphController<'s, S> {
        &mut self.graph
    }

    /// Advances every save timer to `now`.
    pub fn tick(&mut self, now: Instant) {
        self.notes.tick(now);
        self.reminders.tick(now);
        self.issues.tick(now);
        self.kanban.tick(now);
        self.graph.tick(now);
    }

    /// Writes every pending change, e.g. before shutdown.
    pub fn flush_all(&mut self) {
        self.notes.flush();
        self.reminders.flush();
        self.issues.flush();
        self.kanban.flush();
        self.graph.flush();
    }

    /// Drops in-memory state and reloads every controller from the store.
    pub fn reload_all(&mut self) {
        self.notes.reload();
        self.reminders.reload();
        self.issues.reload();
        self.kanban.reload();
        self.graph.reload();
    }

    fn rescope_all(&mut self, active: Option<&Project>) {
        self.notes.rescope(active);
        self.reminders.rescope(active);
        self.issues.rescope(active);
        self.kanban.rescope(active);
        self.graph.rescope(active);
    }

    fn purge_namespace(&self, id: ProjectId) {
        let suffix = format!("{NAMESPACE_SEPARATOR}{id}");
        let keys = match self.store.keys_with_prefix("") {
            Ok(keys) => keys,
            Err(err) => {
                error!(
                    "event=project_purge module=workspace status=error error_code=store_read_failed project_id={id} error={err}"
                );
                return;
            }
        };

        let mut removed = 0_usize;
        for key in keys.iter().filter(|key| key.ends_with(&suffix)) {
            match self.store.remove(key) {
                Ok(()) => removed += 1,
                Err(err) => error!(
                    "event=project_purge module=workspace status=error error_code=store_write_failed key={key} error={err}"
                ),
            }
        }
        info!("event=project_purge module=workspace status=ok project_id={id} removed_keys={removed}");
    }
}
