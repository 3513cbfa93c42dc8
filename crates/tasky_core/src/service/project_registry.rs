//! Project registry: the list of namespaces and the active one.
//!
//! # Responsibility
//! - Create, update, delete and list projects.
//! - Track the active project and notify subscribers when it changes.
//!
//! # Invariants
//! - Project names are unique case-insensitively.
//! - The active project cannot be deleted.
//! - The project list and the active id are each rewritten whole on every
//!   mutation.
//! - An active id that matches no project loads as "no active project".

use crate::model::project::{normalize_name_key, Project, ProjectId, MAX_DESCRIPTION_CHARS};
use crate::repo::document_repo::{load_document, save_document_or_log};
use crate::store::KvStore;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Storage key of the serialized project list.
pub const PROJECTS_KEY: &str = "projects";
/// Storage key of the active project id; absent when none is active.
pub const ACTIVE_PROJECT_KEY: &str = "activeProjectId";
const MODULE: &str = "projects";

pub type ProjectResult<T> = Result<T, ProjectError>;

/// Rejected registry operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectError {
    /// Name is blank after trim.
    InvalidName,
    /// Another project already uses this name (case-insensitive).
    DuplicateName(String),
    /// Description exceeds `MAX_DESCRIPTION_CHARS`.
    DescriptionTooLong { chars: usize, max: usize },
    /// No project with this id.
    ProjectNotFound(ProjectId),
}

impl Display for ProjectError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "project name must not be blank"),
            Self::DuplicateName(name) => write!(f, "a project named `{name}` already exists"),
            Self::DescriptionTooLong { chars, max } => write!(
                f,
                "project description has {chars} characters, at most {max} allowed"
            ),
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
        }
    }
}

impl Error for ProjectError {}

/// Mutable project fields; name and id are fixed at creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPatch {
    /// New description; `None` clears it.
    pub description: Option<String>,
}

/// Handle returned by `ProjectRegistry::subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type ActiveProjectListener = Box<dyn FnMut(Option<&Project>)>;

/// Persistent project list plus active-project selection.
pub struct ProjectRegistry<'s, S: KvStore + ?Sized> {
    store: &'s S,
    projects: Vec<Project>,
    active_id: Option<ProjectId>,
    listeners: Vec<(SubscriptionId, ActiveProjectListener)>,
    next_subscription: u64,
}

impl<'s, S: KvStore + ?Sized> ProjectRegistry<'s, S> {
    /// Loads the registry; unreadable data degrades to an empty registry.
    pub fn load(store: &'s S) -> Self {
        let (projects, _): (Vec<Project>, _) = load_document(store, PROJECTS_KEY, MODULE);
        let active_id = load_active_id(store, &projects);
        info!(
            "event=projects_load module={MODULE} status=ok projects={} active={}",
            projects.len(),
            active_id.is_some()
        );
        Self {
            store,
            projects,
            active_id,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Projects in creation order.
    pub fn list(&self) -> &[Project] {
        &self.projects
    }

    pub fn get(&self, id: ProjectId) -> Option<&Project> {
        self.projects.iter().find(|project| project.id == id)
    }

    /// Case-insensitive lookup by name.
    pub fn find_by_name(&self, name: &str) -> Option<&Project> {
        let key = normalize_name_key(name);
        self.projects.iter().find(|project| project.name_key() == key)
    }

    pub fn active(&self) -> Option<&Project> {
        self.active_id.and_then(|id| self.get(id))
    }

    pub fn active_id(&self) -> Option<ProjectId> {
        self.active_id
    }

    /// Creates a project; it does not become active.
    pub fn create(
        &mut self,
        name: impl Into<String>,
        description: Option<String>,
    ) -> ProjectResult<Project> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ProjectError::InvalidName);
        }
        if self.find_by_name(trimmed).is_some() {
            warn!("event=project_create module={MODULE} status=rejected error_code=duplicate_name");
            return Err(ProjectError::DuplicateName(trimmed.to_string()));
        }
        let description = normalize_description(description)?;

        let project = Project::new(trimmed, description);
        self.projects.push(project.clone());
        self.persist_projects();
        info!(
            "event=project_create module={MODULE} status=ok project_id={}",
            project.id
        );
        Ok(project)
    }

    /// Switches the active project (`None` selects the global namespace)
    /// and notifies subscribers when the selection changed.
    pub fn set_active(&mut self, id: Option<ProjectId>) -> ProjectResult<()> {
        if let Some(id) = id {
            if self.get(id).is_none() {
                return Err(ProjectError::ProjectNotFound(id));
            }
        }
        if self.active_id == id {
            return Ok(());
        }

        self.active_id = id;
        self.persist_active();
        info!(
            "event=project_activate module={MODULE} status=ok project_id={}",
            id.map_or_else(|| "none".to_string(), |id| id.to_string())
        );
        self.notify();
        Ok(())
    }

    /// Deletes a project.
    ///
    /// Returns `false` and leaves the registry unchanged when `id` is the
    /// active project or unknown.
    pub fn delete(&mut self, id: ProjectId) -> bool {
        if self.active_id == Some(id) {
            warn!(
                "event=project_delete module={MODULE} status=rejected error_code=project_active project_id={id}"
            );
            return false;
        }
        let Some(index) = self.projects.iter().position(|project| project.id == id) else {
            return false;
        };
        self.projects.remove(index);
        self.persist_projects();
        info!("event=project_delete module={MODULE} status=ok project_id={id}");
        true
    }

    /// Updates the description of `id`.
    pub fn update(&mut self, id: ProjectId, patch: ProjectPatch) -> ProjectResult<Project> {
        let description = normalize_description(patch.description)?;
        let project = self
            .projects
            .iter_mut()
            .find(|project| project.id == id)
            .ok_or(ProjectError::ProjectNotFound(id))?;
        project.description = description;
        let updated = project.clone();
        self.persist_projects();
        Ok(updated)
    }

    /// Registers `listener` for active-project changes.
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(Option<&Project>) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener; returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(current, _)| *current != id);
        before != self.listeners.len()
    }

    fn notify(&mut self) {
        let active = self
            .active_id
            .and_then(|id| self.projects.iter().find(|project| project.id == id));
        for (_, listener) in self.listeners.iter_mut() {
            listener(active);
        }
    }

    fn persist_projects(&self) {
        save_document_or_log(self.store, PROJECTS_KEY, &self.projects, MODULE);
    }

    fn persist_active(&self) {
        let result = match self.active_id {
            Some(id) => self.store.set(ACTIVE_PROJECT_KEY, &id.to_string()),
            None => self.store.remove(ACTIVE_PROJECT_KEY),
        };
        if let Err(err) = result {
            error!(
                "event=project_activate module={MODULE} status=error error_code=store_write_failed key={ACTIVE_PROJECT_KEY} error={err}"
            );
        }
    }
}

fn load_active_id<S: KvStore + ?Sized>(store: &S, projects: &[Project]) -> Option<ProjectId> {
    let raw = match store.get(ACTIVE_PROJECT_KEY) {
        Ok(raw) => raw?,
        Err(err) => {
            warn!(
                "event=projects_load module={MODULE} status=error error_code=store_read_failed key={ACTIVE_PROJECT_KEY} error={err}"
            );
            return None;
        }
    };
    let id = match Uuid::parse_str(raw.trim()) {
        Ok(id) => id,
        Err(_) => {
            warn!("event=projects_load module={MODULE} status=error error_code=invalid_active_id");
            return None;
        }
    };
    if projects.iter().any(|project| project.id == id) {
        Some(id)
    } else {
        warn!(
            "event=projects_load module={MODULE} status=error error_code=unknown_active_id project_id={id}"
        );
        None
    }
}

fn normalize_description(description: Option<String>) -> ProjectResult<Option<String>> {
    let Some(description) = description else {
        return Ok(None);
    };
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let chars = trimmed.chars().count();
    if chars > MAX_DESCRIPTION_CHARS {
        return Err(ProjectError::DescriptionTooLong {
            chars,
            max: MAX_DESCRIPTION_CHARS,
        });
    }
    Ok(Some(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::normalize_description;

    #[test]
    fn blank_description_is_cleared() {
        assert_eq!(normalize_description(Some("   ".to_string())), Ok(None));
    }

    #[test]
    fn description_limit_counts_chars_not_bytes() {
        let fifty_umlauts = "ü".repeat(50);
        assert!(normalize_description(Some(fifty_umlauts)).is_ok());
        assert!(normalize_description(Some("x".repeat(51))).is_err());
    }
}
