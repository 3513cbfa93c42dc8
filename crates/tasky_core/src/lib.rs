//! Core domain logic for Tasky.
//! This crate is the single source of truth for project-scoped persistence
//! and the invariants of every feature document.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod storage_key;
pub mod store;
pub mod workspace;

pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError, LoggingStatus};
pub use model::project::{Project, ProjectId};
pub use model::task::{Category, Lane, NewTask, Task, TaskId, TaskPatch, TaskPriority};
pub use repo::document_repo::LoadSource;
pub use service::kanban::{
    DragSession, DropOutcome, DropTarget, KanbanBoard, KanbanError, KanbanResult,
};
pub use service::project_registry::{ProjectError, ProjectPatch, ProjectRegistry, ProjectResult};
pub use service::save_policy::SavePolicy;
pub use service::scoped_document::ProjectScoped;
pub use storage_key::{BaseKey, BaseKeyError};
pub use store::{KvStore, MemoryKvStore, SqliteKvStore, StoreError, StoreResult};
pub use workspace::Workspace;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
