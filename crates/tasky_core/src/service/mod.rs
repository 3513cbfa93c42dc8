//! Feature controllers and the persistence plumbing they share.
//!
//! # Responsibility
//! - Expose use-case level APIs per feature (kanban, notes, reminders,
//!   issues, graph) and the project registry.
//! - Keep callers decoupled from storage keys and save timing.

pub mod collection;
pub mod graph;
pub mod issues;
pub mod kanban;
pub mod notes;
pub mod project_registry;
pub mod reminders;
pub mod save_policy;
pub mod scoped_document;
