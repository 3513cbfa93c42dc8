//! Project namespace model.
//!
//! # Invariants
//! - `id` is stable and never reused; storage keys derive from it.
//! - `name` is non-blank and unique case-insensitively within a registry.
//! - `description`, when set, is at most `MAX_DESCRIPTION_CHARS` characters.

use crate::model::now_epoch_ms;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable project identifier.
pub type ProjectId = Uuid;

/// Upper bound for `Project::description`, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 50;

/// User-defined namespace isolating feature data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    /// Epoch milliseconds.
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Project {
    /// Builds a project with a fresh id and the current timestamp.
    ///
    /// Does not validate; `ProjectRegistry::create` is the checked entry point.
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: now_epoch_ms(),
            description,
        }
    }

    /// Case-insensitive comparison key for `name`.
    pub fn name_key(&self) -> String {
        normalize_name_key(&self.name)
    }
}

/// Normalizes a project name for uniqueness comparisons.
pub fn normalize_name_key(name: &str) -> String {
    name.trim().to_lowercase()
}
