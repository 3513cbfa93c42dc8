//! Project-scoped storage key derivation.
//!
//! # Responsibility
//! - Turn a feature base key plus the active project into the key its
//!   collection is stored under.
//!
//! # Invariants
//! - With no active project the base key is returned unchanged.
//! - With an active project the key is `{base}::{project_uuid}`.
//! - Base keys never contain `::`, so the global namespace cannot collide
//!   with any project namespace and distinct projects cannot collide.

use crate::model::project::Project;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Separator between a base key and the project id.
pub const NAMESPACE_SEPARATOR: &str = "::";

/// Rejected base key input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseKeyError {
    Blank,
    ContainsSeparator(String),
}

impl Display for BaseKeyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blank => write!(f, "base key must not be blank"),
            Self::ContainsSeparator(value) => write!(
                f,
                "base key `{value}` must not contain `{NAMESPACE_SEPARATOR}`"
            ),
        }
    }
}

impl Error for BaseKeyError {}

/// Validated, project-independent root name of a feature's storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BaseKey(String);

impl BaseKey {
    pub fn new(value: impl Into<String>) -> Result<Self, BaseKeyError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(BaseKeyError::Blank);
        }
        if trimmed.contains(NAMESPACE_SEPARATOR) {
            return Err(BaseKeyError::ContainsSeparator(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Storage key for this base under `active`.
    pub fn resolve(&self, active: Option<&Project>) -> String {
        resolve(self, active)
    }

    /// Derives a child base key, e.g. one lane of a kanban board.
    pub fn child(&self, suffix: &str) -> Result<Self, BaseKeyError> {
        Self::new(format!("{}.{suffix}", self.0))
    }
}

impl Display for BaseKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolves the storage key for `base` in the namespace of `active`.
///
/// Pure and deterministic: controllers that never talk to each other still
/// agree on the same key.
pub fn resolve(base: &BaseKey, active: Option<&Project>) -> String {
    match active {
        None => base.0.clone(),
        Some(project) => format!("{}{NAMESPACE_SEPARATOR}{}", base.0, project.id.hyphenated()),
    }
}

#[cfg(test)]
mod tests {
    use super::{resolve, BaseKey, BaseKeyError};
    use crate::model::project::Project;

    fn base() -> BaseKey {
        BaseKey::new("notes").unwrap()
    }

    #[test]
    fn no_active_project_returns_base_unchanged() {
        assert_eq!(resolve(&base(), None), "notes");
    }

    #[test]
    fn project_key_differs_from_base_and_between_projects() {
        let first = Project::new("First", None);
        let second = Project::new("Second", None);

        let first_key = resolve(&base(), Some(&first));
        let second_key = resolve(&base(), Some(&second));

        assert_ne!(first_key, "notes");
        assert_ne!(first_key, second_key);
        assert_eq!(first_key, format!("notes::{}", first.id));
    }

    #[test]
    fn resolution_is_stable_across_calls() {
        let project = Project::new("Stable", None);
        assert_eq!(resolve(&base(), Some(&project)), resolve(&base(), Some(&project)));
    }

    #[test]
    fn base_key_rejects_blank_and_separator() {
        assert_eq!(BaseKey::new("   "), Err(BaseKeyError::Blank));
        assert!(matches!(
            BaseKey::new("notes::x"),
            Err(BaseKeyError::ContainsSeparator(_))
        ));
    }

    #[test]
    fn child_key_appends_suffix() {
        let lane = BaseKey::new("kanban").unwrap().child("todo").unwrap();
        assert_eq!(lane.as_str(), "kanban.todo");
    }
}
