//! Kanban task model.
//!
//! # Invariants
//! - A task id appears in exactly one lane at a time.
//! - Lane order is display order.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable kanban task identifier.
pub type TaskId = Uuid;

/// Fixed kanban stages, in scan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Lane {
    #[serde(rename = "TODO")]
    Todo,
    #[serde(rename = "IN-PROGRESS")]
    InProgress,
    #[serde(rename = "PARKED")]
    Parked,
    #[serde(rename = "DONE")]
    Done,
}

impl Lane {
    /// All lanes in lookup order: TODO, IN-PROGRESS, PARKED, DONE.
    pub const ALL: [Lane; 4] = [Lane::Todo, Lane::InProgress, Lane::Parked, Lane::Done];

    /// Position of this lane in `Lane::ALL`.
    pub fn index(self) -> usize {
        match self {
            Self::Todo => 0,
            Self::InProgress => 1,
            Self::Parked => 2,
            Self::Done => 3,
        }
    }

    /// Lowercase storage suffix used to build per-lane base keys.
    pub fn slug(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::Parked => "parked",
            Self::Done => "done",
        }
    }
}

impl Display for Lane {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Todo => "TODO",
            Self::InProgress => "IN-PROGRESS",
            Self::Parked => "PARKED",
            Self::Done => "DONE",
        };
        f.write_str(label)
    }
}

/// Kanban priority scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

/// Work category shared by kanban tasks and issues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Art,
    Code,
    Design,
    Audio,
    #[default]
    Other,
}

/// One kanban card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub category: Category,
}

/// Caller input for `KanbanBoard::add_task`; the id is assigned by the board.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
    pub category: Category,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Partial update merged into an existing task; `None` keeps the field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub category: Option<Category>,
}

impl Task {
    pub(crate) fn from_new(input: NewTask) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            priority: input.priority,
            category: input.category,
        }
    }

    /// Merges every `Some` field of `patch` into this task.
    pub fn apply(&mut self, patch: TaskPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
    }
}
