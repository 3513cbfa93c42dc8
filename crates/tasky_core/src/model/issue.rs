//! Issue tracker model.
//!
//! # Invariants
//! - `updated_at >= created_at` for records written by this crate.

use crate::model::task::Category;
use crate::model::{now_epoch_ms, Record, RecordId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issue priority; unlike kanban tasks, issues may be `Critical`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssuePriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// Issue lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl IssueStatus {
    /// Whether the issue still needs work.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Open | Self::InProgress)
    }
}

/// One tracked issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: RecordId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: IssuePriority,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub status: IssueStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Record for Issue {
    fn record_id(&self) -> RecordId {
        self.id
    }
}

/// Caller input for creating an issue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewIssue {
    pub title: String,
    pub description: String,
    pub priority: IssuePriority,
    pub category: Category,
}

impl Issue {
    pub fn from_new(input: NewIssue) -> Self {
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            priority: input.priority,
            category: input.category,
            status: IssueStatus::Open,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merges `patch` and bumps `updated_at`.
    pub fn apply(&mut self, patch: IssuePatch) {
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
        if let Some(status) = patch.status {
            self.status = status;
        }
        self.updated_at = now_epoch_ms().max(self.created_at);
    }
}

/// Partial issue update; `None` keeps the field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssuePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<IssuePriority>,
    pub category: Option<Category>,
    pub status: Option<IssueStatus>,
}

/// Conjunctive filter over issues; `None` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueFilter {
    pub status: Option<IssueStatus>,
    pub priority: Option<IssuePriority>,
    pub category: Option<Category>,
    pub open_only: bool,
}

impl IssueFilter {
    pub fn matches(&self, issue: &Issue) -> bool {
        self.status.map_or(true, |status| issue.status == status)
            && self.priority.map_or(true, |priority| issue.priority == priority)
            && self.category.map_or(true, |category| issue.category == category)
            && (!self.open_only || issue.status.is_open())
    }
}
