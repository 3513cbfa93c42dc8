//! Markdown note model.

use crate::model::{now_epoch_ms, Record, RecordId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One markdown note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: RecordId,
    pub title: String,
    /// Raw markdown source.
    pub content: String,
    /// Plain-text summary derived from `content`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_text: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Note {
    /// Creates a note with a fresh id; `preview_text` is left for the caller.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            content: content.into(),
            preview_text: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Record for Note {
    fn record_id(&self) -> RecordId {
        self.id
    }
}

/// Partial note update; `None` keeps the field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
}
