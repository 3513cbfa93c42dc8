//! Sticky-note reminder model.

use crate::model::{now_epoch_ms, Position, Record, RecordId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sticky-note paper colors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderColor {
    #[default]
    Yellow,
    Pink,
    Blue,
    Green,
    Purple,
}

/// One sticky note on the reminder board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: RecordId,
    pub text: String,
    #[serde(default)]
    pub color: ReminderColor,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub done: bool,
    pub created_at: i64,
}

impl Reminder {
    pub fn new(text: impl Into<String>, color: ReminderColor) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            color,
            position: Position::default(),
            done: false,
            created_at: now_epoch_ms(),
        }
    }
}

impl Record for Reminder {
    fn record_id(&self) -> RecordId {
        self.id
    }
}
