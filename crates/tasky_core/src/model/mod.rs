//! Domain records persisted by feature controllers.
//!
//! # Responsibility
//! - Define the typed shapes stored under each feature key.
//! - Keep closed enumerations (lane, priority, category, ...) typed so that
//!   unknown stored values fail at the deserialization boundary.
//!
//! # Invariants
//! - Every record is identified by a stable uuid that is never reused.
//! - Wire field names are camelCase.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

pub mod graph;
pub mod issue;
pub mod note;
pub mod project;
pub mod reminder;
pub mod task;

/// Stable identifier shared by every flat collection record.
pub type RecordId = Uuid;

/// A record stored in a flat, id-keyed collection.
pub trait Record {
    fn record_id(&self) -> RecordId;
}

/// Canvas coordinates for reminders and graph nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Current wall-clock time in epoch milliseconds.
///
/// Clamps to 0 when the system clock reads earlier than the epoch.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
