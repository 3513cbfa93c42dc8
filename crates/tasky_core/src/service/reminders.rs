//! Sticky-note reminder board controller.

use crate::model::project::Project;
use crate::model::reminder::{Reminder, ReminderColor};
use crate::model::{Position, RecordId};
use crate::repo::document_repo::LoadSource;
use crate::service::collection::{CollectionError, CollectionResult, RecordCollection};
use crate::service::save_policy::SavePolicy;
use crate::service::scoped_document::ProjectScoped;
use crate::storage_key::BaseKey;
use crate::store::KvStore;
use log::info;
use std::time::Instant;

pub const REMINDERS_BASE_KEY: &str = "reminders";
const MODULE: &str = "reminders";

/// Reminders of the active project, written on every change.
pub struct RemindersController<'s, S: KvStore + ?Sized> {
    reminders: RecordCollection<'s, S, Reminder>,
}

impl<'s, S: KvStore + ?Sized> RemindersController<'s, S> {
    pub fn open(store: &'s S, base_key: BaseKey, active: Option<&Project>) -> Self {
        Self {
            reminders: RecordCollection::open(
                store,
                base_key,
                active,
                SavePolicy::Immediate,
                MODULE,
            ),
        }
    }

    /// Adds a reminder; `text` must not be blank.
    pub fn create(
        &mut self,
        text: impl Into<String>,
        color: ReminderColor,
    ) -> CollectionResult<Reminder> {
        let text = normalize_text(text.into())?;
        let reminder = Reminder::new(text, color);
        self.reminders.insert(reminder.clone())?;
        info!(
            "event=reminder_create module={MODULE} status=ok reminder_id={}",
            reminder.id
        );
        Ok(reminder)
    }

    pub fn update_text(
        &mut self,
        id: RecordId,
        text: impl Into<String>,
    ) -> CollectionResult<Reminder> {
        let text = normalize_text(text.into())?;
        self.reminders.update(id, |reminder| {
            reminder.text = text;
            reminder.clone()
        })
    }

    pub fn set_color(&mut self, id: RecordId, color: ReminderColor) -> CollectionResult<Reminder> {
        self.reminders.update(id, |reminder| {
            reminder.color = color;
            reminder.clone()
        })
    }

    /// Stores the drop position of a dragged sticky note.
    pub fn move_to(&mut self, id: RecordId, position: Position) -> CollectionResult<Reminder> {
        self.reminders.update(id, |reminder| {
            reminder.position = position;
            reminder.clone()
        })
    }

    /// Flips `done` and returns the new value.
    pub fn toggle_done(&mut self, id: RecordId) -> CollectionResult<bool> {
        self.reminders.update(id, |reminder| {
            reminder.done = !reminder.done;
            reminder.done
        })
    }

    pub fn delete(&mut self, id: RecordId) -> CollectionResult<Reminder> {
        self.reminders.remove(id)
    }

    /// Removes every completed reminder; returns how many.
    pub fn clear_done(&mut self) -> usize {
        let removed = self.reminders.remove_where(|reminder| reminder.done);
        if removed > 0 {
            info!("event=reminder_clear_done module={MODULE} status=ok removed={removed}");
        }
        removed
    }

    pub fn get(&self, id: RecordId) -> Option<&Reminder> {
        self.reminders.get(id)
    }

    pub fn list(&self) -> &[Reminder] {
        self.reminders.items()
    }

    pub fn pending(&self) -> impl Iterator<Item = &Reminder> {
        self.reminders.items().iter().filter(|reminder| !reminder.done)
    }

    pub fn key(&self) -> &str {
        self.reminders.key()
    }

    pub fn last_load(&self) -> LoadSource {
        self.reminders.last_load()
    }

    pub fn reload(&mut self) {
        self.reminders.reload();
    }
}

impl<S: KvStore + ?Sized> ProjectScoped for RemindersController<'_, S> {
    fn rescope(&mut self, active: Option<&Project>) {
        self.reminders.rescope(active);
    }

    fn tick(&mut self, now: Instant) {
        self.reminders.tick(now);
    }

    fn flush(&mut self) {
        self.reminders.flush();
    }
}

fn normalize_text(text: String) -> CollectionResult<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CollectionError::InvalidInput(
            "reminder text must not be blank".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}
