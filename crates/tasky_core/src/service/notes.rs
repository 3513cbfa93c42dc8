//! Markdown note editor controller.
//!
//! # Responsibility
//! - Create, edit, delete and list notes of the active project.
//! - Derive `preview_text` from markdown on every content change.
//!
//! # Invariants
//! - `preview_text` always reflects the current `content`.
//! - Blank titles are stored as `DEFAULT_NOTE_TITLE`.

use crate::model::note::{Note, NotePatch};
use crate::model::project::Project;
use crate::model::{now_epoch_ms, RecordId};
use crate::repo::document_repo::LoadSource;
use crate::service::collection::{CollectionResult, RecordCollection};
use crate::service::save_policy::SavePolicy;
use crate::service::scoped_document::ProjectScoped;
use crate::storage_key::BaseKey;
use crate::store::KvStore;
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Instant;

/// Default base key for notes.
pub const NOTES_BASE_KEY: &str = "notes";
/// Title used when the caller leaves it blank.
pub const DEFAULT_NOTE_TITLE: &str = "Untitled note";
const PREVIEW_MAX_CHARS: usize = 100;
const MODULE: &str = "notes";

static MARKDOWN_IMAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[[^\]]*]\([^)]*\)").expect("valid image regex"));
static MARKDOWN_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").expect("valid link regex"));
static MARKDOWN_SYMBOL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\*_`#>~\-\[\]\(\)!|]+").expect("valid markdown symbol regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Notes of the active project.
pub struct NotesController<'s, S: KvStore + ?Sized> {
    notes: RecordCollection<'s, S, Note>,
}

impl<'s, S: KvStore + ?Sized> NotesController<'s, S> {
    pub fn open(
        store: &'s S,
        base_key: BaseKey,
        active: Option<&Project>,
        policy: SavePolicy,
    ) -> Self {
        Self {
            notes: RecordCollection::open(store, base_key, active, policy, MODULE),
        }
    }

    pub fn create(
        &mut self,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> CollectionResult<Note> {
        let mut note = Note::new(normalize_title(title.into()), content);
        note.preview_text = derive_preview_text(&note.content);
        self.notes.insert(note.clone())?;
        info!("event=note_create module={MODULE} status=ok note_id={}", note.id);
        Ok(note)
    }

    /// Applies `patch` and refreshes `updated_at` and the preview.
    pub fn update(&mut self, id: RecordId, patch: NotePatch) -> CollectionResult<Note> {
        self.notes.update(id, |note| {
            if let Some(title) = patch.title {
                note.title = normalize_title(title);
            }
            if let Some(content) = patch.content {
                note.preview_text = derive_preview_text(&content);
                note.content = content;
            }
            note.updated_at = now_epoch_ms().max(note.created_at);
            note.clone()
        })
    }

    pub fn delete(&mut self, id: RecordId) -> CollectionResult<Note> {
        let removed = self.notes.remove(id)?;
        info!("event=note_delete module={MODULE} status=ok note_id={id}");
        Ok(removed)
    }

    pub fn get(&self, id: RecordId) -> Option<&Note> {
        self.notes.get(id)
    }

    /// Notes in insertion order.
    pub fn list(&self) -> &[Note] {
        self.notes.items()
    }

    /// Notes sorted by `updated_at` descending, ties by id.
    pub fn list_recent(&self) -> Vec<&Note> {
        let mut notes: Vec<&Note> = self.notes.items().iter().collect();
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
        notes
    }

    /// Case-insensitive substring match over title and content.
    pub fn search(&self, text: &str) -> Vec<&Note> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return self.notes.items().iter().collect();
        }
        self.notes
            .items()
            .iter()
            .filter(|note| {
                note.title.to_lowercase().contains(&needle)
                    || note.content.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn key(&self) -> &str {
        self.notes.key()
    }

    pub fn last_load(&self) -> LoadSource {
        self.notes.last_load()
    }

    pub fn has_pending_save(&self) -> bool {
        self.notes.is_dirty()
    }

    pub fn reload(&mut self) {
        self.notes.reload();
    }
}

impl<S: KvStore + ?Sized> ProjectScoped for NotesController<'_, S> {
    fn rescope(&mut self, active: Option<&Project>) {
        self.notes.rescope(active);
    }

    fn tick(&mut self, now: Instant) {
        self.notes.tick(now);
    }

    fn flush(&mut self) {
        self.notes.flush();
    }
}

/// Plain-text summary of markdown `content`.
///
/// Images are dropped, links keep their label, markdown symbols and runs of
/// whitespace collapse to single spaces, and the first 100 chars are kept.
pub fn derive_preview_text(content: &str) -> Option<String> {
    let without_images = MARKDOWN_IMAGE_RE.replace_all(content, " ");
    let without_links = MARKDOWN_LINK_RE.replace_all(&without_images, "$1");
    let without_symbols = MARKDOWN_SYMBOL_RE.replace_all(&without_links, " ");
    let normalized = WHITESPACE_RE.replace_all(&without_symbols, " ");
    let trimmed = normalized.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.chars().take(PREVIEW_MAX_CHARS).collect())
    }
}

fn normalize_title(title: String) -> String {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        DEFAULT_NOTE_TITLE.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{derive_preview_text, normalize_title, DEFAULT_NOTE_TITLE};

    #[test]
    fn preview_keeps_link_labels_and_drops_images() {
        let preview =
            derive_preview_text("See [the docs](https://example.com) ![shot](a.png) now").unwrap();
        assert_eq!(preview, "See the docs now");
    }

    #[test]
    fn preview_strips_symbols_and_caps_length() {
        let source = format!("# Heading\n\n**{}**", "x".repeat(300));
        let preview = derive_preview_text(&source).unwrap();
        assert!(!preview.contains('#'));
        assert!(!preview.contains('*'));
        assert_eq!(preview.chars().count(), 100);
    }

    #[test]
    fn preview_of_symbol_only_content_is_none() {
        assert_eq!(derive_preview_text("## --- **"), None);
    }

    #[test]
    fn blank_title_falls_back_to_default() {
        assert_eq!(normalize_title("   ".to_string()), DEFAULT_NOTE_TITLE);
        assert_eq!(normalize_title(" Plan ".to_string()), "Plan");
    }
}
