//! Issue tracker controller.

use crate::model::issue::{Issue, IssueFilter, IssuePatch, IssueStatus, NewIssue};
use crate::model::project::Project;
use crate::model::RecordId;
use crate::repo::document_repo::LoadSource;
use crate::service::collection::{CollectionError, CollectionResult, RecordCollection};
use crate::service::save_policy::SavePolicy;
use crate::service::scoped_document::ProjectScoped;
use crate::storage_key::BaseKey;
use crate::store::KvStore;
use log::info;
use std::cmp::Reverse;
use std::time::Instant;

pub const ISSUES_BASE_KEY: &str = "issues";
const MODULE: &str = "issues";

/// Issues of the active project, written on every change.
pub struct IssuesController<'s, S: KvStore + ?Sized> {
    issues: RecordCollection<'s, S, Issue>,
}

impl<'s, S: KvStore + ?Sized> IssuesController<'s, S> {
    pub fn open(store: &'s S, base_key: BaseKey, active: Option<&Project>) -> Self {
        Self {
            issues: RecordCollection::open(store, base_key, active, SavePolicy::Immediate, MODULE),
        }
    }

    /// Files a new open issue; the title must not be blank.
    pub fn create(&mut self, mut input: NewIssue) -> CollectionResult<Issue> {
        input.title = normalize_title(input.title)?;
        let issue = Issue::from_new(input);
        self.issues.insert(issue.clone())?;
        info!(
            "event=issue_create module={MODULE} status=ok issue_id={} priority={:?}",
            issue.id, issue.priority
        );
        Ok(issue)
    }

    pub fn update(&mut self, id: RecordId, mut patch: IssuePatch) -> CollectionResult<Issue> {
        if let Some(title) = patch.title.take() {
            patch.title = Some(normalize_title(title)?);
        }
        self.issues.update(id, |issue| {
            issue.apply(patch);
            issue.clone()
        })
    }

    pub fn set_status(&mut self, id: RecordId, status: IssueStatus) -> CollectionResult<Issue> {
        let issue = self.update(
            id,
            IssuePatch {
                status: Some(status),
                ..IssuePatch::default()
            },
        )?;
        info!("event=issue_status module={MODULE} status=ok issue_id={id} issue_status={status:?}");
        Ok(issue)
    }

    pub fn delete(&mut self, id: RecordId) -> CollectionResult<Issue> {
        self.issues.remove(id)
    }

    pub fn get(&self, id: RecordId) -> Option<&Issue> {
        self.issues.get(id)
    }

    pub fn list(&self) -> &[Issue] {
        self.issues.items()
    }

    pub fn filter(&self, filter: &IssueFilter) -> Vec<&Issue> {
        self.issues
            .items()
            .iter()
            .filter(|issue| filter.matches(issue))
            .collect()
    }

    /// Highest priority first; insertion order within one priority.
    pub fn sorted_by_priority(&self) -> Vec<&Issue> {
        let mut issues: Vec<&Issue> = self.issues.items().iter().collect();
        issues.sort_by_key(|issue| Reverse(issue.priority));
        issues
    }

    pub fn key(&self) -> &str {
        self.issues.key()
    }

    pub fn last_load(&self) -> LoadSource {
        self.issues.last_load()
    }

    pub fn reload(&mut self) {
        self.issues.reload();
    }
}

impl<S: KvStore + ?Sized> ProjectScoped for IssuesController<'_, S> {
    fn rescope(&mut self, active: Option<&Project>) {
        self.issues.rescope(active);
    }

    fn tick(&mut self, now: Instant) {
        self.issues.tick(now);
    }

    fn flush(&mut self) {
        self.issues.flush();
    }
}

fn normalize_title(title: String) -> CollectionResult<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(CollectionError::InvalidInput(
            "issue title must not be blank".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}
