//! When a controller writes its in-memory state back to storage.
//!
//! Time only advances through the `now` arguments, so timers are driven by
//! the caller's event loop (or by tests) instead of background threads.

use std::time::{Duration, Instant};

/// Write-back strategy for one controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavePolicy {
    /// Write after every mutation.
    Immediate,
    /// Write once no mutation happened for the given quiet period.
    Debounced(Duration),
    /// Write dirty state at most once per period.
    Interval(Duration),
}

/// Dirty tracking for one `SavePolicy`.
#[derive(Debug, Clone)]
pub struct SaveScheduler {
    policy: SavePolicy,
    last_change: Option<Instant>,
    last_save: Instant,
}

impl SaveScheduler {
    pub fn new(policy: SavePolicy, now: Instant) -> Self {
        Self {
            policy,
            last_change: None,
            last_save: now,
        }
    }

    pub fn policy(&self) -> SavePolicy {
        self.policy
    }

    pub fn is_dirty(&self) -> bool {
        self.last_change.is_some()
    }

    /// Records a mutation; returns `true` when it must be written right away.
    pub fn record_change(&mut self, now: Instant) -> bool {
        self.last_change = Some(now);
        matches!(self.policy, SavePolicy::Immediate)
    }

    /// Whether pending changes should be written at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        let Some(last_change) = self.last_change else {
            return false;
        };
        match self.policy {
            SavePolicy::Immediate => true,
            SavePolicy::Debounced(quiet) => now.saturating_duration_since(last_change) >= quiet,
            SavePolicy::Interval(period) => now.saturating_duration_since(self.last_save) >= period,
        }
    }

    pub fn mark_saved(&mut self, now: Instant) {
        self.last_change = None;
        self.last_save = now;
    }

    /// Drops pending state without saving, e.g. after a reload.
    pub fn clear(&mut self, now: Instant) {
        self.mark_saved(now);
    }
}

#[cfg(test)]
mod tests {
    use super::{SavePolicy, SaveScheduler};
    use std::time::{Duration, Instant};

    #[test]
    fn immediate_policy_requests_write_on_change() {
        let now = Instant::now();
        let mut scheduler = SaveScheduler::new(SavePolicy::Immediate, now);
        assert!(scheduler.record_change(now));
    }

    #[test]
    fn debounce_restarts_on_each_change() {
        let start = Instant::now();
        let quiet = Duration::from_millis(500);
        let mut scheduler = SaveScheduler::new(SavePolicy::Debounced(quiet), start);

        assert!(!scheduler.record_change(start));
        let later = start + Duration::from_millis(400);
        scheduler.record_change(later);

        assert!(!scheduler.is_due(start + Duration::from_millis(600)));
        assert!(scheduler.is_due(later + quiet));
    }

    #[test]
    fn interval_counts_from_last_save() {
        let start = Instant::now();
        let period = Duration::from_secs(10);
        let mut scheduler = SaveScheduler::new(SavePolicy::Interval(period), start);

        assert!(!scheduler.is_due(start + period), "clean state is never due");
        scheduler.record_change(start + Duration::from_secs(9));
        assert!(scheduler.is_due(start + period));

        scheduler.mark_saved(start + period);
        assert!(!scheduler.is_dirty());
    }
}
