//! Run outcome reporting

use chrono::{DateTime, Utc};
use serde::Serialize;

/// What happened to one queue entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    Sent { delivered: bool },
    /// Still pending, with a later attempt scheduled
    Retried,
    Failed,
    Suppressed,
}

/// Rows removed by the cleanup step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub queue_entries: u64,
    pub read_notifications: u64,
    pub expired_notifications: u64,
}

/// Counters for one processor run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub batches: u32,
    pub picked: u32,
    pub sent: u32,
    pub delivered: u32,
    pub retried: u32,
    pub failed: u32,
    pub suppressed: u32,
    /// Entries skipped after an unexpected error; they stay as they were
    pub errors: u32,
    /// Storage became unreachable; remaining entries stay pending
    pub aborted: bool,
    /// The run stopped picking entries because its time budget ran out
    pub budget_exhausted: bool,
    pub cleanup: Option<CleanupReport>,
}

impl RunReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            batches: 0,
            picked: 0,
            sent: 0,
            delivered: 0,
            retried: 0,
            failed: 0,
            suppressed: 0,
            errors: 0,
            aborted: false,
            budget_exhausted: false,
            cleanup: None,
        }
    }

    pub fn record(&mut self, outcome: EntryOutcome) {
        match outcome {
            EntryOutcome::Sent { delivered } => {
                self.sent += 1;
                if delivered {
                    self.delivered += 1;
                }
            }
            EntryOutcome::Retried => self.retried += 1,
            EntryOutcome::Failed => self.failed += 1,
            EntryOutcome::Suppressed => self.suppressed += 1,
        }
    }
}

/// Result of asking the processor to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Another run holds the lock; nothing was touched
    Skipped,
    Completed(RunReport),
}

impl RunOutcome {
    pub fn report(&self) -> Option<&RunReport> {
        match self {
            Self::Skipped => None,
            Self::Completed(report) => Some(report),
        }
    }
}
