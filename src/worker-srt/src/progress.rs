//! Live progress of the ranking check job.
//!
//! The job is the only writer. Every publish replaces the whole snapshot, so readers never observe
//! a counter from one step next to a keyword label from another.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// How long a finished run keeps reporting `completed` before going back to `idle`.
pub const COMPLETED_WINDOW_S: i64 = 60;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerProgress {
    pub is_running: bool,
    pub total_keywords: usize,
    pub checked_keywords: usize,
    pub errors: usize,
    pub current_keyword: Option<String>,
    pub last_update: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerStatus {
    Idle,
    Running,
    Completed,
}

impl WorkerProgress {
    pub fn status_at(&self, now: DateTime<Utc>) -> WorkerStatus {
        if self.is_running {
            return WorkerStatus::Running;
        }
        match self.last_update {
            Some(at) if now - at <= chrono::Duration::seconds(COMPLETED_WINDOW_S) => WorkerStatus::Completed,
            _ => WorkerStatus::Idle,
        }
    }
}

/// Progress snapshot plus its derived status, as served to the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    #[serde(flatten)]
    pub progress: WorkerProgress,
    pub status: WorkerStatus,
}

#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    snapshot: Arc<RwLock<WorkerProgress>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> WorkerProgress {
        self.snapshot.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn report(&self) -> ProgressReport {
        let progress = self.snapshot();
        let status = progress.status_at(Utc::now());
        ProgressReport { progress, status }
    }

    /// Replaces the snapshot, stamping `last_update` with the current time.
    pub fn publish(&self, mut progress: WorkerProgress) {
        progress.last_update = Some(Utc::now());
        *self.snapshot.write().unwrap_or_else(|e| e.into_inner()) = progress;
    }

    /// Publishes a modified copy of the current snapshot.
    pub fn update(&self, change: impl FnOnce(&mut WorkerProgress)) {
        let mut next = self.snapshot();
        change(&mut next);
        self.publish(next);
    }
}
