//! The ranking check job.
//!
//! One run walks every keyword once, least recently checked first, sequentially:
//! look the rank up (with retries), persist it, publish progress, wait, next.
//! A failed keyword is counted and skipped; a failing keyword store ends the run.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use core_srt::{CheckOutcome, RankLookup, RankQuery, lookup_with_retry};
use data_model_srt::{KeywordStore, StoreError};
use serde::Serialize;
use tokio::sync::watch;

use crate::config::CheckConfig;
use crate::errors::Error;
use crate::progress::{ProgressReporter, WorkerProgress};

/// Counts of a finished (or cancelled) run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckSummary {
    pub total: usize,
    pub checked: usize,
    pub errors: usize,
    pub cancelled: bool,
}

/// Proof that the holder owns the job's single run slot. Dropping it frees the slot.
#[derive(Debug)]
pub struct RunGuard {
    running: Arc<AtomicBool>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

pub struct RankingCheckJob {
    store: Arc<dyn KeywordStore>,
    lookup: Arc<dyn RankLookup>,
    progress: ProgressReporter,
    config: CheckConfig,
    running: Arc<AtomicBool>,
    cancel: watch::Sender<bool>,
}

impl RankingCheckJob {
    pub fn new(
        store: Arc<dyn KeywordStore>,
        lookup: Arc<dyn RankLookup>,
        progress: ProgressReporter,
        config: CheckConfig,
    ) -> Self {
        let (cancel, _) = watch::channel(false);
        Self {
            store,
            lookup,
            progress,
            config,
            running: Arc::new(AtomicBool::new(false)),
            cancel,
        }
    }

    pub fn progress(&self) -> &ProgressReporter {
        &self.progress
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Claims the run slot, or fails with [`Error::AlreadyRunning`].
    /// Clears any cancellation left over from an earlier run.
    pub fn try_lock(&self) -> Result<RunGuard, Error> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::AlreadyRunning)?;
        self.cancel.send_replace(false);
        Ok(RunGuard {
            running: self.running.clone(),
        })
    }

    /// Asks the current run to stop. The run notices before its next keyword, or immediately when
    /// it is pausing between requests or between retries. A request already in flight finishes first.
    pub fn cancel(&self) {
        if self.is_running() {
            tracing::info!("Cancellation requested");
            self.cancel.send_replace(true);
        }
    }

    /// Claims the run slot and runs one full check.
    pub async fn run(&self) -> Result<CheckSummary, Error> {
        let guard = self.try_lock()?;
        self.run_locked(guard).await
    }

    /// Runs one full check with a slot claimed earlier through [`Self::try_lock`].
    pub async fn run_locked(&self, guard: RunGuard) -> Result<CheckSummary, Error> {
        let result = self.check_all().await;
        drop(guard);
        result
    }

    async fn check_all(&self) -> Result<CheckSummary, Error> {
        let mut cancel_rx = self.cancel.subscribe();

        let keywords = match self.store.list_all().await {
            Ok(keywords) => keywords,
            Err(e) => {
                self.progress.publish(WorkerProgress {
                    errors: 1,
                    ..Default::default()
                });
                return Err(self.fatal(e));
            }
        };

        let total = keywords.len();
        if total == 0 {
            tracing::info!("No keywords to check");
            self.progress.publish(WorkerProgress::default());
            return Ok(CheckSummary::default());
        }

        tracing::info!("Starting ranking check of {} keywords", total);
        let mut summary = CheckSummary {
            total,
            ..Default::default()
        };
        self.publish_running(&summary, None);

        for (index, keyword) in keywords.iter().enumerate() {
            if *cancel_rx.borrow() {
                return Ok(self.finish_cancelled(summary));
            }

            let label = keyword.label();
            self.publish_running(&summary, Some(label.clone()));

            let query = RankQuery::from(keyword);
            let stop = cancelled(&mut cancel_rx);
            let retry = &self.config.retry;
            let Some(outcome) = lookup_with_retry(self.lookup.as_ref(), &query, retry, stop).await else {
                return Ok(self.finish_cancelled(summary));
            };

            let is_last = index + 1 == total;
            let mut pause = if is_last { Duration::ZERO } else { self.config.request_delay };

            match outcome {
                CheckOutcome::Failed { attempts, error } => {
                    summary.errors += 1;
                    tracing::error!(
                        "[keyword: {}] Check failed for {} after {} attempt(s): {}",
                        keyword.id,
                        label,
                        attempts,
                        error
                    );
                    if error.is_rate_limit() && !is_last {
                        tracing::warn!("Rate limited, cooling down for {:?}", self.config.rate_limit_cooldown);
                        pause += self.config.rate_limit_cooldown;
                    }
                }
                outcome => {
                    if let Err(e) = self.store.record_check(keyword.id, outcome.rank()).await {
                        self.progress.update(|p| {
                            p.is_running = false;
                            p.current_keyword = None;
                            p.errors = summary.errors + 1;
                        });
                        return Err(self.fatal(e));
                    }
                    summary.checked += 1;
                    tracing::info!("[keyword: {}] {} -> {:?}", keyword.id, label, outcome.rank());
                }
            }

            self.publish_running(&summary, Some(label));

            if !pause.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(pause) => {}
                    _ = cancelled(&mut cancel_rx) => return Ok(self.finish_cancelled(summary)),
                }
            }
        }

        self.progress.publish(WorkerProgress {
            is_running: false,
            total_keywords: summary.total,
            checked_keywords: summary.checked,
            errors: summary.errors,
            current_keyword: None,
            last_update: None,
        });
        tracing::info!(
            "Ranking check complete: {} checked, {} errors, {} total",
            summary.checked,
            summary.errors,
            summary.total
        );
        Ok(summary)
    }

    fn publish_running(&self, summary: &CheckSummary, current_keyword: Option<String>) {
        self.progress.publish(WorkerProgress {
            is_running: true,
            total_keywords: summary.total,
            checked_keywords: summary.checked,
            errors: summary.errors,
            current_keyword,
            last_update: None,
        });
    }

    fn finish_cancelled(&self, mut summary: CheckSummary) -> CheckSummary {
        summary.cancelled = true;
        self.progress.update(|p| {
            p.is_running = false;
            p.current_keyword = None;
        });
        tracing::warn!(
            "Ranking check cancelled after {} of {} keywords",
            summary.checked + summary.errors,
            summary.total
        );
        summary
    }

    fn fatal(&self, error: StoreError) -> Error {
        tracing::error!("Ranking check aborted: {}", error);
        Error::StoreError(error)
    }
}

/// Resolves once cancellation has been requested.
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|cancelled| *cancelled).await.is_err() {
        // sender gone: nobody can cancel anymore
        std::future::pending::<()>().await
    }
}
