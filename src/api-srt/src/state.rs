use std::sync::Arc;

use core_srt::VisibilityProvider;
use data_model_srt::KeywordStore;
use data_model_srt::db::DbPool;
use worker_srt::{ProgressReporter, RankingCheckJob};

/// Shared state of every handler.
#[derive(Clone)]
pub struct AppState {
    /// Read-only dashboard queries
    pub pool: DbPool,
    /// Keyword writes
    pub store: Arc<dyn KeywordStore>,
    pub progress: ProgressReporter,
    /// `None` when no SERP API key is configured: ranking checks cannot be started.
    pub job: Option<Arc<RankingCheckJob>>,
    /// `None` when no visibility API key is configured.
    pub visibility: Option<Arc<dyn VisibilityProvider>>,
}
