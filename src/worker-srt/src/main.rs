use std::sync::Arc;

use core_srt::{ValueSerp, get_db_pool, setup_logging};
use data_model_srt::PgKeywordStore;
use worker_srt::{CheckConfig, Error, ProgressReporter, RankingCheckJob};

/// Runs one ranking check over every keyword, then exits.
/// Exit code 1 on a fatal error, 130 when interrupted.
#[tokio::main]
async fn main() {
    // Load environment variables from .env file, if it exists
    dotenvy::dotenv().ok();

    setup_logging("worker_srt=info,core_srt=info,data_model_srt=info");

    // no point touching the database without a SERP API key
    let lookup = match ValueSerp::from_env() {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::error!("Cannot start ranking check: {}", Error::from(e));
            std::process::exit(1)
        }
    };

    let config = match CheckConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1)
        }
    };
    tracing::debug!("Check config: {:?}", config);

    let pool = get_db_pool().await;
    let store = Arc::new(PgKeywordStore::new(pool));

    let job = Arc::new(RankingCheckJob::new(store, lookup, ProgressReporter::new(), config));

    tokio::spawn({
        let job = job.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, stopping after the current step");
                job.cancel();
            }
        }
    });

    match job.run().await {
        Ok(summary) if summary.cancelled => {
            tracing::warn!("Stopped early: {} checked, {} errors", summary.checked, summary.errors);
            std::process::exit(130)
        }
        Ok(summary) => {
            tracing::info!(
                "Done: {}/{} keywords checked, {} errors",
                summary.checked,
                summary.total,
                summary.errors
            );
        }
        Err(e) => {
            tracing::error!("Ranking check failed: {}", e);
            std::process::exit(1)
        }
    }
}
