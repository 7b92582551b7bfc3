use std::sync::Arc;

use anyhow::Context;
use core_srt::{ValueSerp, VisibilityProvider, get_bind_address, get_db_pool, setup_logging, visibility::Sistrix};
use data_model_srt::PgKeywordStore;
use worker_srt::{CheckConfig, ProgressReporter, RankingCheckJob};

use api_srt::{AppState, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    setup_logging("api_srt=debug,worker_srt=info,core_srt=info,tower_http=debug");

    let pool = get_db_pool().await;
    let store = Arc::new(PgKeywordStore::new(pool.clone()));
    let progress = ProgressReporter::new();

    let job = match ValueSerp::from_env() {
        Ok(lookup) => {
            let config = CheckConfig::from_env().map_err(|e| anyhow::anyhow!("{}", e))?;
            Some(Arc::new(RankingCheckJob::new(
                store.clone(),
                Arc::new(lookup),
                progress.clone(),
                config,
            )))
        }
        Err(e) => {
            tracing::warn!("Ranking checks disabled: {}", e);
            None
        }
    };

    let visibility: Option<Arc<dyn VisibilityProvider>> = match Sistrix::from_env() {
        Ok(Some(sistrix)) => Some(Arc::new(sistrix)),
        Ok(None) => {
            tracing::info!("SISTRIX_API_KEY not set, visibility index disabled");
            None
        }
        Err(e) => {
            tracing::warn!("Visibility index disabled: {}", e);
            None
        }
    };

    let state = AppState {
        pool,
        store,
        progress,
        job: job.clone(),
        visibility,
    };
    let app = routes::router().with_state(state);

    let addr = get_bind_address().context("Invalid HOST or PORT")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to address: {}", addr))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutting down");
            if let Some(job) = job {
                job.cancel();
            }
        })
        .await
        .context("Server error")?;

    Ok(())
}
