use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use data_model_srt::models::ApiError;
use serde::{Deserialize, Serialize};
use worker_srt::{Error, RankingCheckJob};

use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerActionResponse {
    pub accepted: bool,
    pub message: String,
}

fn check_job(state: &AppState) -> Result<&Arc<RankingCheckJob>, ApiError> {
    state
        .job
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("ranking checks are disabled: VALUESERP_API_KEY is not set".to_string()))
}

/// GET /api/worker/progress - Progress of the current or most recent ranking check
pub async fn get_progress(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.progress.report()))
}

/// POST /api/worker/run - Start a ranking check in the background
///
/// Responds 202 once the check is started, 409 if one is already running.
pub async fn post_run(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let job = check_job(&state)?.clone();

    let guard = job.try_lock().map_err(|e| match e {
        Error::AlreadyRunning => ApiError::AlreadyRunning,
        other => ApiError::Unknown(other.to_string()),
    })?;

    tokio::spawn(async move {
        match job.run_locked(guard).await {
            Ok(summary) => tracing::info!("Ranking check finished: {:?}", summary),
            Err(e) => tracing::error!("Ranking check failed: {}", e),
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(WorkerActionResponse {
            accepted: true,
            message: "Ranking check started".to_string(),
        }),
    ))
}

/// POST /api/worker/cancel - Ask the running ranking check to stop
pub async fn post_cancel(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let job = check_job(&state)?;

    if !job.is_running() {
        return Ok((
            StatusCode::OK,
            Json(WorkerActionResponse {
                accepted: false,
                message: "No ranking check is running".to_string(),
            }),
        ));
    }

    job.cancel();
    Ok((
        StatusCode::ACCEPTED,
        Json(WorkerActionResponse {
            accepted: true,
            message: "Cancellation requested".to_string(),
        }),
    ))
}
