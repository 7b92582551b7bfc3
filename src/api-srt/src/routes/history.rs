use std::collections::BTreeMap;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use data_model_srt::models::{ApiError, BulkHistoryRequest, HistoryPoint};
use data_model_srt::store::{history_for_keyword, history_since};

use crate::state::AppState;

pub const DEFAULT_HISTORY_DAYS: u32 = 30;
/// Longest history window served, in days
pub const MAX_HISTORY_DAYS: u32 = 365;
/// Upper bound on ids per bulk history request
pub const MAX_BULK_IDS: usize = 1000;

/// Resolves an optional `days` parameter to a window within `1..=MAX_HISTORY_DAYS`.
pub fn history_window(days: Option<u32>) -> Result<u32, ApiError> {
    let days = days.unwrap_or(DEFAULT_HISTORY_DAYS);
    if days == 0 || days > MAX_HISTORY_DAYS {
        return Err(ApiError::InvalidInput(format!(
            "days must be between 1 and {}, got {}",
            MAX_HISTORY_DAYS, days
        )));
    }
    Ok(days)
}

/// GET /api/history/{keyword_id} - Every recorded rank of one keyword, oldest first
///
/// Unknown keywords have no history: the response is an empty list.
pub async fn get_history(
    State(state): State<AppState>,
    Path(keyword_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = state.pool.get().await?;
    let history: Vec<HistoryPoint> = history_for_keyword(&mut conn, keyword_id)
        .await?
        .into_iter()
        .map(HistoryPoint::from)
        .collect();

    Ok((StatusCode::OK, Json(history)))
}

/// POST /api/history/bulk - Recent history of several keywords at once
///
/// Responds with an object keyed by keyword id. Every requested id is present, possibly with an
/// empty list.
pub async fn post_bulk_history(
    State(state): State<AppState>,
    Json(payload): Json<BulkHistoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.ids.len() > MAX_BULK_IDS {
        return Err(ApiError::InvalidInput(format!(
            "at most {} ids per request, got {}",
            MAX_BULK_IDS,
            payload.ids.len()
        )));
    }
    let days = history_window(payload.days)?;
    let since = Utc::now() - chrono::Duration::days(days as i64);

    let mut conn = state.pool.get().await?;
    let entries = history_since(&mut conn, &payload.ids, since).await?;

    let mut by_keyword: BTreeMap<i32, Vec<HistoryPoint>> =
        payload.ids.iter().map(|id| (*id, Vec::new())).collect();
    for entry in entries {
        by_keyword.entry(entry.keyword_id).or_default().push(entry.into());
    }

    Ok((StatusCode::OK, Json(by_keyword)))
}
