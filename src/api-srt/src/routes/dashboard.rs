//! Aggregate views over the (optionally filtered) keyword set.

use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use core_srt::aggregate::{KeywordFilter, distribution, summarize, trend_series};
use data_model_srt::models::{ApiError, Keyword};
use data_model_srt::store::{history_since, keywords_for_display};
use serde::Deserialize;

use crate::routes::history::history_window;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TrendWindow {
    pub days: Option<u32>,
}

async fn filtered_keywords(state: &AppState, filter: &KeywordFilter) -> Result<Vec<Keyword>, ApiError> {
    let mut conn = state.pool.get().await?;
    let keywords = keywords_for_display(&mut conn).await?;
    Ok(keywords.into_iter().filter(|k| filter.matches(k)).collect())
}

/// GET /api/summary - Headline KPIs
pub async fn get_summary(
    State(state): State<AppState>,
    Query(filter): Query<KeywordFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let keywords = filtered_keywords(&state, &filter).await?;
    Ok((StatusCode::OK, Json(summarize(&keywords))))
}

/// GET /api/distribution - Keyword counts per rank bucket
pub async fn get_distribution(
    State(state): State<AppState>,
    Query(filter): Query<KeywordFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let keywords = filtered_keywords(&state, &filter).await?;
    Ok((StatusCode::OK, Json(distribution(&keywords))))
}

/// GET /api/trend?days=N - Daily average rank of the filtered keywords
pub async fn get_trend(
    State(state): State<AppState>,
    Query(filter): Query<KeywordFilter>,
    Query(window): Query<TrendWindow>,
) -> Result<impl IntoResponse, ApiError> {
    let days = history_window(window.days)?;

    let keywords = filtered_keywords(&state, &filter).await?;
    let ids: Vec<i32> = keywords.iter().map(|k| k.id).collect();

    let now = Utc::now();
    let mut conn = state.pool.get().await?;
    let entries = history_since(&mut conn, &ids, now - chrono::Duration::days(days as i64)).await?;

    Ok((StatusCode::OK, Json(trend_series(&entries, now, days))))
}
