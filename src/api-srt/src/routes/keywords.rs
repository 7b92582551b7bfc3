use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use core_srt::aggregate::KeywordFilter;
use data_model_srt::models::{ApiError, BulkAddRequest, BulkAddResponse, KeywordView};
use data_model_srt::store::keywords_for_display;

use crate::state::AppState;

/// GET /api/keywords - All keywords, best rank first, with their rank movement
pub async fn get_keywords(
    State(state): State<AppState>,
    Query(filter): Query<KeywordFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = state.pool.get().await?;
    let keywords = keywords_for_display(&mut conn).await?;

    let views: Vec<KeywordView> = keywords
        .into_iter()
        .filter(|k| filter.matches(k))
        .map(KeywordView::from)
        .collect();

    Ok((StatusCode::OK, Json(views)))
}

/// POST /api/keywords/bulk - Add keywords for one domain and country
///
/// The whole request is validated first; one bad entry rejects it and nothing is written.
/// Keywords already tracked for the same domain and country are skipped.
pub async fn post_bulk_keywords(
    State(state): State<AppState>,
    Json(payload): Json<BulkAddRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (domain, country, entries) = payload.validate()?;
    let submitted = entries.len();

    let inserted = state.store.bulk_insert(&domain, &country, entries).await?;
    tracing::info!(
        "Added {} of {} submitted keywords for {} ({})",
        inserted,
        submitted,
        domain,
        country
    );

    Ok((StatusCode::OK, Json(BulkAddResponse { inserted, submitted })))
}

/// DELETE /api/keywords/{id} - Remove a keyword and its history
pub async fn delete_keyword(State(state): State<AppState>, Path(id): Path<i32>) -> Result<impl IntoResponse, ApiError> {
    state.store.delete(id).await?;
    tracing::info!("[keyword: {}] Deleted", id);
    Ok(StatusCode::NO_CONTENT)
}
