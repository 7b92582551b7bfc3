use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use core_srt::VisibilityError;
use data_model_srt::models::ApiError;
use serde::Deserialize;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VisibilityQuery {
    pub country: Option<String>,
}

/// GET /api/sistrix/visibility/{domain}?country= - Visibility index history of a domain, oldest first
pub async fn get_visibility(
    State(state): State<AppState>,
    Path(domain): Path<String>,
    Query(query): Query<VisibilityQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let provider = state
        .visibility
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("visibility index is disabled: SISTRIX_API_KEY is not set".to_string()))?;

    let country = query.country.unwrap_or_else(|| "United States".to_string());
    let points = provider
        .visibility_index(&domain, &country)
        .await
        .map_err(|e: VisibilityError| {
            tracing::warn!("Visibility lookup for {} ({}) failed: {}", domain, country, e);
            ApiError::Unavailable(e.to_string())
        })?;

    Ok((StatusCode::OK, Json(points)))
}
