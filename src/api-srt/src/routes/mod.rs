use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use core_srt::health_router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod dashboard;
pub mod history;
pub mod keywords;
pub mod logging_middleware;
pub mod visibility;
pub mod worker;

//
// Router
//

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health_router())
        .route("/api/summary", get(dashboard::get_summary))
        .route("/api/distribution", get(dashboard::get_distribution))
        .route("/api/trend", get(dashboard::get_trend))
        .route("/api/keywords", get(keywords::get_keywords))
        .route("/api/keywords/bulk", post(keywords::post_bulk_keywords))
        .route("/api/keywords/{id}", delete(keywords::delete_keyword))
        .route("/api/history/bulk", post(history::post_bulk_history))
        .route("/api/history/{keyword_id}", get(history::get_history))
        .route("/api/worker/progress", get(worker::get_progress))
        .route("/api/worker/run", post(worker::post_run))
        .route("/api/worker/cancel", post(worker::post_cancel))
        .route("/api/sistrix/visibility/{domain}", get(visibility::get_visibility))
        // Custom route access logging
        .layer(middleware::from_fn(logging_middleware::log_route_access))
        // Tracing middleware
        .layer(TraceLayer::new_for_http())
}
