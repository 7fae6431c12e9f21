//! Medical query API, mounted under `/api/v1`

pub mod analyze;
pub mod history;
pub mod query;

use axum::{
    routing::{get, post},
    Router,
};

use super::state::AppState;

/// Create v1 API router
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/query", post(query::process_query))
        .route("/analyze", post(analyze::analyze))
        .route("/history", get(history::list_history))
}
