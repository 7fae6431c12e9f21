//! Query history endpoint

use axum::extract::{Query, State};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, HistoryEntry, HistoryParams, Json};

/// GET /api/v1/history
pub async fn list_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    let limit = params.effective_limit();
    debug!(limit, "Listing query history");

    let records = state.query_service.recent_history(limit).await?;

    Ok(Json(records.into_iter().map(HistoryEntry::from).collect()))
}
