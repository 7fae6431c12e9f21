//! Medical query endpoint

use axum::extract::State;
use tracing::info;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, QueryRequest};
use crate::domain::QueryMode;
use crate::infrastructure::services::{MedicalQuery, QueryAnswer};

/// POST /api/v1/query
pub async fn process_query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryAnswer>, ApiError> {
    let mode: QueryMode = request.mode.parse()?;

    info!(
        mode = %mode,
        include_sources = request.include_sources,
        language = %request.language,
        "Processing medical query request"
    );

    let query = MedicalQuery::new(request.query, mode).with_sources(request.include_sources);
    let answer = state.query_service.answer(query).await?;

    Ok(Json(answer))
}
