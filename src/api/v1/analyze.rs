//! Multipart analysis endpoint (text queries with an optional image)

use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::extract::State;
use axum::http::StatusCode;
use tracing::{debug, info};

use crate::api::state::AppState;
use crate::api::types::{ApiError, ApiErrorType, Json};
use crate::domain::medical::MAX_IMAGE_BYTES;
use crate::domain::{DomainError, ImageAttachment, QueryMode};
use crate::infrastructure::services::{MedicalQuery, QueryAnswer};

/// Fields collected from the form
#[derive(Debug, Default)]
struct AnalyzeForm {
    query: Option<String>,
    mode: Option<String>,
    image: Option<ImageAttachment>,
}

/// POST /api/v1/analyze
pub async fn analyze(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<QueryAnswer>, ApiError> {
    let multipart = multipart.map_err(|e| {
        ApiError::bad_request(format!("Invalid multipart request: {}", e.body_text()))
    })?;

    let form = read_form(multipart).await?;

    let query = form
        .query
        .ok_or_else(|| ApiError::bad_request("Field 'query' is required").with_param("query"))?;
    let mode: QueryMode = form.mode.as_deref().unwrap_or("quick").parse()?;

    info!(mode = %mode, has_image = form.image.is_some(), "Processing analyze request");

    let mut request = MedicalQuery::new(query, mode);
    if let Some(image) = form.image {
        request = request.with_image(image);
    }

    let answer = state.query_service.answer(request).await?;
    Ok(Json(answer))
}

async fn read_form(mut multipart: Multipart) -> Result<AnalyzeForm, ApiError> {
    let mut form = AnalyzeForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("query") => form.query = Some(field.text().await.map_err(multipart_error)?),
            Some("mode") => form.mode = Some(field.text().await.map_err(multipart_error)?),
            Some("image") => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(multipart_error)?;

                // Browsers send an empty part when no file was chosen
                if data.is_empty() {
                    continue;
                }

                if !content_type.starts_with("image/") {
                    return Err(ApiError::bad_request("File must be an image").with_param("image"));
                }

                if data.len() > MAX_IMAGE_BYTES {
                    return Err(ApiError::payload_too_large(format!(
                        "Image too large: {} bytes (max: {} bytes)",
                        data.len(),
                        MAX_IMAGE_BYTES
                    ))
                    .with_param("image"));
                }

                debug!(content_type = %content_type, bytes = data.len(), "Received image upload");
                form.image = Some(normalize_image(data.to_vec()).await?);
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Decoding and resizing run on the blocking pool
async fn normalize_image(data: Vec<u8>) -> Result<ImageAttachment, ApiError> {
    let normalized = tokio::task::spawn_blocking(move || ImageAttachment::normalize(&data))
        .await
        .map_err(|e| DomainError::internal(format!("Image processing task failed: {}", e)))?;

    normalized.map_err(|e| ApiError::from(e).with_param("image"))
}

fn multipart_error(err: MultipartError) -> ApiError {
    let status = match err.status() {
        StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
        _ => StatusCode::BAD_REQUEST,
    };

    ApiError::new(
        status,
        ApiErrorType::InvalidRequestError,
        format!("Invalid multipart request: {}", err.body_text()),
    )
}
