use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};
use std::sync::Arc;

use super::auth::SessionContext;
use super::error::ApiError;
use crate::AppState;

const MISSING_FILE: &str = "No file exists";

/// GET /image/:id - stream a stored blob chunk by chunk
pub async fn get_image(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    _session: SessionContext,
) -> Result<Response, ApiError> {
    let file = match state.blobs.find(&id).await {
        Ok(Some(file)) => file,
        Ok(None) => return Err(ApiError::not_found(MISSING_FILE)),
        Err(e) => {
            tracing::error!(blob_id = %id, "Failed to look up image: {}", e);
            return Err(ApiError::not_found(MISSING_FILE));
        }
    };

    tracing::debug!(blob_id = %file.id, length = file.length, "Streaming image");

    let body = Body::from_stream(state.blobs.stream(&file));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, file.mime_type())
        .header(header::CONTENT_LENGTH, file.length.to_string())
        .body(body)
        .map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)))
}
