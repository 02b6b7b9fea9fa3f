use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::instrument;

use crate::errors::AppError;
use crate::services::AppState;

/// Multipart image upload; expects a `file` field with a filename.
#[instrument(skip(state, multipart))]
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidFormat(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .ok_or_else(|| AppError::MissingField("file name".to_string()))?
            .to_string();

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidFormat(format!("Failed to read upload: {}", e)))?;

        let url = state
            .upload_service
            .upload_image(&filename, bytes.to_vec())
            .await?;
        return Ok(Json(json!({ "url": url })));
    }

    Err(AppError::MissingField("file".to_string()))
}
