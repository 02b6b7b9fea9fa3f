use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;
use tracing::instrument;

use crate::errors::AppError;
use crate::services::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatQuery {
    pub query: String,
}

/// Natural-language car search. Always 200: either a list of cars or a
/// `{"message": ...}` envelope.
#[instrument(skip(state, payload))]
pub async fn chat_search(
    State(state): State<AppState>,
    Json(payload): Json<ChatQuery>,
) -> Result<impl IntoResponse, AppError> {
    let reply = state.chat_service.answer(&payload.query).await?;
    Ok(Json(reply))
}
