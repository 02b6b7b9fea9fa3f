use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::instrument;

use crate::errors::AppError;
use crate::services::booking::NewBooking;
use crate::services::AppState;

#[instrument(skip(state, payload))]
pub async fn create_booking(
    State(state): State<AppState>,
    Json(payload): Json<NewBooking>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.booking_service.create_booking(payload).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

#[derive(Debug, Deserialize)]
pub struct SlotsParams {
    pub date: String,
}

#[instrument(skip(state))]
pub async fn available_slots(
    State(state): State<AppState>,
    Path(car_id): Path<i32>,
    Query(params): Query<SlotsParams>,
) -> Result<impl IntoResponse, AppError> {
    let date = NaiveDate::parse_from_str(&params.date, "%Y-%m-%d")
        .map_err(|_| AppError::InvalidFormat("Invalid date format. Use YYYY-MM-DD".to_string()))?;

    let slots = state.booking_service.available_slots(car_id, date).await?;
    Ok(Json(slots))
}
