use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::instrument;

use crate::db::NewCar;
use crate::errors::AppError;
use crate::services::AppState;

#[instrument(skip(state, payload))]
pub async fn create_car(
    State(state): State<AppState>,
    Json(payload): Json<NewCar>,
) -> Result<impl IntoResponse, AppError> {
    if payload.company_name.trim().is_empty() || payload.model.trim().is_empty() {
        return Err(AppError::ValidationError(
            "company_name and model are required".to_string(),
        ));
    }

    let car = state.catalog_service.create_car(payload).await?;
    Ok((StatusCode::CREATED, Json(car)))
}

#[instrument(skip(state))]
pub async fn list_cars(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let cars = state.catalog_service.list_cars().await?;
    Ok(Json(cars))
}

#[instrument(skip(state))]
pub async fn get_car(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let car = state.catalog_service.get_car(id).await?;
    Ok(Json(car))
}
