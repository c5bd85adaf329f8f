//! Car handlers.
//!
//! - `GET /api/v1/cars` - list, ordered by `seq`
//! - `POST /api/v1/cars` - create (409 on duplicate `seq`)
//! - `GET /api/v1/cars/{id}` - show
//! - `PATCH|PUT /api/v1/cars/{id}` - update
//! - `DELETE /api/v1/cars/{id}` - destroy, cascading to refuelings

use crate::auth::PrincipalId;
use crate::errors::ApiError;
use crate::handlers::{check, parse_body};
use crate::models::{CarEnvelope, CarRow, WriteMode};
use crate::repositories::CarsRepository;
use crate::routes::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

pub(crate) fn car_not_found() -> ApiError {
    ApiError::NotFound("Car not found".to_string())
}

#[instrument(skip_all, name = "portal.handlers.list_cars")]
pub async fn list_cars(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<PrincipalId>,
) -> Result<Json<Vec<CarRow>>, ApiError> {
    let cars = CarsRepository::list(&state.pool, principal.as_str()).await?;
    Ok(Json(cars))
}

#[instrument(skip_all, name = "portal.handlers.get_car", fields(car_id = %id))]
pub async fn get_car(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<PrincipalId>,
    Path(id): Path<Uuid>,
) -> Result<Json<CarRow>, ApiError> {
    CarsRepository::find(&state.pool, principal.as_str(), id)
        .await?
        .map(Json)
        .ok_or_else(car_not_found)
}

#[instrument(skip_all, name = "portal.handlers.create_car")]
pub async fn create_car(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<PrincipalId>,
    body: Bytes,
) -> Result<(StatusCode, Json<CarRow>), ApiError> {
    let request: CarEnvelope = parse_body(&body)?;
    check(request.car.validate(WriteMode::Create))?;

    let car = CarsRepository::create(&state.pool, principal.as_str(), &request.car).await?;
    tracing::info!(target: "portal.handlers.cars", car_id = %car.id, "Car created");
    Ok((StatusCode::CREATED, Json(car)))
}

#[instrument(skip_all, name = "portal.handlers.update_car", fields(car_id = %id))]
pub async fn update_car(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<PrincipalId>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<CarRow>, ApiError> {
    let request: CarEnvelope = parse_body(&body)?;
    check(request.car.validate(WriteMode::Update))?;

    CarsRepository::update(&state.pool, principal.as_str(), id, &request.car)
        .await?
        .map(Json)
        .ok_or_else(car_not_found)
}

#[instrument(skip_all, name = "portal.handlers.delete_car", fields(car_id = %id))]
pub async fn delete_car(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<PrincipalId>,
    Path(id): Path<Uuid>,
) -> Result<Json<CarRow>, ApiError> {
    CarsRepository::delete(&state.pool, principal.as_str(), id)
        .await?
        .map(Json)
        .ok_or_else(car_not_found)
}
