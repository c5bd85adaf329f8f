//! Refueling handlers, nested under a car.
//!
//! Every handler first confirms the parent car belongs to the principal, so
//! another user's car id reads as 404 rather than an empty list.

use crate::auth::PrincipalId;
use crate::errors::ApiError;
use crate::handlers::cars::car_not_found;
use crate::handlers::{check, parse_body};
use crate::models::{RefuelingEnvelope, RefuelingRow, WriteMode};
use crate::repositories::{CarsRepository, RefuelingsRepository};
use crate::routes::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

fn not_found() -> ApiError {
    ApiError::NotFound("Refueling not found".to_string())
}

async fn require_car(pool: &PgPool, principal: &PrincipalId, car_id: Uuid) -> Result<(), ApiError> {
    if CarsRepository::is_owned(pool, principal.as_str(), car_id).await? {
        Ok(())
    } else {
        Err(car_not_found())
    }
}

#[instrument(skip_all, name = "portal.handlers.list_refuelings", fields(car_id = %car_id))]
pub async fn list_refuelings(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<PrincipalId>,
    Path(car_id): Path<Uuid>,
) -> Result<Json<Vec<RefuelingRow>>, ApiError> {
    require_car(&state.pool, &principal, car_id).await?;

    let refuelings = RefuelingsRepository::list(&state.pool, principal.as_str(), car_id).await?;
    Ok(Json(refuelings))
}

#[instrument(skip_all, name = "portal.handlers.get_refueling", fields(car_id = %car_id, refueling_id = %id))]
pub async fn get_refueling(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<PrincipalId>,
    Path((car_id, id)): Path<(Uuid, Uuid)>,
) -> Result<Json<RefuelingRow>, ApiError> {
    require_car(&state.pool, &principal, car_id).await?;

    RefuelingsRepository::find(&state.pool, principal.as_str(), car_id, id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

#[instrument(skip_all, name = "portal.handlers.create_refueling", fields(car_id = %car_id))]
pub async fn create_refueling(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<PrincipalId>,
    Path(car_id): Path<Uuid>,
    body: Bytes,
) -> Result<(StatusCode, Json<RefuelingRow>), ApiError> {
    let request: RefuelingEnvelope = parse_body(&body)?;
    check(request.refueling.validate(WriteMode::Create))?;
    require_car(&state.pool, &principal, car_id).await?;

    let refueling =
        RefuelingsRepository::create(&state.pool, principal.as_str(), car_id, &request.refueling)
            .await?;
    Ok((StatusCode::CREATED, Json(refueling)))
}

#[instrument(skip_all, name = "portal.handlers.update_refueling", fields(car_id = %car_id, refueling_id = %id))]
pub async fn update_refueling(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<PrincipalId>,
    Path((car_id, id)): Path<(Uuid, Uuid)>,
    body: Bytes,
) -> Result<Json<RefuelingRow>, ApiError> {
    let request: RefuelingEnvelope = parse_body(&body)?;
    check(request.refueling.validate(WriteMode::Update))?;
    require_car(&state.pool, &principal, car_id).await?;

    RefuelingsRepository::update(&state.pool, principal.as_str(), car_id, id, &request.refueling)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

#[instrument(skip_all, name = "portal.handlers.delete_refueling", fields(car_id = %car_id, refueling_id = %id))]
pub async fn delete_refueling(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<PrincipalId>,
    Path((car_id, id)): Path<(Uuid, Uuid)>,
) -> Result<Json<RefuelingRow>, ApiError> {
    require_car(&state.pool, &principal, car_id).await?;

    RefuelingsRepository::delete(&state.pool, principal.as_str(), car_id, id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}
