//! Confidential handlers.
//!
//! Nothing here logs request or response bodies; the stored password only
//! leaves the service in the owner's response.

use crate::auth::PrincipalId;
use crate::errors::ApiError;
use crate::handlers::{check, parse_body};
use crate::models::{ConfidentialEnvelope, ConfidentialRow, WriteMode};
use crate::repositories::ConfidentialsRepository;
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

fn not_found() -> ApiError {
    ApiError::NotFound("Confidential not found".to_string())
}

#[instrument(skip_all, name = "portal.handlers.list_confidentials")]
pub async fn list_confidentials(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<PrincipalId>,
) -> Result<Json<Vec<ConfidentialRow>>, ApiError> {
    let confidentials = ConfidentialsRepository::list(&state.pool, principal.as_str()).await?;
    Ok(Json(confidentials))
}

#[instrument(skip_all, name = "portal.handlers.get_confidential", fields(confidential_id = %id))]
pub async fn get_confidential(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<PrincipalId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ConfidentialRow>, ApiError> {
    ConfidentialsRepository::find(&state.pool, principal.as_str(), id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

#[instrument(skip_all, name = "portal.handlers.create_confidential")]
pub async fn create_confidential(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<PrincipalId>,
    body: Bytes,
) -> Result<(StatusCode, Json<ConfidentialRow>), ApiError> {
    let request: ConfidentialEnvelope = parse_body(&body)?;
    check(request.confidential.validate(WriteMode::Create))?;

    let confidential =
        ConfidentialsRepository::create(&state.pool, principal.as_str(), &request.confidential)
            .await?;
    tracing::info!(
        target: "portal.handlers.confidentials",
        confidential_id = %confidential.id,
        "Confidential created"
    );
    Ok((StatusCode::CREATED, Json(confidential)))
}

#[instrument(skip_all, name = "portal.handlers.update_confidential", fields(confidential_id = %id))]
pub async fn update_confidential(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<PrincipalId>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<ConfidentialRow>, ApiError> {
    let request: ConfidentialEnvelope = parse_body(&body)?;
    check(request.confidential.validate(WriteMode::Update))?;

    ConfidentialsRepository::update(&state.pool, principal.as_str(), id, &request.confidential)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

#[instrument(skip_all, name = "portal.handlers.delete_confidential", fields(confidential_id = %id))]
pub async fn delete_confidential(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<PrincipalId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ConfidentialRow>, ApiError> {
    ConfidentialsRepository::delete(&state.pool, principal.as_str(), id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}
