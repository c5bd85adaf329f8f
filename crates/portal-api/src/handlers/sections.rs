//! Section handlers, nested under a note.
//!
//! A note owned by someone else reads as 404 on every route, including the
//! list.

use crate::auth::PrincipalId;
use crate::errors::ApiError;
use crate::handlers::notes::{note_not_found, require_note};
use crate::handlers::{check, parse_body};
use crate::models::{SectionEnvelope, SectionRow, WriteMode};
use crate::repositories::SectionsRepository;
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

pub(crate) fn section_not_found() -> ApiError {
    ApiError::NotFound("Section not found".to_string())
}

/// 404 unless the section sits under `note_id` and the note belongs to the
/// principal.
pub(crate) async fn require_section(
    pool: &PgPool,
    principal: &PrincipalId,
    note_id: Uuid,
    section_id: Uuid,
) -> Result<(), ApiError> {
    require_note(pool, principal, note_id).await?;
    if SectionsRepository::is_owned(pool, principal.as_str(), note_id, section_id).await? {
        Ok(())
    } else {
        Err(section_not_found())
    }
}

#[instrument(skip_all, name = "portal.handlers.list_sections", fields(note_id = %note_id))]
pub async fn list_sections(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<PrincipalId>,
    Path(note_id): Path<Uuid>,
) -> Result<Json<Vec<SectionRow>>, ApiError> {
    require_note(&state.pool, &principal, note_id).await?;

    let sections = SectionsRepository::list(&state.pool, principal.as_str(), note_id).await?;
    Ok(Json(sections))
}

#[instrument(skip_all, name = "portal.handlers.get_section", fields(note_id = %note_id, section_id = %id))]
pub async fn get_section(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<PrincipalId>,
    Path((note_id, id)): Path<(Uuid, Uuid)>,
) -> Result<Json<SectionRow>, ApiError> {
    require_note(&state.pool, &principal, note_id).await?;

    SectionsRepository::find(&state.pool, principal.as_str(), note_id, id)
        .await?
        .map(Json)
        .ok_or_else(section_not_found)
}

#[instrument(skip_all, name = "portal.handlers.create_section", fields(note_id = %note_id))]
pub async fn create_section(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<PrincipalId>,
    Path(note_id): Path<Uuid>,
    body: Bytes,
) -> Result<(StatusCode, Json<SectionRow>), ApiError> {
    let request: SectionEnvelope = parse_body(&body)?;
    check(request.section.validate(WriteMode::Create))?;

    let section =
        SectionsRepository::create(&state.pool, principal.as_str(), note_id, &request.section)
            .await?
            .ok_or_else(note_not_found)?;
    Ok((StatusCode::CREATED, Json(section)))
}

#[instrument(skip_all, name = "portal.handlers.update_section", fields(note_id = %note_id, section_id = %id))]
pub async fn update_section(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<PrincipalId>,
    Path((note_id, id)): Path<(Uuid, Uuid)>,
    body: Bytes,
) -> Result<Json<SectionRow>, ApiError> {
    let request: SectionEnvelope = parse_body(&body)?;
    check(request.section.validate(WriteMode::Update))?;
    require_note(&state.pool, &principal, note_id).await?;

    SectionsRepository::update(&state.pool, principal.as_str(), note_id, id, &request.section)
        .await?
        .map(Json)
        .ok_or_else(section_not_found)
}

#[instrument(skip_all, name = "portal.handlers.delete_section", fields(note_id = %note_id, section_id = %id))]
pub async fn delete_section(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<PrincipalId>,
    Path((note_id, id)): Path<(Uuid, Uuid)>,
) -> Result<Json<SectionRow>, ApiError> {
    require_note(&state.pool, &principal, note_id).await?;

    SectionsRepository::delete(&state.pool, principal.as_str(), note_id, id)
        .await?
        .map(Json)
        .ok_or_else(section_not_found)
}
