//! Note handlers.
//!
//! - `GET /api/v1/notes` - list, ordered by `seq`
//! - `POST /api/v1/notes` - create (409 on duplicate `seq`)
//! - `GET /api/v1/notes/{id}` - show
//! - `PATCH|PUT /api/v1/notes/{id}` - update
//! - `DELETE /api/v1/notes/{id}` - destroy, cascading to sections and pages

use crate::auth::PrincipalId;
use crate::errors::ApiError;
use crate::handlers::{check, parse_body};
use crate::models::{NoteEnvelope, NoteRow, WriteMode};
use crate::repositories::NotesRepository;
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

pub(crate) fn note_not_found() -> ApiError {
    ApiError::NotFound("Note not found".to_string())
}

/// 404 unless the note exists and belongs to the principal.
pub(crate) async fn require_note(
    pool: &PgPool,
    principal: &PrincipalId,
    note_id: Uuid,
) -> Result<(), ApiError> {
    if NotesRepository::is_owned(pool, principal.as_str(), note_id).await? {
        Ok(())
    } else {
        Err(note_not_found())
    }
}

#[instrument(skip_all, name = "portal.handlers.list_notes")]
pub async fn list_notes(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<PrincipalId>,
) -> Result<Json<Vec<NoteRow>>, ApiError> {
    let notes = NotesRepository::list(&state.pool, principal.as_str()).await?;
    Ok(Json(notes))
}

#[instrument(skip_all, name = "portal.handlers.get_note", fields(note_id = %id))]
pub async fn get_note(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<PrincipalId>,
    Path(id): Path<Uuid>,
) -> Result<Json<NoteRow>, ApiError> {
    NotesRepository::find(&state.pool, principal.as_str(), id)
        .await?
        .map(Json)
        .ok_or_else(note_not_found)
}

#[instrument(skip_all, name = "portal.handlers.create_note")]
pub async fn create_note(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<PrincipalId>,
    body: Bytes,
) -> Result<(StatusCode, Json<NoteRow>), ApiError> {
    let request: NoteEnvelope = parse_body(&body)?;
    check(request.note.validate(WriteMode::Create))?;

    let note = NotesRepository::create(&state.pool, principal.as_str(), &request.note).await?;
    tracing::info!(target: "portal.handlers.notes", note_id = %note.id, "Note created");
    Ok((StatusCode::CREATED, Json(note)))
}

#[instrument(skip_all, name = "portal.handlers.update_note", fields(note_id = %id))]
pub async fn update_note(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<PrincipalId>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<NoteRow>, ApiError> {
    let request: NoteEnvelope = parse_body(&body)?;
    check(request.note.validate(WriteMode::Update))?;

    NotesRepository::update(&state.pool, principal.as_str(), id, &request.note)
        .await?
        .map(Json)
        .ok_or_else(note_not_found)
}

#[instrument(skip_all, name = "portal.handlers.delete_note", fields(note_id = %id))]
pub async fn delete_note(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<PrincipalId>,
    Path(id): Path<Uuid>,
) -> Result<Json<NoteRow>, ApiError> {
    NotesRepository::delete(&state.pool, principal.as_str(), id)
        .await?
        .map(Json)
        .ok_or_else(note_not_found)
}
