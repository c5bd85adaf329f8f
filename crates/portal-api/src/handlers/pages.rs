//! Page handlers, nested under a note's section.

use crate::auth::PrincipalId;
use crate::errors::ApiError;
use crate::handlers::sections::{require_section, section_not_found};
use crate::handlers::{check, parse_body};
use crate::models::{PageEnvelope, PageRow, WriteMode};
use crate::repositories::PagesRepository;
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
    ApiError::NotFound("Page not found".to_string())
}

#[instrument(skip_all, name = "portal.handlers.list_pages", fields(note_id = %note_id, section_id = %section_id))]
pub async fn list_pages(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<PrincipalId>,
    Path((note_id, section_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Vec<PageRow>>, ApiError> {
    require_section(&state.pool, &principal, note_id, section_id).await?;

    let pages = PagesRepository::list(&state.pool, principal.as_str(), section_id).await?;
    Ok(Json(pages))
}

#[instrument(skip_all, name = "portal.handlers.get_page", fields(note_id = %note_id, section_id = %section_id, page_id = %id))]
pub async fn get_page(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<PrincipalId>,
    Path((note_id, section_id, id)): Path<(Uuid, Uuid, Uuid)>,
) -> Result<Json<PageRow>, ApiError> {
    require_section(&state.pool, &principal, note_id, section_id).await?;

    PagesRepository::find(&state.pool, principal.as_str(), section_id, id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

#[instrument(skip_all, name = "portal.handlers.create_page", fields(note_id = %note_id, section_id = %section_id))]
pub async fn create_page(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<PrincipalId>,
    Path((note_id, section_id)): Path<(Uuid, Uuid)>,
    body: Bytes,
) -> Result<(StatusCode, Json<PageRow>), ApiError> {
    let request: PageEnvelope = parse_body(&body)?;
    check(request.page.validate(WriteMode::Create))?;
    require_section(&state.pool, &principal, note_id, section_id).await?;

    let page = PagesRepository::create(&state.pool, principal.as_str(), section_id, &request.page)
        .await?
        .ok_or_else(section_not_found)?;
    Ok((StatusCode::CREATED, Json(page)))
}

#[instrument(skip_all, name = "portal.handlers.update_page", fields(note_id = %note_id, section_id = %section_id, page_id = %id))]
pub async fn update_page(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<PrincipalId>,
    Path((note_id, section_id, id)): Path<(Uuid, Uuid, Uuid)>,
    body: Bytes,
) -> Result<Json<PageRow>, ApiError> {
    let request: PageEnvelope = parse_body(&body)?;
    check(request.page.validate(WriteMode::Update))?;
    require_section(&state.pool, &principal, note_id, section_id).await?;

    PagesRepository::update(&state.pool, principal.as_str(), section_id, id, &request.page)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

#[instrument(skip_all, name = "portal.handlers.delete_page", fields(note_id = %note_id, section_id = %section_id, page_id = %id))]
pub async fn delete_page(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<PrincipalId>,
    Path((note_id, section_id, id)): Path<(Uuid, Uuid, Uuid)>,
) -> Result<Json<PageRow>, ApiError> {
    require_section(&state.pool, &principal, note_id, section_id).await?;

    PagesRepository::delete(&state.pool, principal.as_str(), section_id, id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}
