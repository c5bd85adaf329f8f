//! Task list handlers.
//!
//! - `GET /api/v1/task_lists` - list, ordered by `seq`
//! - `POST /api/v1/task_lists` - create (409 on duplicate `seq`)
//! - `PATCH|PUT /api/v1/task_lists/{id}` - update
//! - `DELETE /api/v1/task_lists/{id}` - destroy

use crate::auth::PrincipalId;
use crate::errors::ApiError;
use crate::handlers::{check, parse_body};
use crate::models::{TaskListEnvelope, TaskListRow, WriteMode};
use crate::repositories::TaskListsRepository;
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
    ApiError::NotFound("Task list not found".to_string())
}

#[instrument(skip_all, name = "portal.handlers.list_task_lists")]
pub async fn list_task_lists(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<PrincipalId>,
) -> Result<Json<Vec<TaskListRow>>, ApiError> {
    let lists = TaskListsRepository::list(&state.pool, principal.as_str()).await?;
    Ok(Json(lists))
}

#[instrument(skip_all, name = "portal.handlers.create_task_list")]
pub async fn create_task_list(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<PrincipalId>,
    body: Bytes,
) -> Result<(StatusCode, Json<TaskListRow>), ApiError> {
    let request: TaskListEnvelope = parse_body(&body)?;
    check(request.task_list.validate(WriteMode::Create))?;

    let list =
        TaskListsRepository::create(&state.pool, principal.as_str(), &request.task_list).await?;
    Ok((StatusCode::CREATED, Json(list)))
}

#[instrument(skip_all, name = "portal.handlers.update_task_list", fields(task_list_id = %id))]
pub async fn update_task_list(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<PrincipalId>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<TaskListRow>, ApiError> {
    let request: TaskListEnvelope = parse_body(&body)?;
    check(request.task_list.validate(WriteMode::Update))?;

    TaskListsRepository::update(&state.pool, principal.as_str(), id, &request.task_list)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

#[instrument(skip_all, name = "portal.handlers.delete_task_list", fields(task_list_id = %id))]
pub async fn delete_task_list(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<PrincipalId>,
    Path(id): Path<Uuid>,
) -> Result<Json<TaskListRow>, ApiError> {
    TaskListsRepository::delete(&state.pool, principal.as_str(), id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}
