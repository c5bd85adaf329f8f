//! Task handlers.
//!
//! - `GET /api/v1/tasks` - list
//! - `POST /api/v1/tasks` - create
//! - `PATCH|PUT /api/v1/tasks/{id}` - update
//! - `DELETE /api/v1/tasks/{id}` - destroy (returns the deleted task)

use crate::auth::PrincipalId;
use crate::errors::ApiError;
use crate::handlers::{check, parse_body};
use crate::models::{TaskEnvelope, TaskRow, WriteMode};
use crate::repositories::TasksRepository;
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
    ApiError::NotFound("Task not found".to_string())
}

#[instrument(skip_all, name = "portal.handlers.list_tasks")]
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<PrincipalId>,
) -> Result<Json<Vec<TaskRow>>, ApiError> {
    let tasks = TasksRepository::list(&state.pool, principal.as_str()).await?;
    Ok(Json(tasks))
}

#[instrument(skip_all, name = "portal.handlers.create_task")]
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<PrincipalId>,
    body: Bytes,
) -> Result<(StatusCode, Json<TaskRow>), ApiError> {
    let request: TaskEnvelope = parse_body(&body)?;
    check(request.task.validate(WriteMode::Create))?;

    let task = TasksRepository::create(&state.pool, principal.as_str(), &request.task).await?;
    tracing::info!(target: "portal.handlers.tasks", task_id = %task.id, "Task created");
    Ok((StatusCode::CREATED, Json(task)))
}

#[instrument(skip_all, name = "portal.handlers.update_task", fields(task_id = %id))]
pub async fn update_task(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<PrincipalId>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<TaskRow>, ApiError> {
    let request: TaskEnvelope = parse_body(&body)?;
    check(request.task.validate(WriteMode::Update))?;

    TasksRepository::update(&state.pool, principal.as_str(), id, &request.task)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

#[instrument(skip_all, name = "portal.handlers.delete_task", fields(task_id = %id))]
pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<PrincipalId>,
    Path(id): Path<Uuid>,
) -> Result<Json<TaskRow>, ApiError> {
    TasksRepository::delete(&state.pool, principal.as_str(), id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}
