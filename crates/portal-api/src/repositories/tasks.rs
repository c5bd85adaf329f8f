//! Tasks repository.

use crate::errors::ApiError;
use crate::models::{TaskParams, TaskRow};
use crate::repositories::observe;
use sqlx::PgPool;
use std::time::Instant;
use tracing::instrument;
use uuid::Uuid;

const COLUMNS: &str = "id, title, description, dead_line, is_complete, created_at, updated_at";

pub struct TasksRepository;

impl TasksRepository {
    /// Tasks owned by `uid`, by deadline then creation time.
    #[instrument(skip_all, name = "portal.repo.list_tasks")]
    pub async fn list(pool: &PgPool, uid: &str) -> Result<Vec<TaskRow>, ApiError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {COLUMNS} FROM tasks WHERE uid = $1 ORDER BY dead_line ASC NULLS LAST, created_at ASC"
        ))
        .bind(uid)
        .fetch_all(pool)
        .await;
        observe("tasks.list", start, result)
    }

    /// Caller must have validated `params` for create.
    #[instrument(skip_all, name = "portal.repo.create_task")]
    pub async fn create(pool: &PgPool, uid: &str, params: &TaskParams) -> Result<TaskRow, ApiError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            INSERT INTO tasks (title, description, dead_line, is_complete, uid)
            VALUES ($1, $2, $3, COALESCE($4, false), $5)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(params.title.as_deref()) // $1
        .bind(params.description.as_deref()) // $2
        .bind(params.dead_line) // $3
        .bind(params.is_complete) // $4
        .bind(uid) // $5
        .fetch_one(pool)
        .await;
        observe("tasks.insert", start, result)
    }

    /// Apply the present fields. `None` if no such task belongs to `uid`.
    #[instrument(skip_all, name = "portal.repo.update_task")]
    pub async fn update(
        pool: &PgPool,
        uid: &str,
        id: Uuid,
        params: &TaskParams,
    ) -> Result<Option<TaskRow>, ApiError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            UPDATE tasks SET
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                dead_line = COALESCE($5, dead_line),
                is_complete = COALESCE($6, is_complete),
                updated_at = NOW()
            WHERE id = $1 AND uid = $2
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id) // $1
        .bind(uid) // $2
        .bind(params.title.as_deref()) // $3
        .bind(params.description.as_deref()) // $4
        .bind(params.dead_line) // $5
        .bind(params.is_complete) // $6
        .fetch_optional(pool)
        .await;
        observe("tasks.update", start, result)
    }

    /// Delete and return the row. `None` if no such task belongs to `uid`.
    #[instrument(skip_all, name = "portal.repo.delete_task")]
    pub async fn delete(pool: &PgPool, uid: &str, id: Uuid) -> Result<Option<TaskRow>, ApiError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, TaskRow>(&format!(
            "DELETE FROM tasks WHERE id = $1 AND uid = $2 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(uid)
        .fetch_optional(pool)
        .await;
        observe("tasks.delete", start, result)
    }
}
