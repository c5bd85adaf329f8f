//! Task lists repository.
//!
//! `(seq, uid)` is unique; a clash surfaces as `ApiError::Conflict`.

use crate::errors::ApiError;
use crate::models::{TaskListParams, TaskListRow};
use crate::repositories::observe;
use sqlx::PgPool;
use std::time::Instant;
use tracing::instrument;
use uuid::Uuid;

const COLUMNS: &str = "id, name, seq, created_at, updated_at";

pub struct TaskListsRepository;

impl TaskListsRepository {
    #[instrument(skip_all, name = "portal.repo.list_task_lists")]
    pub async fn list(pool: &PgPool, uid: &str) -> Result<Vec<TaskListRow>, ApiError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, TaskListRow>(&format!(
            "SELECT {COLUMNS} FROM task_lists WHERE uid = $1 ORDER BY seq ASC"
        ))
        .bind(uid)
        .fetch_all(pool)
        .await;
        observe("task_lists.list", start, result)
    }

    #[instrument(skip_all, name = "portal.repo.create_task_list")]
    pub async fn create(
        pool: &PgPool,
        uid: &str,
        params: &TaskListParams,
    ) -> Result<TaskListRow, ApiError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, TaskListRow>(&format!(
            "INSERT INTO task_lists (name, seq, uid) VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        ))
        .bind(params.name.as_deref())
        .bind(params.seq)
        .bind(uid)
        .fetch_one(pool)
        .await;
        observe("task_lists.insert", start, result)
    }

    #[instrument(skip_all, name = "portal.repo.update_task_list")]
    pub async fn update(
        pool: &PgPool,
        uid: &str,
        id: Uuid,
        params: &TaskListParams,
    ) -> Result<Option<TaskListRow>, ApiError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, TaskListRow>(&format!(
            r#"
            UPDATE task_lists SET
                name = COALESCE($3, name),
                seq = COALESCE($4, seq),
                updated_at = NOW()
            WHERE id = $1 AND uid = $2
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(uid)
        .bind(params.name.as_deref())
        .bind(params.seq)
        .fetch_optional(pool)
        .await;
        observe("task_lists.update", start, result)
    }

    #[instrument(skip_all, name = "portal.repo.delete_task_list")]
    pub async fn delete(
        pool: &PgPool,
        uid: &str,
        id: Uuid,
    ) -> Result<Option<TaskListRow>, ApiError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, TaskListRow>(&format!(
            "DELETE FROM task_lists WHERE id = $1 AND uid = $2 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(uid)
        .fetch_optional(pool)
        .await;
        observe("task_lists.delete", start, result)
    }
}
