//! Notes repository.
//!
//! `(seq, uid)` is unique. Deleting a note cascades to its sections and
//! their pages.

use crate::errors::ApiError;
use crate::models::{NoteParams, NoteRow};
use crate::repositories::observe;
use sqlx::PgPool;
use std::time::Instant;
use tracing::instrument;
use uuid::Uuid;

const COLUMNS: &str = "id, name, seq, created_at, updated_at";

pub struct NotesRepository;

impl NotesRepository {
    #[instrument(skip_all, name = "portal.repo.list_notes")]
    pub async fn list(pool: &PgPool, uid: &str) -> Result<Vec<NoteRow>, ApiError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, NoteRow>(&format!(
            "SELECT {COLUMNS} FROM notes WHERE uid = $1 ORDER BY seq ASC"
        ))
        .bind(uid)
        .fetch_all(pool)
        .await;
        observe("notes.list", start, result)
    }

    #[instrument(skip_all, name = "portal.repo.find_note")]
    pub async fn find(pool: &PgPool, uid: &str, id: Uuid) -> Result<Option<NoteRow>, ApiError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, NoteRow>(&format!(
            "SELECT {COLUMNS} FROM notes WHERE id = $1 AND uid = $2"
        ))
        .bind(id)
        .bind(uid)
        .fetch_optional(pool)
        .await;
        observe("notes.find", start, result)
    }

    /// True if `id` exists and belongs to `uid`.
    #[instrument(skip_all, name = "portal.repo.note_owned")]
    pub async fn is_owned(pool: &PgPool, uid: &str, id: Uuid) -> Result<bool, ApiError> {
        let start = Instant::now();
        let result: Result<bool, sqlx::Error> =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM notes WHERE id = $1 AND uid = $2)")
                .bind(id)
                .bind(uid)
                .fetch_one(pool)
                .await;
        observe("notes.is_owned", start, result)
    }

    #[instrument(skip_all, name = "portal.repo.create_note")]
    pub async fn create(pool: &PgPool, uid: &str, params: &NoteParams) -> Result<NoteRow, ApiError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, NoteRow>(&format!(
            "INSERT INTO notes (name, seq, uid) VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        ))
        .bind(params.name.as_deref())
        .bind(params.seq)
        .bind(uid)
        .fetch_one(pool)
        .await;
        observe("notes.insert", start, result)
    }

    #[instrument(skip_all, name = "portal.repo.update_note")]
    pub async fn update(
        pool: &PgPool,
        uid: &str,
        id: Uuid,
        params: &NoteParams,
    ) -> Result<Option<NoteRow>, ApiError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, NoteRow>(&format!(
            r#"
            UPDATE notes SET
                name = COALESCE($3, name),
                seq = COALESCE($4, seq),
                updated_at = NOW()
            WHERE id = $1 AND uid = $2
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id) // $1
        .bind(uid) // $2
        .bind(params.name.as_deref()) // $3
        .bind(params.seq) // $4
        .fetch_optional(pool)
        .await;
        observe("notes.update", start, result)
    }

    #[instrument(skip_all, name = "portal.repo.delete_note")]
    pub async fn delete(pool: &PgPool, uid: &str, id: Uuid) -> Result<Option<NoteRow>, ApiError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, NoteRow>(&format!(
            "DELETE FROM notes WHERE id = $1 AND uid = $2 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(uid)
        .fetch_optional(pool)
        .await;
        observe("notes.delete", start, result)
    }
}
