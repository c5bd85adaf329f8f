//! Sections repository.
//!
//! Sections have no `uid` column. Every query joins the parent note and
//! matches its `uid`, so a section under another principal's note is
//! indistinguishable from a missing one. `(seq, note_id)` is unique.

use crate::errors::ApiError;
use crate::models::{SectionParams, SectionRow};
use crate::repositories::observe;
use sqlx::PgPool;
use std::time::Instant;
use tracing::instrument;
use uuid::Uuid;

// Qualified: `notes` shares most column names.
const COLUMNS: &str = "sections.id, sections.note_id, sections.name, sections.seq, \
                       sections.created_at, sections.updated_at";

pub struct SectionsRepository;

impl SectionsRepository {
    #[instrument(skip_all, name = "portal.repo.list_sections")]
    pub async fn list(pool: &PgPool, uid: &str, note_id: Uuid) -> Result<Vec<SectionRow>, ApiError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, SectionRow>(&format!(
            "SELECT {COLUMNS} FROM sections \
             JOIN notes ON notes.id = sections.note_id \
             WHERE sections.note_id = $1 AND notes.uid = $2 \
             ORDER BY sections.seq ASC"
        ))
        .bind(note_id)
        .bind(uid)
        .fetch_all(pool)
        .await;
        observe("sections.list", start, result)
    }

    #[instrument(skip_all, name = "portal.repo.find_section")]
    pub async fn find(
        pool: &PgPool,
        uid: &str,
        note_id: Uuid,
        id: Uuid,
    ) -> Result<Option<SectionRow>, ApiError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, SectionRow>(&format!(
            "SELECT {COLUMNS} FROM sections \
             JOIN notes ON notes.id = sections.note_id \
             WHERE sections.id = $1 AND sections.note_id = $2 AND notes.uid = $3"
        ))
        .bind(id)
        .bind(note_id)
        .bind(uid)
        .fetch_optional(pool)
        .await;
        observe("sections.find", start, result)
    }

    /// True if section `id` sits under `note_id` and that note belongs to `uid`.
    #[instrument(skip_all, name = "portal.repo.section_owned")]
    pub async fn is_owned(
        pool: &PgPool,
        uid: &str,
        note_id: Uuid,
        id: Uuid,
    ) -> Result<bool, ApiError> {
        let start = Instant::now();
        let result: Result<bool, sqlx::Error> = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM sections \
             JOIN notes ON notes.id = sections.note_id \
             WHERE sections.id = $1 AND sections.note_id = $2 AND notes.uid = $3)",
        )
        .bind(id)
        .bind(note_id)
        .bind(uid)
        .fetch_one(pool)
        .await;
        observe("sections.is_owned", start, result)
    }

    /// Returns `None` when the note is missing or not owned by `uid`.
    #[instrument(skip_all, name = "portal.repo.create_section")]
    pub async fn create(
        pool: &PgPool,
        uid: &str,
        note_id: Uuid,
        params: &SectionParams,
    ) -> Result<Option<SectionRow>, ApiError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, SectionRow>(&format!(
            r#"
            INSERT INTO sections (note_id, name, seq)
            SELECT notes.id, $3, $4 FROM notes WHERE notes.id = $1 AND notes.uid = $2
            RETURNING {COLUMNS}
            "#
        ))
        .bind(note_id) // $1
        .bind(uid) // $2
        .bind(params.name.as_deref()) // $3
        .bind(params.seq) // $4
        .fetch_optional(pool)
        .await;
        observe("sections.insert", start, result)
    }

    #[instrument(skip_all, name = "portal.repo.update_section")]
    pub async fn update(
        pool: &PgPool,
        uid: &str,
        note_id: Uuid,
        id: Uuid,
        params: &SectionParams,
    ) -> Result<Option<SectionRow>, ApiError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, SectionRow>(&format!(
            r#"
            UPDATE sections SET
                name = COALESCE($4, sections.name),
                seq = COALESCE($5, sections.seq),
                updated_at = NOW()
            FROM notes
            WHERE notes.id = sections.note_id
              AND sections.id = $1 AND sections.note_id = $2 AND notes.uid = $3
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id) // $1
        .bind(note_id) // $2
        .bind(uid) // $3
        .bind(params.name.as_deref()) // $4
        .bind(params.seq) // $5
        .fetch_optional(pool)
        .await;
        observe("sections.update", start, result)
    }

    #[instrument(skip_all, name = "portal.repo.delete_section")]
    pub async fn delete(
        pool: &PgPool,
        uid: &str,
        note_id: Uuid,
        id: Uuid,
    ) -> Result<Option<SectionRow>, ApiError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, SectionRow>(&format!(
            "DELETE FROM sections USING notes \
             WHERE notes.id = sections.note_id \
               AND sections.id = $1 AND sections.note_id = $2 AND notes.uid = $3 \
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(note_id)
        .bind(uid)
        .fetch_optional(pool)
        .await;
        observe("sections.delete", start, result)
    }
}
