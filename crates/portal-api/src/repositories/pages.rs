//! Pages repository.
//!
//! Pages reach their owner through section then note. `(seq, section_id)`
//! is unique.

use crate::errors::ApiError;
use crate::models::{PageParams, PageRow};
use crate::repositories::observe;
use sqlx::PgPool;
use std::time::Instant;
use tracing::instrument;
use uuid::Uuid;

const COLUMNS: &str = "pages.id, pages.section_id, pages.title, pages.content, pages.seq, \
                       pages.created_at, pages.updated_at";

const OWNER_JOIN: &str = "JOIN sections ON sections.id = pages.section_id \
                          JOIN notes ON notes.id = sections.note_id";

pub struct PagesRepository;

impl PagesRepository {
    #[instrument(skip_all, name = "portal.repo.list_pages")]
    pub async fn list(pool: &PgPool, uid: &str, section_id: Uuid) -> Result<Vec<PageRow>, ApiError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, PageRow>(&format!(
            "SELECT {COLUMNS} FROM pages {OWNER_JOIN} \
             WHERE pages.section_id = $1 AND notes.uid = $2 \
             ORDER BY pages.seq ASC"
        ))
        .bind(section_id)
        .bind(uid)
        .fetch_all(pool)
        .await;
        observe("pages.list", start, result)
    }

    #[instrument(skip_all, name = "portal.repo.find_page")]
    pub async fn find(
        pool: &PgPool,
        uid: &str,
        section_id: Uuid,
        id: Uuid,
    ) -> Result<Option<PageRow>, ApiError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, PageRow>(&format!(
            "SELECT {COLUMNS} FROM pages {OWNER_JOIN} \
             WHERE pages.id = $1 AND pages.section_id = $2 AND notes.uid = $3"
        ))
        .bind(id)
        .bind(section_id)
        .bind(uid)
        .fetch_optional(pool)
        .await;
        observe("pages.find", start, result)
    }

    /// Returns `None` when the section is missing or its note is not owned by `uid`.
    #[instrument(skip_all, name = "portal.repo.create_page")]
    pub async fn create(
        pool: &PgPool,
        uid: &str,
        section_id: Uuid,
        params: &PageParams,
    ) -> Result<Option<PageRow>, ApiError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, PageRow>(&format!(
            r#"
            INSERT INTO pages (section_id, title, content, seq)
            SELECT sections.id, $3, $4, $5
            FROM sections JOIN notes ON notes.id = sections.note_id
            WHERE sections.id = $1 AND notes.uid = $2
            RETURNING {COLUMNS}
            "#
        ))
        .bind(section_id) // $1
        .bind(uid) // $2
        .bind(params.title.as_deref()) // $3
        .bind(params.content.as_deref()) // $4
        .bind(params.seq) // $5
        .fetch_optional(pool)
        .await;
        observe("pages.insert", start, result)
    }

    #[instrument(skip_all, name = "portal.repo.update_page")]
    pub async fn update(
        pool: &PgPool,
        uid: &str,
        section_id: Uuid,
        id: Uuid,
        params: &PageParams,
    ) -> Result<Option<PageRow>, ApiError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, PageRow>(&format!(
            r#"
            UPDATE pages SET
                title = COALESCE($4, pages.title),
                content = COALESCE($5, pages.content),
                seq = COALESCE($6, pages.seq),
                updated_at = NOW()
            FROM sections JOIN notes ON notes.id = sections.note_id
            WHERE sections.id = pages.section_id
              AND pages.id = $1 AND pages.section_id = $2 AND notes.uid = $3
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id) // $1
        .bind(section_id) // $2
        .bind(uid) // $3
        .bind(params.title.as_deref()) // $4
        .bind(params.content.as_deref()) // $5
        .bind(params.seq) // $6
        .fetch_optional(pool)
        .await;
        observe("pages.update", start, result)
    }

    #[instrument(skip_all, name = "portal.repo.delete_page")]
    pub async fn delete(
        pool: &PgPool,
        uid: &str,
        section_id: Uuid,
        id: Uuid,
    ) -> Result<Option<PageRow>, ApiError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, PageRow>(&format!(
            "DELETE FROM pages USING sections JOIN notes ON notes.id = sections.note_id \
             WHERE sections.id = pages.section_id \
               AND pages.id = $1 AND pages.section_id = $2 AND notes.uid = $3 \
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(section_id)
        .bind(uid)
        .fetch_optional(pool)
        .await;
        observe("pages.delete", start, result)
    }
}
