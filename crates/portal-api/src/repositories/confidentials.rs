//! Confidentials repository.
//!
//! The password is bound from the exposed secret and never logged; spans
//! here skip every argument.

use crate::errors::ApiError;
use crate::models::{ConfidentialParams, ConfidentialRow};
use crate::repositories::observe;
use sqlx::PgPool;
use std::time::Instant;
use tracing::instrument;
use uuid::Uuid;

const COLUMNS: &str = "id, service_name, login_id, password, other, created_at, updated_at";

pub struct ConfidentialsRepository;

impl ConfidentialsRepository {
    /// Oldest first.
    #[instrument(skip_all, name = "portal.repo.list_confidentials")]
    pub async fn list(pool: &PgPool, uid: &str) -> Result<Vec<ConfidentialRow>, ApiError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, ConfidentialRow>(&format!(
            "SELECT {COLUMNS} FROM confidentials WHERE uid = $1 ORDER BY created_at ASC"
        ))
        .bind(uid)
        .fetch_all(pool)
        .await;
        observe("confidentials.list", start, result)
    }

    #[instrument(skip_all, name = "portal.repo.find_confidential")]
    pub async fn find(
        pool: &PgPool,
        uid: &str,
        id: Uuid,
    ) -> Result<Option<ConfidentialRow>, ApiError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, ConfidentialRow>(&format!(
            "SELECT {COLUMNS} FROM confidentials WHERE id = $1 AND uid = $2"
        ))
        .bind(id)
        .bind(uid)
        .fetch_optional(pool)
        .await;
        observe("confidentials.find", start, result)
    }

    #[instrument(skip_all, name = "portal.repo.create_confidential")]
    pub async fn create(
        pool: &PgPool,
        uid: &str,
        params: &ConfidentialParams,
    ) -> Result<ConfidentialRow, ApiError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, ConfidentialRow>(&format!(
            r#"
            INSERT INTO confidentials (service_name, login_id, password, other, uid)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(params.service_name.as_deref()) // $1
        .bind(params.login_id.as_deref()) // $2
        .bind(params.exposed_password()) // $3
        .bind(params.other.as_deref()) // $4
        .bind(uid) // $5
        .fetch_one(pool)
        .await;
        observe("confidentials.insert", start, result)
    }

    #[instrument(skip_all, name = "portal.repo.update_confidential")]
    pub async fn update(
        pool: &PgPool,
        uid: &str,
        id: Uuid,
        params: &ConfidentialParams,
    ) -> Result<Option<ConfidentialRow>, ApiError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, ConfidentialRow>(&format!(
            r#"
            UPDATE confidentials SET
                service_name = COALESCE($3, service_name),
                login_id = COALESCE($4, login_id),
                password = COALESCE($5, password),
                other = COALESCE($6, other),
                updated_at = NOW()
            WHERE id = $1 AND uid = $2
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id) // $1
        .bind(uid) // $2
        .bind(params.service_name.as_deref()) // $3
        .bind(params.login_id.as_deref()) // $4
        .bind(params.exposed_password()) // $5
        .bind(params.other.as_deref()) // $6
        .fetch_optional(pool)
        .await;
        observe("confidentials.update", start, result)
    }

    #[instrument(skip_all, name = "portal.repo.delete_confidential")]
    pub async fn delete(
        pool: &PgPool,
        uid: &str,
        id: Uuid,
    ) -> Result<Option<ConfidentialRow>, ApiError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, ConfidentialRow>(&format!(
            "DELETE FROM confidentials WHERE id = $1 AND uid = $2 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(uid)
        .fetch_optional(pool)
        .await;
        observe("confidentials.delete", start, result)
    }
}
