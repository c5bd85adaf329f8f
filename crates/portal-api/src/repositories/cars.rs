//! Cars repository.
//!
//! `(seq, uid)` is unique; a clash surfaces as `ApiError::Conflict`.
//! Deleting a car cascades to its refuelings (foreign key).

use crate::errors::ApiError;
use crate::models::{CarParams, CarRow};
use crate::repositories::observe;
use sqlx::PgPool;
use std::time::Instant;
use tracing::instrument;
use uuid::Uuid;

const COLUMNS: &str = "id, name, seq, maker, model, model_year, license_plate, tank_capacity, \
                       created_at, updated_at";

pub struct CarsRepository;

impl CarsRepository {
    #[instrument(skip_all, name = "portal.repo.list_cars")]
    pub async fn list(pool: &PgPool, uid: &str) -> Result<Vec<CarRow>, ApiError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, CarRow>(&format!(
            "SELECT {COLUMNS} FROM cars WHERE uid = $1 ORDER BY seq ASC"
        ))
        .bind(uid)
        .fetch_all(pool)
        .await;
        observe("cars.list", start, result)
    }

    #[instrument(skip_all, name = "portal.repo.find_car")]
    pub async fn find(pool: &PgPool, uid: &str, id: Uuid) -> Result<Option<CarRow>, ApiError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, CarRow>(&format!(
            "SELECT {COLUMNS} FROM cars WHERE id = $1 AND uid = $2"
        ))
        .bind(id)
        .bind(uid)
        .fetch_optional(pool)
        .await;
        observe("cars.find", start, result)
    }

    /// True if `id` exists and belongs to `uid`.
    #[instrument(skip_all, name = "portal.repo.car_owned")]
    pub async fn is_owned(pool: &PgPool, uid: &str, id: Uuid) -> Result<bool, ApiError> {
        let start = Instant::now();
        let result: Result<bool, sqlx::Error> =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM cars WHERE id = $1 AND uid = $2)")
                .bind(id)
                .bind(uid)
                .fetch_one(pool)
                .await;
        observe("cars.is_owned", start, result)
    }

    #[instrument(skip_all, name = "portal.repo.create_car")]
    pub async fn create(pool: &PgPool, uid: &str, params: &CarParams) -> Result<CarRow, ApiError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, CarRow>(&format!(
            r#"
            INSERT INTO cars (
                name, seq, maker, model, model_year, license_plate, tank_capacity, uid
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(params.name.as_deref()) // $1
        .bind(params.seq) // $2
        .bind(params.maker.as_deref()) // $3
        .bind(params.model.as_deref()) // $4
        .bind(params.model_year) // $5
        .bind(params.license_plate.as_deref()) // $6
        .bind(params.tank_capacity) // $7
        .bind(uid) // $8
        .fetch_one(pool)
        .await;
        observe("cars.insert", start, result)
    }

    #[instrument(skip_all, name = "portal.repo.update_car")]
    pub async fn update(
        pool: &PgPool,
        uid: &str,
        id: Uuid,
        params: &CarParams,
    ) -> Result<Option<CarRow>, ApiError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, CarRow>(&format!(
            r#"
            UPDATE cars SET
                name = COALESCE($3, name),
                seq = COALESCE($4, seq),
                maker = COALESCE($5, maker),
                model = COALESCE($6, model),
                model_year = COALESCE($7, model_year),
                license_plate = COALESCE($8, license_plate),
                tank_capacity = COALESCE($9, tank_capacity),
                updated_at = NOW()
            WHERE id = $1 AND uid = $2
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id) // $1
        .bind(uid) // $2
        .bind(params.name.as_deref()) // $3
        .bind(params.seq) // $4
        .bind(params.maker.as_deref()) // $5
        .bind(params.model.as_deref()) // $6
        .bind(params.model_year) // $7
        .bind(params.license_plate.as_deref()) // $8
        .bind(params.tank_capacity) // $9
        .fetch_optional(pool)
        .await;
        observe("cars.update", start, result)
    }

    #[instrument(skip_all, name = "portal.repo.delete_car")]
    pub async fn delete(pool: &PgPool, uid: &str, id: Uuid) -> Result<Option<CarRow>, ApiError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, CarRow>(&format!(
            "DELETE FROM cars WHERE id = $1 AND uid = $2 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(uid)
        .fetch_optional(pool)
        .await;
        observe("cars.delete", start, result)
    }
}
