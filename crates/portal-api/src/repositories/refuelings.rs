//! Refuelings repository.
//!
//! Refuelings are nested under a car. Every query matches both the parent
//! `car_id` and the principal's `uid`; handlers additionally confirm the
//! car itself is owned so a foreign car reads as 404.

use crate::errors::ApiError;
use crate::models::{RefuelingParams, RefuelingRow};
use crate::repositories::observe;
use sqlx::PgPool;
use std::time::Instant;
use tracing::instrument;
use uuid::Uuid;

const COLUMNS: &str = "id, car_id, refuel_datetime, odometer, fuel_type, price, total_cost, \
                       is_full, gas_stand, created_at, updated_at";

pub struct RefuelingsRepository;

impl RefuelingsRepository {
    /// Newest first.
    #[instrument(skip_all, name = "portal.repo.list_refuelings")]
    pub async fn list(pool: &PgPool, uid: &str, car_id: Uuid) -> Result<Vec<RefuelingRow>, ApiError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, RefuelingRow>(&format!(
            "SELECT {COLUMNS} FROM refuelings WHERE car_id = $1 AND uid = $2 \
             ORDER BY refuel_datetime DESC"
        ))
        .bind(car_id)
        .bind(uid)
        .fetch_all(pool)
        .await;
        observe("refuelings.list", start, result)
    }

    #[instrument(skip_all, name = "portal.repo.find_refueling")]
    pub async fn find(
        pool: &PgPool,
        uid: &str,
        car_id: Uuid,
        id: Uuid,
    ) -> Result<Option<RefuelingRow>, ApiError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, RefuelingRow>(&format!(
            "SELECT {COLUMNS} FROM refuelings WHERE id = $1 AND car_id = $2 AND uid = $3"
        ))
        .bind(id)
        .bind(car_id)
        .bind(uid)
        .fetch_optional(pool)
        .await;
        observe("refuelings.find", start, result)
    }

    #[instrument(skip_all, name = "portal.repo.create_refueling")]
    pub async fn create(
        pool: &PgPool,
        uid: &str,
        car_id: Uuid,
        params: &RefuelingParams,
    ) -> Result<RefuelingRow, ApiError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, RefuelingRow>(&format!(
            r#"
            INSERT INTO refuelings (
                refuel_datetime, odometer, fuel_type, price, total_cost,
                is_full, gas_stand, car_id, uid
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(params.refuel_datetime) // $1
        .bind(params.odometer) // $2
        .bind(params.fuel_type.as_deref()) // $3
        .bind(params.price) // $4
        .bind(params.total_cost) // $5
        .bind(params.is_full) // $6
        .bind(params.gas_stand.as_deref()) // $7
        .bind(car_id) // $8
        .bind(uid) // $9
        .fetch_one(pool)
        .await;
        observe("refuelings.insert", start, result)
    }

    #[instrument(skip_all, name = "portal.repo.update_refueling")]
    pub async fn update(
        pool: &PgPool,
        uid: &str,
        car_id: Uuid,
        id: Uuid,
        params: &RefuelingParams,
    ) -> Result<Option<RefuelingRow>, ApiError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, RefuelingRow>(&format!(
            r#"
            UPDATE refuelings SET
                refuel_datetime = COALESCE($4, refuel_datetime),
                odometer = COALESCE($5, odometer),
                fuel_type = COALESCE($6, fuel_type),
                price = COALESCE($7, price),
                total_cost = COALESCE($8, total_cost),
                is_full = COALESCE($9, is_full),
                gas_stand = COALESCE($10, gas_stand),
                updated_at = NOW()
            WHERE id = $1 AND car_id = $2 AND uid = $3
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id) // $1
        .bind(car_id) // $2
        .bind(uid) // $3
        .bind(params.refuel_datetime) // $4
        .bind(params.odometer) // $5
        .bind(params.fuel_type.as_deref()) // $6
        .bind(params.price) // $7
        .bind(params.total_cost) // $8
        .bind(params.is_full) // $9
        .bind(params.gas_stand.as_deref()) // $10
        .fetch_optional(pool)
        .await;
        observe("refuelings.update", start, result)
    }

    #[instrument(skip_all, name = "portal.repo.delete_refueling")]
    pub async fn delete(
        pool: &PgPool,
        uid: &str,
        car_id: Uuid,
        id: Uuid,
    ) -> Result<Option<RefuelingRow>, ApiError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, RefuelingRow>(&format!(
            "DELETE FROM refuelings WHERE id = $1 AND car_id = $2 AND uid = $3 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(car_id)
        .bind(uid)
        .fetch_optional(pool)
        .await;
        observe("refuelings.delete", start, result)
    }
}
