//! Health check handlers.
//!
//! - `/health`: Liveness probe - returns OK if the process is running
//! - `/ready`: Readiness probe - checks the database

use crate::models::ReadinessResponse;
use crate::routes::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

/// Liveness probe. Does NOT check dependencies.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Readiness probe. 200 if the database answers, 503 otherwise.
///
/// Signing certificates are fetched on demand and are not part of
/// readiness; a provider outage only fails authenticated requests.
#[tracing::instrument(skip_all, name = "portal.health.readiness")]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match sqlx::query("SELECT 1").fetch_one(&state.pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(ReadinessResponse {
                status: "ready",
                database: "healthy",
            }),
        ),
        Err(e) => {
            tracing::warn!(target: "portal.health", error = %e, "Readiness check failed: database error");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessResponse {
                    status: "not_ready",
                    database: "unhealthy",
                }),
            )
        }
    }
}
