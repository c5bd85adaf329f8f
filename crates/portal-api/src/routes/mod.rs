//! HTTP routes for the Portal API.
//!
//! Defines the Axum router and application state.

use crate::auth::AuthGate;
use crate::handlers::{
    self, cars, confidentials, notes, pages, refuelings, sections, task_lists, tasks,
};
use crate::middleware::{http_metrics_middleware, require_auth};
use axum::{
    middleware,
    routing::{get, patch},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: PgPool,
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/health` - Liveness probe (simple "OK") - public
/// - `/ready` - Readiness probe (checks DB) - public
/// - `/metrics` - Prometheus metrics endpoint - public
/// - `/api/v1/me` - Current user
/// - `/api/v1/tasks`, `/api/v1/task_lists`, `/api/v1/cars` - CRUD
/// - `/api/v1/cars/{car_id}/refuelings` - CRUD nested under a car
/// - `/api/v1/notes`, with `sections` and their `pages` nested beneath
/// - `/api/v1/confidentials` - stored service credentials
///
/// Everything under `/api/v1` passes through the [`AuthGate`].
pub fn build_routes(
    state: Arc<AppState>,
    gate: Arc<AuthGate>,
    metrics_handle: PrometheusHandle,
) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .with_state(state.clone());

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/api/v1/me", get(handlers::get_me))
        .route(
            "/api/v1/tasks",
            get(tasks::list_tasks).post(tasks::create_task),
        )
        .route(
            "/api/v1/tasks/:id",
            patch(tasks::update_task)
                .put(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route(
            "/api/v1/task_lists",
            get(task_lists::list_task_lists).post(task_lists::create_task_list),
        )
        .route(
            "/api/v1/task_lists/:id",
            patch(task_lists::update_task_list)
                .put(task_lists::update_task_list)
                .delete(task_lists::delete_task_list),
        )
        .route("/api/v1/cars", get(cars::list_cars).post(cars::create_car))
        .route(
            "/api/v1/cars/:id",
            get(cars::get_car)
                .patch(cars::update_car)
                .put(cars::update_car)
                .delete(cars::delete_car),
        )
        .route(
            "/api/v1/cars/:car_id/refuelings",
            get(refuelings::list_refuelings).post(refuelings::create_refueling),
        )
        .route(
            "/api/v1/cars/:car_id/refuelings/:id",
            get(refuelings::get_refueling)
                .patch(refuelings::update_refueling)
                .put(refuelings::update_refueling)
                .delete(refuelings::delete_refueling),
        )
        .route(
            "/api/v1/notes",
            get(notes::list_notes).post(notes::create_note),
        )
        .route(
            "/api/v1/notes/:id",
            get(notes::get_note)
                .patch(notes::update_note)
                .put(notes::update_note)
                .delete(notes::delete_note),
        )
        .route(
            "/api/v1/notes/:note_id/sections",
            get(sections::list_sections).post(sections::create_section),
        )
        .route(
            "/api/v1/notes/:note_id/sections/:id",
            get(sections::get_section)
                .patch(sections::update_section)
                .put(sections::update_section)
                .delete(sections::delete_section),
        )
        .route(
            "/api/v1/notes/:note_id/sections/:section_id/pages",
            get(pages::list_pages).post(pages::create_page),
        )
        .route(
            "/api/v1/notes/:note_id/sections/:section_id/pages/:id",
            get(pages::get_page)
                .patch(pages::update_page)
                .put(pages::update_page)
                .delete(pages::delete_page),
        )
        .route(
            "/api/v1/confidentials",
            get(confidentials::list_confidentials).post(confidentials::create_confidential),
        )
        .route(
            "/api/v1/confidentials/:id",
            get(confidentials::get_confidential)
                .patch(confidentials::update_confidential)
                .put(confidentials::update_confidential)
                .delete(confidentials::delete_confidential),
        )
        .route_layer(middleware::from_fn_with_state(gate, require_auth))
        .with_state(state);

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details
    // 3. http_metrics_middleware - Record ALL responses (outermost)
    public_routes
        .merge(metrics_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(middleware::from_fn(http_metrics_middleware))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }
}
