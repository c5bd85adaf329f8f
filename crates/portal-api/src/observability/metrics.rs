//! Metrics definitions for the Portal API.
//!
//! All metrics follow Prometheus naming conventions:
//! - `portal_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `endpoint`: parameterized paths, unknown paths collapse to `/other`
//! - `outcome`: `success` or an `AuthError` kind
//! - `status`: `success` or `error`
//! - `operation`: bounded by code (`tasks.list`, `cars.insert`, ...)

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize the Prometheus recorder and return the handle used by
/// `GET /metrics`.
///
/// # Errors
///
/// Returns error if the recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("portal_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.150, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("portal_db_query".to_string()),
            &[
                0.001, 0.002, 0.005, 0.010, 0.020, 0.050, 0.100, 0.250, 0.500, 1.000,
            ],
        )
        .map_err(|e| format!("Failed to set DB query buckets: {e}"))?
        // Certificate fetches are bounded by the key fetch timeout (max 60s)
        .set_buckets_for_metric(
            Matcher::Prefix("portal_signing_key_fetch".to_string()),
            &[
                0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.000,
            ],
        )
        .map_err(|e| format!("Failed to set signing key fetch buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `portal_http_requests_total`, `portal_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("portal_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint.clone(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("portal_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=399 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Replace row ids with placeholders.
fn normalize_endpoint(path: &str) -> String {
    match path {
        "/" | "/health" | "/ready" | "/metrics" | "/api/v1/me" | "/api/v1/tasks"
        | "/api/v1/task_lists" | "/api/v1/cars" | "/api/v1/notes" | "/api/v1/confidentials" => {
            return path.to_string()
        }
        _ => {}
    }

    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
    match segments.as_slice() {
        ["api", "v1", "tasks", _] => "/api/v1/tasks/{id}".to_string(),
        ["api", "v1", "task_lists", _] => "/api/v1/task_lists/{id}".to_string(),
        ["api", "v1", "cars", _] => "/api/v1/cars/{id}".to_string(),
        ["api", "v1", "cars", _, "refuelings"] => {
            "/api/v1/cars/{car_id}/refuelings".to_string()
        }
        ["api", "v1", "cars", _, "refuelings", _] => {
            "/api/v1/cars/{car_id}/refuelings/{id}".to_string()
        }
        ["api", "v1", "notes", _] => "/api/v1/notes/{id}".to_string(),
        ["api", "v1", "notes", _, "sections"] => "/api/v1/notes/{note_id}/sections".to_string(),
        ["api", "v1", "notes", _, "sections", _] => {
            "/api/v1/notes/{note_id}/sections/{id}".to_string()
        }
        ["api", "v1", "notes", _, "sections", _, "pages"] => {
            "/api/v1/notes/{note_id}/sections/{section_id}/pages".to_string()
        }
        ["api", "v1", "notes", _, "sections", _, "pages", _] => {
            "/api/v1/notes/{note_id}/sections/{section_id}/pages/{id}".to_string()
        }
        ["api", "v1", "confidentials", _] => "/api/v1/confidentials/{id}".to_string(),
        _ => "/other".to_string(),
    }
}

// ============================================================================
// Authentication Metrics
// ============================================================================

/// Record the outcome of one gate decision.
///
/// Metric: `portal_auth_attempts_total`
/// Labels: `outcome` (`success` or an `AuthError::kind()` value)
pub fn record_auth_attempt(outcome: &'static str) {
    counter!("portal_auth_attempts_total", "outcome" => outcome).increment(1);
}

/// Record a signing certificate fetch.
///
/// Metric: `portal_signing_key_fetch_total`, `portal_signing_key_fetch_duration_seconds`
/// Labels: `status`
pub fn record_signing_key_fetch(status: &'static str, duration: Duration) {
    histogram!("portal_signing_key_fetch_duration_seconds").record(duration.as_secs_f64());
    counter!("portal_signing_key_fetch_total", "status" => status).increment(1);
}

/// Record a signing key cache lookup.
///
/// Metric: `portal_signing_key_cache_total`
/// Labels: `result` (`hit`, `miss`)
pub fn record_signing_key_cache(result: &'static str) {
    counter!("portal_signing_key_cache_total", "result" => result).increment(1);
}

// ============================================================================
// Database Metrics
// ============================================================================

/// Record database query execution
///
/// Metric: `portal_db_queries_total`, `portal_db_query_duration_seconds`
/// Labels: `operation`, `status`
pub fn record_db_query(operation: &str, status: &str, duration: Duration) {
    histogram!("portal_db_query_duration_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("portal_db_queries_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}
