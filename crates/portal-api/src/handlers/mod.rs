//! HTTP request handlers.

pub mod cars;
pub mod confidentials;
pub mod health;
pub mod me;
pub mod metrics;
pub mod notes;
pub mod pages;
pub mod refuelings;
pub mod sections;
pub mod task_lists;
pub mod tasks;

pub use health::{health_check, readiness_check};
pub use me::get_me;
pub use metrics::metrics_handler;

use crate::errors::ApiError;
use serde::de::DeserializeOwned;

/// Deserialize a JSON request body, answering 400 (not axum's plain-text
/// rejection) on failure.
pub(crate) fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(target: "portal.handlers", error = %e, "Invalid request body");
        ApiError::BadRequest("Invalid request body".to_string())
    })
}

/// Turn model validation messages into a 422.
pub(crate) fn check(validation: Result<(), Vec<&'static str>>) -> Result<(), ApiError> {
    validation.map_err(|messages| {
        ApiError::Validation(messages.into_iter().map(str::to_string).collect())
    })
}
