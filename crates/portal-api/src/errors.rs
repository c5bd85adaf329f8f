//! Portal API error types.
//!
//! All errors map to HTTP status codes via the `IntoResponse` impl. Messages
//! returned to clients are generic for server-side failures; actual errors
//! are logged.
//!
//! Body shape:
//!
//! ```json
//! { "error": { "code": "UNAUTHORIZED", "messages": ["Please log in"] } }
//! ```

use crate::auth::AuthError;
use axum::{
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Message returned for every authentication failure.
pub const UNAUTHORIZED_MESSAGE: &str = "Please log in";

/// Postgres SQLSTATE for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

/// Maps to:
/// - Database: 500 Internal Server Error
/// - Unauthorized: 401 Unauthorized
/// - NotFound: 404 Not Found
/// - Conflict: 409 Conflict
/// - BadRequest: 400 Bad Request
/// - Validation: 422 Unprocessable Entity
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Database error: {0}")]
    Database(String),

    /// Carries the gate's reason for logging only.
    #[error("Unauthorized: {0}")]
    Unauthorized(AuthError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Database(_) => 500,
            ApiError::Unauthorized(_) => 401,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::BadRequest(_) => 400,
            ApiError::Validation(_) => 422,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    messages: Vec<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, messages) = match self {
            ApiError::Database(err) => {
                tracing::error!(target: "portal.database", error = %err, "Database operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    vec!["An internal database error occurred".to_string()],
                )
            }
            ApiError::Unauthorized(_) => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                vec![UNAUTHORIZED_MESSAGE.to_string()],
            ),
            ApiError::NotFound(resource) => (StatusCode::NOT_FOUND, "NOT_FOUND", vec![resource]),
            ApiError::Conflict(reason) => (StatusCode::CONFLICT, "CONFLICT", vec![reason]),
            ApiError::BadRequest(reason) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", vec![reason]),
            ApiError::Validation(messages) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_FAILED",
                messages,
            ),
        };

        let mut response = (
            status,
            Json(ErrorResponse {
                error: ErrorDetail { code, messages },
            }),
        )
            .into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer realm=\"ynym-portal\", error=\"invalid_token\""),
            );
        }

        response
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::PrincipalLookup(e) => ApiError::Database(e),
            other => ApiError::Unauthorized(other),
        }
    }
}

/// Unique violations become `Conflict`; everything else is a database fault.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                return ApiError::Conflict("Record already exists".to_string());
            }
        }
        ApiError::Database(err.to_string())
    }
}
