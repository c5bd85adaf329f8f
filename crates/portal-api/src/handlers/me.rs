//! Current user handler.

use crate::auth::PrincipalId;
use crate::models::MeResponse;
use axum::{Extension, Json};
use tracing::instrument;

/// Handler for GET /api/v1/me
///
/// Echoes the principal resolved by the auth middleware.
#[instrument(skip_all, name = "portal.handlers.me")]
pub async fn get_me(Extension(principal): Extension<PrincipalId>) -> Json<MeResponse> {
    Json(MeResponse {
        uid: principal.as_str().to_string(),
    })
}
