//! Authentication middleware for protected routes.
//!
//! Runs the [`AuthGate`] against the `Authorization` header and injects the
//! resolved [`PrincipalId`] into request extensions.

use crate::auth::{AuthGate, PrincipalId};
use crate::errors::ApiError;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::instrument;

/// # Response
///
/// - 401 with `WWW-Authenticate` for every gate rejection
/// - 500 if the principal store is unavailable
/// - Otherwise continues with `PrincipalId` in extensions
#[instrument(skip_all, name = "portal.middleware.auth")]
pub async fn require_auth(
    State(gate): State<Arc<AuthGate>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    // A header that is not valid visible ASCII is treated as absent
    let header_value = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let principal: PrincipalId = gate.authenticate(header_value).await?;

    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}
