//! Token authentication gate.
//!
//! Turns an `Authorization` header value into a resolved principal:
//!
//! 1. Extract the final whitespace-separated segment as the token
//! 2. Verify the signature (mode-specific [`TokenVerifier`])
//! 3. Apply the shared [`ClaimsPolicy`]
//! 4. Resolve `sub` through the [`PrincipalStore`]
//!
//! Every outcome is logged at debug level and counted in
//! `portal_auth_attempts_total`.

use crate::auth::claims::ClaimsPolicy;
use crate::auth::error::AuthError;
use crate::auth::principal::{PrincipalId, PrincipalStore};
use crate::auth::verifier::TokenVerifier;
use crate::observability::metrics;
use common::jwt::extract_bearer_token;
use std::sync::Arc;
use tracing::instrument;

/// Decides whether a request is authenticated.
pub struct AuthGate {
    verifier: Arc<dyn TokenVerifier>,
    policy: ClaimsPolicy,
    principals: Arc<dyn PrincipalStore>,
}

impl AuthGate {
    pub fn new(
        verifier: Arc<dyn TokenVerifier>,
        policy: ClaimsPolicy,
        principals: Arc<dyn PrincipalStore>,
    ) -> Self {
        Self {
            verifier,
            policy,
            principals,
        }
    }

    /// Authenticate a request from its `Authorization` header value.
    ///
    /// # Errors
    ///
    /// Any [`AuthError`]; see the variant docs for the triggering condition.
    #[instrument(skip_all, name = "portal.auth.authenticate")]
    pub async fn authenticate(&self, header_value: Option<&str>) -> Result<PrincipalId, AuthError> {
        let result = self.run(header_value).await;

        match &result {
            Ok(_) => {
                tracing::debug!(target: "portal.auth.gate", "Request authenticated");
                metrics::record_auth_attempt("success");
            }
            Err(AuthError::PrincipalLookup(e)) => {
                tracing::error!(target: "portal.auth.gate", error = %e, "Principal lookup failed");
                metrics::record_auth_attempt("principal_lookup");
            }
            Err(e) => {
                tracing::debug!(target: "portal.auth.gate", outcome = e.kind(), error = %e, "Request rejected");
                metrics::record_auth_attempt(e.kind());
            }
        }

        result
    }

    async fn run(&self, header_value: Option<&str>) -> Result<PrincipalId, AuthError> {
        let token = extract_bearer_token(header_value).ok_or(AuthError::MissingToken)?;

        let claims = self.verifier.verify(token).await?;
        self.policy.validate(&claims)?;

        self.principals
            .resolve(&claims.sub)
            .await?
            .ok_or(AuthError::UnknownPrincipal)
    }
}
