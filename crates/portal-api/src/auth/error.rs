//! Authentication failure taxonomy.
//!
//! Every variant except `PrincipalLookup` collapses to the same 401 response
//! at the HTTP boundary. The variant itself is only logged and counted.

use thiserror::Error;

/// Why a token's claims were rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimsViolation {
    IssuerMismatch,
    AudienceMismatch,
    AuthTimeInFuture,
    MissingAuthTime,
    EmptySubject,
    Expired,
}

impl ClaimsViolation {
    /// Metric/log label.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimsViolation::IssuerMismatch => "issuer_mismatch",
            ClaimsViolation::AudienceMismatch => "audience_mismatch",
            ClaimsViolation::AuthTimeInFuture => "auth_time_in_future",
            ClaimsViolation::MissingAuthTime => "missing_auth_time",
            ClaimsViolation::EmptySubject => "empty_subject",
            ClaimsViolation::Expired => "expired",
        }
    }
}

impl std::fmt::Display for ClaimsViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token authentication gate errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authorization header missing or empty")]
    MissingToken,

    #[error("Token could not be parsed")]
    MalformedToken,

    #[error("Signing key fetch failed: {0}")]
    KeyFetch(String),

    #[error("No signing key for kid '{kid}'")]
    UnknownKey { kid: String },

    #[error("Token signature verification failed")]
    BadSignature,

    #[error("Token claims rejected: {reason}")]
    InvalidClaims { reason: ClaimsViolation },

    #[error("Token subject has no local user record")]
    UnknownPrincipal,

    #[error("Principal lookup failed: {0}")]
    PrincipalLookup(String),
}

impl AuthError {
    /// Stable label for the `outcome` metric dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing_token",
            AuthError::MalformedToken => "malformed_token",
            AuthError::KeyFetch(_) => "key_fetch",
            AuthError::UnknownKey { .. } => "unknown_key",
            AuthError::BadSignature => "bad_signature",
            AuthError::InvalidClaims { .. } => "invalid_claims",
            AuthError::UnknownPrincipal => "unknown_principal",
            AuthError::PrincipalLookup(_) => "principal_lookup",
        }
    }

    pub(crate) fn claims(reason: ClaimsViolation) -> Self {
        AuthError::InvalidClaims { reason }
    }
}

impl From<common::jwt::JwtValidationError> for AuthError {
    fn from(_: common::jwt::JwtValidationError) -> Self {
        AuthError::MalformedToken
    }
}
