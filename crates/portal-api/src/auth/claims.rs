//! Verification claims and the policy that checks them.
//!
//! The `sub` and `email` fields are redacted in Debug output to prevent
//! exposure in logs.

use crate::auth::error::{AuthError, ClaimsViolation};
use crate::config::{AuthConfig, AuthMode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The `aud` claim, which may be a single string or an array.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    /// True if `expected` is (or is among) the token's audiences.
    pub fn contains(&self, expected: &str) -> bool {
        match self {
            Audience::One(aud) => aud == expected,
            Audience::Many(auds) => auds.iter().any(|aud| aud == expected),
        }
    }
}

/// Claims decoded from a verified token.
///
/// Missing `iss`/`sub` decode as empty strings so the policy can report the
/// precise violation instead of a generic parse failure.
#[derive(Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub iss: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,

    /// Subject (provider user id) - redacted in Debug output.
    #[serde(default)]
    pub sub: String,

    /// Time the user authenticated (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_time: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Redacted in Debug output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("iss", &self.iss)
            .field("aud", &self.aud)
            .field("sub", &"[REDACTED]")
            .field("auth_time", &self.auth_time)
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .field("email", &self.email.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Issuer/audience/timing rules shared by both verification modes.
///
/// `auth_time` is required unless the `iat` fallback is enabled, which only
/// shared-secret providers need (they never stamp `auth_time`).
#[derive(Debug, Clone)]
pub struct ClaimsPolicy {
    issuer: String,
    audience: String,
    iat_fallback: bool,
}

impl ClaimsPolicy {
    pub fn new(issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            iat_fallback: false,
        }
    }

    /// Accept `iat` as the authentication time when `auth_time` is absent.
    pub fn with_iat_fallback(mut self) -> Self {
        self.iat_fallback = true;
        self
    }

    /// The policy for the configured verification mode.
    pub fn from_config(config: &AuthConfig) -> Self {
        let policy = Self::new(config.issuer.clone(), config.audience.clone());
        match config.mode {
            AuthMode::Certificates { .. } => policy,
            AuthMode::SharedSecret { .. } => policy.with_iat_fallback(),
        }
    }

    /// Validate claims against the current wall clock.
    pub fn validate(&self, claims: &Claims) -> Result<(), AuthError> {
        self.validate_at(claims, chrono::Utc::now().timestamp())
    }

    /// Validate claims at `now` (Unix epoch seconds).
    ///
    /// Checked in order: issuer, audience, auth time, subject. A token
    /// authenticated exactly at `now` is accepted.
    pub fn validate_at(&self, claims: &Claims, now: i64) -> Result<(), AuthError> {
        if claims.iss != self.issuer {
            return Err(AuthError::claims(ClaimsViolation::IssuerMismatch));
        }

        let audience_ok = claims
            .aud
            .as_ref()
            .is_some_and(|aud| aud.contains(&self.audience));
        if !audience_ok {
            return Err(AuthError::claims(ClaimsViolation::AudienceMismatch));
        }

        let fallback = if self.iat_fallback { claims.iat } else { None };
        let auth_time = claims
            .auth_time
            .or(fallback)
            .ok_or(AuthError::claims(ClaimsViolation::MissingAuthTime))?;
        if auth_time > now {
            return Err(AuthError::claims(ClaimsViolation::AuthTimeInFuture));
        }

        if claims.sub.is_empty() {
            return Err(AuthError::claims(ClaimsViolation::EmptySubject));
        }

        Ok(())
    }
}
