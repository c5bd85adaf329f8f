//! Builder patterns for test data construction
//!
//! Provides fluent APIs for creating test token claims.

use chrono::{Duration, Utc};
use serde_json::{json, Value};

/// Project id used by certificate-mode tests.
pub const TEST_PROJECT_ID: &str = "ynym-portal-test";

/// Issuer used by shared-secret-mode tests.
pub const TEST_SHARED_SECRET_ISSUER: &str = "https://portal-test.supabase.co/auth/v1";

/// Audience used by shared-secret-mode tests.
pub const TEST_SHARED_SECRET_AUDIENCE: &str = "authenticated";

/// Issuer a certificate-mode provider stamps for `project_id`.
pub fn certificate_issuer(project_id: &str) -> String {
    format!("https://securetoken.google.com/{project_id}")
}

/// Builder for creating test JWT claims
///
/// Defaults produce claims that pass every check for the chosen mode, with
/// `sub = "user-123"`.
///
/// # Example
/// ```rust,ignore
/// let claims = TestClaimsBuilder::certificates(TEST_PROJECT_ID)
///     .for_user("alice")
///     .auth_time_offset(120)
///     .build();
/// ```
pub struct TestClaimsBuilder {
    claims: Value,
}

impl TestClaimsBuilder {
    /// Claims as issued for a certificate-mode project.
    pub fn certificates(project_id: &str) -> Self {
        Self::with_issuer(&certificate_issuer(project_id), project_id)
    }

    /// Claims as issued by a shared-secret provider.
    pub fn shared_secret() -> Self {
        Self::with_issuer(TEST_SHARED_SECRET_ISSUER, TEST_SHARED_SECRET_AUDIENCE)
    }

    fn with_issuer(issuer: &str, audience: &str) -> Self {
        let now = Utc::now();
        Self {
            claims: json!({
                "iss": issuer,
                "aud": audience,
                "sub": "user-123",
                "auth_time": (now - Duration::seconds(60)).timestamp(),
                "iat": (now - Duration::seconds(60)).timestamp(),
                "exp": (now + Duration::seconds(3600)).timestamp(),
            }),
        }
    }

    /// Set the subject
    pub fn for_user(self, subject: &str) -> Self {
        self.set("sub", json!(subject))
    }

    pub fn issuer(self, issuer: &str) -> Self {
        self.set("iss", json!(issuer))
    }

    pub fn audience(self, audience: &str) -> Self {
        self.set("aud", json!(audience))
    }

    /// Set `auth_time` relative to now (positive is in the future).
    pub fn auth_time_offset(self, seconds: i64) -> Self {
        let at = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self.set("auth_time", json!(at))
    }

    /// Set expiration in seconds from now (negative is in the past).
    pub fn expires_in(self, seconds: i64) -> Self {
        let at = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self.set("exp", json!(at))
    }

    pub fn email(self, email: &str) -> Self {
        self.set("email", json!(email))
    }

    /// Remove a claim entirely.
    pub fn without(mut self, claim: &str) -> Self {
        if let Some(map) = self.claims.as_object_mut() {
            map.remove(claim);
        }
        self
    }

    /// Set any claim.
    pub fn set(mut self, claim: &str, value: Value) -> Self {
        if let Some(map) = self.claims.as_object_mut() {
            map.insert(claim.to_string(), value);
        }
        self
    }

    /// Build the claims as a JSON value
    pub fn build(self) -> Value {
        self.claims
    }
}
