//! Signature verification.
//!
//! Two modes, chosen once at startup:
//! - [`CertificateVerifier`]: RS256 against the provider's rotating X.509
//!   certificates, selected by the token's `kid`
//! - [`SharedSecretVerifier`]: HS256 against a single configured secret
//!
//! Both return the decoded claims; issuer/audience/subject rules are applied
//! afterwards by the shared [`ClaimsPolicy`](crate::auth::claims::ClaimsPolicy).
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Each mode accepts exactly one algorithm; the header's `alg` never
//!   chooses the key type
//! - `exp` is enforced when present, with clock skew leeway

use crate::auth::certs::{HttpKeyFetcher, SigningKeyCache};
use crate::auth::claims::Claims;
use crate::auth::error::{AuthError, ClaimsViolation};
use crate::config::{AuthConfig, AuthMode};
use async_trait::async_trait;
use common::jwt::{check_token_size, extract_kid, JwtValidationError};
use common::secret::ExposeSecret;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::sync::Arc;
use tracing::instrument;

/// Verifies a token's signature and returns its claims.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Claims, AuthError>;
}

/// RS256 verification against cached provider certificates.
pub struct CertificateVerifier {
    key_cache: Arc<SigningKeyCache>,
    leeway_seconds: u64,
}

impl CertificateVerifier {
    pub fn new(key_cache: Arc<SigningKeyCache>, leeway_seconds: u64) -> Self {
        Self {
            key_cache,
            leeway_seconds,
        }
    }
}

#[async_trait]
impl TokenVerifier for CertificateVerifier {
    #[instrument(skip_all, name = "portal.auth.verify_certificate")]
    async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let keys = self.key_cache.get_keys().await?;

        // A parseable header without a usable kid cannot match any certificate
        let kid = match extract_kid(token) {
            Ok(kid) => kid,
            Err(JwtValidationError::MissingKid) => String::new(),
            Err(e) => {
                tracing::debug!(target: "portal.auth.verifier", error = ?e, "Token header rejected");
                return Err(e.into());
            }
        };

        let key = keys.get(&kid).ok_or_else(|| {
            tracing::debug!(target: "portal.auth.verifier", kid = %kid, "No signing certificate for kid");
            AuthError::UnknownKey { kid: kid.clone() }
        })?;

        decode_claims(token, key, Algorithm::RS256, self.leeway_seconds)
    }
}

/// HS256 verification against a symmetric secret.
pub struct SharedSecretVerifier {
    key: DecodingKey,
    leeway_seconds: u64,
}

impl SharedSecretVerifier {
    pub fn new(secret: &[u8], leeway_seconds: u64) -> Self {
        Self {
            key: DecodingKey::from_secret(secret),
            leeway_seconds,
        }
    }
}

#[async_trait]
impl TokenVerifier for SharedSecretVerifier {
    #[instrument(skip_all, name = "portal.auth.verify_shared_secret")]
    async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        check_token_size(token)?;
        decode_claims(token, &self.key, Algorithm::HS256, self.leeway_seconds)
    }
}

/// Verify the signature with `algorithm` and deserialize the claims.
fn decode_claims(
    token: &str,
    key: &DecodingKey,
    algorithm: Algorithm,
    leeway_seconds: u64,
) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(algorithm);
    // Only `exp` is checked here, and only when the token carries one
    validation.set_required_spec_claims::<&str>(&[]);
    validation.validate_exp = true;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.leeway = leeway_seconds;

    let token_data = decode::<Claims>(token, key, &validation).map_err(|e| {
        tracing::debug!(target: "portal.auth.verifier", error = %e, "Token verification failed");
        match e.kind() {
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::InvalidKeyFormat
            | ErrorKind::InvalidRsaKey(_) => AuthError::BadSignature,
            ErrorKind::ExpiredSignature => AuthError::claims(ClaimsViolation::Expired),
            _ => AuthError::MalformedToken,
        }
    })?;

    Ok(token_data.claims)
}

/// Build the verifier selected by configuration.
///
/// In certificate mode the key cache is primed once; a failed prime is
/// logged and retried lazily on the first request.
pub async fn build_verifier(config: &AuthConfig) -> Arc<dyn TokenVerifier> {
    match &config.mode {
        AuthMode::Certificates { certs_url } => {
            let fetcher = Arc::new(HttpKeyFetcher::new(
                certs_url.clone(),
                config.key_fetch_timeout,
            ));
            let cache = Arc::new(SigningKeyCache::new(fetcher));

            match cache.prime().await {
                Ok(keys) => {
                    tracing::info!(target: "portal.auth.verifier", key_count = keys.len(), "Signing key cache primed");
                }
                Err(e) => {
                    tracing::warn!(target: "portal.auth.verifier", error = %e, "Initial signing key fetch failed, will retry on demand");
                }
            }

            Arc::new(CertificateVerifier::new(cache, config.clock_skew_seconds))
        }
        AuthMode::SharedSecret { secret } => Arc::new(SharedSecretVerifier::new(
            secret.expose_secret().as_bytes(),
            config.clock_skew_seconds,
        )),
    }
}
