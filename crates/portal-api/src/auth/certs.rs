//! Signing certificate fetching and caching.
//!
//! The identity provider publishes its current signing keys as a JSON object
//! mapping key ID to a PEM-encoded X.509 certificate:
//!
//! ```text
//! { "<kid>": "-----BEGIN CERTIFICATE-----\n...", ... }
//! ```
//!
//! The response's `Cache-Control: max-age` (or `Expires`) header says how
//! long the set may be used. The cache keeps one set at a time and replaces
//! it wholesale on expiry; a key ID that is absent from a fresh set is simply
//! unknown until the provider's next rotation window.
//!
//! # Security
//!
//! - Only RSA public keys are accepted (tokens are RS256)
//! - Certificates that fail to parse are dropped, never partially trusted
//! - HTTPS should be used in production (enforced by deployment config)

use crate::auth::error::AuthError;
use crate::observability::metrics;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::DecodingKey;
use reqwest::header::{HeaderMap, CACHE_CONTROL, EXPIRES};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::instrument;
use x509_parser::{parse_x509_certificate, pem::parse_x509_pem, public_key::PublicKey};

/// Immutable set of verification keys, indexed by key ID.
#[derive(Clone, Default)]
pub struct SigningKeySet {
    keys: HashMap<String, DecodingKey>,
}

impl fmt::Debug for SigningKeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kids: Vec<&String> = self.keys.keys().collect();
        kids.sort();
        f.debug_struct("SigningKeySet").field("kids", &kids).finish()
    }
}

impl SigningKeySet {
    /// Build a key set from `{kid: pem_certificate}` pairs.
    ///
    /// Entries whose certificate is unparseable or does not carry an RSA
    /// public key are skipped with a warning.
    pub fn from_certificates(certificates: HashMap<String, String>) -> Self {
        let keys = certificates
            .into_iter()
            .filter_map(|(kid, pem)| match decoding_key_from_certificate(&pem) {
                Ok(key) => Some((kid, key)),
                Err(reason) => {
                    tracing::warn!(
                        target: "portal.auth.certs",
                        kid = %kid,
                        reason = %reason,
                        "Skipping unusable signing certificate"
                    );
                    None
                }
            })
            .collect();

        Self { keys }
    }

    pub fn get(&self, kid: &str) -> Option<&DecodingKey> {
        self.keys.get(kid)
    }

    pub fn contains(&self, kid: &str) -> bool {
        self.keys.contains_key(kid)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Extract the RSA public key from a PEM certificate.
fn decoding_key_from_certificate(pem: &str) -> Result<DecodingKey, String> {
    let (_, pem) = parse_x509_pem(pem.as_bytes()).map_err(|e| format!("invalid PEM: {e}"))?;
    let (_, cert) =
        parse_x509_certificate(&pem.contents).map_err(|e| format!("invalid certificate: {e}"))?;

    let spki = cert.public_key();
    match spki.parsed() {
        // subjectPublicKey of an rsaEncryption SPKI is the PKCS#1 RSAPublicKey DER
        Ok(PublicKey::RSA(_)) => Ok(DecodingKey::from_rsa_der(&spki.subject_public_key.data)),
        Ok(_) => Err("certificate public key is not RSA".to_string()),
        Err(e) => Err(format!("unreadable public key: {e}")),
    }
}

/// A freshly fetched key set and the instant it stops being usable.
#[derive(Debug, Clone)]
pub struct FetchedKeySet {
    pub keys: SigningKeySet,
    pub expires_at: DateTime<Utc>,
}

/// Source of signing keys.
///
/// Production uses [`HttpKeyFetcher`]; tests substitute their own.
#[async_trait]
pub trait KeyFetcher: Send + Sync {
    /// Fetch the provider's current key set.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::KeyFetch` on transport failure, non-success
    /// status, or an unparseable body.
    async fn fetch(&self) -> Result<FetchedKeySet, AuthError>;
}

/// Fetches `{kid: pem_certificate}` JSON over HTTP.
pub struct HttpKeyFetcher {
    certs_url: String,
    http_client: reqwest::Client,
}

impl HttpKeyFetcher {
    /// Create a fetcher for `certs_url` whose requests give up after `timeout`.
    pub fn new(certs_url: String, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "portal.auth.certs", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            certs_url,
            http_client,
        }
    }
}

#[async_trait]
impl KeyFetcher for HttpKeyFetcher {
    #[instrument(skip_all, name = "portal.auth.fetch_certificates")]
    async fn fetch(&self) -> Result<FetchedKeySet, AuthError> {
        tracing::debug!(target: "portal.auth.certs", url = %self.certs_url, "Fetching signing certificates");

        let response = self
            .http_client
            .get(&self.certs_url)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(target: "portal.auth.certs", error = %e, "Failed to fetch signing certificates");
                AuthError::KeyFetch(format!("request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(
                target: "portal.auth.certs",
                status = %status,
                "Certificate endpoint returned error"
            );
            return Err(AuthError::KeyFetch(format!(
                "certificate endpoint returned {status}"
            )));
        }

        let expires_at = freshness_deadline(response.headers(), Utc::now());

        let certificates: HashMap<String, String> = response.json().await.map_err(|e| {
            tracing::error!(target: "portal.auth.certs", error = %e, "Failed to parse certificate response");
            AuthError::KeyFetch(format!("unparseable body: {e}"))
        })?;

        let published = certificates.len();
        let keys = SigningKeySet::from_certificates(certificates);
        if keys.is_empty() && published > 0 {
            return Err(AuthError::KeyFetch(
                "no usable certificates in response".to_string(),
            ));
        }

        Ok(FetchedKeySet { keys, expires_at })
    }
}

/// Compute when a response stops being fresh.
///
/// `Cache-Control: max-age` wins over `Expires`. `no-store`/`no-cache`, a
/// missing or unparseable header, or an `Expires` in the past all yield `now`
/// (usable for the current request only).
pub fn freshness_deadline(headers: &HeaderMap, now: DateTime<Utc>) -> DateTime<Utc> {
    if let Some(cache_control) = headers.get(CACHE_CONTROL).and_then(|v| v.to_str().ok()) {
        let mut max_age = None;
        for directive in cache_control.split(',').map(str::trim) {
            let directive = directive.to_ascii_lowercase();
            if directive == "no-store" || directive == "no-cache" {
                return now;
            }
            if let Some(value) = directive.strip_prefix("max-age=") {
                max_age = value.trim_matches('"').parse::<u32>().ok();
            }
        }
        if let Some(seconds) = max_age {
            return now + chrono::Duration::seconds(i64::from(seconds));
        }
    }

    headers
        .get(EXPIRES)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| DateTime::parse_from_rfc2822(v.trim()).ok())
        .map(|expires| expires.with_timezone(&Utc))
        .map_or(now, |expires| expires.max(now))
}

struct CachedKeys {
    keys: Arc<SigningKeySet>,
    expires_at: DateTime<Utc>,
}

/// Process-wide signing key cache.
///
/// One slot, replaced wholesale on refresh. Concurrent misses are
/// serialised so only one fetch is in flight; waiters re-check the slot
/// once they hold the refresh lock.
pub struct SigningKeyCache {
    fetcher: Arc<dyn KeyFetcher>,
    slot: RwLock<Option<CachedKeys>>,
    refresh_lock: Mutex<()>,
}

impl SigningKeyCache {
    pub fn new(fetcher: Arc<dyn KeyFetcher>) -> Self {
        Self {
            fetcher,
            slot: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Current key set, fetching if the cache is empty or expired.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::KeyFetch` if a needed fetch fails. A failed fetch
    /// leaves the previous (expired) entry in place.
    pub async fn get_keys(&self) -> Result<Arc<SigningKeySet>, AuthError> {
        self.get_keys_at(Utc::now()).await
    }

    /// [`get_keys`](Self::get_keys) with an explicit clock.
    #[instrument(skip_all, name = "portal.auth.get_signing_keys")]
    pub async fn get_keys_at(&self, now: DateTime<Utc>) -> Result<Arc<SigningKeySet>, AuthError> {
        if let Some(keys) = self.fresh_keys(now).await {
            tracing::debug!(target: "portal.auth.certs", "Signing key cache hit");
            metrics::record_signing_key_cache("hit");
            return Ok(keys);
        }

        let _guard = self.refresh_lock.lock().await;

        // Another task may have refreshed while we waited
        if let Some(keys) = self.fresh_keys(now).await {
            metrics::record_signing_key_cache("hit");
            return Ok(keys);
        }

        metrics::record_signing_key_cache("miss");
        self.refresh().await
    }

    /// Fetch unconditionally and replace the cached set.
    pub async fn prime(&self) -> Result<Arc<SigningKeySet>, AuthError> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh().await
    }

    /// Drop the cached set; the next lookup fetches.
    pub async fn invalidate(&self) {
        let mut slot = self.slot.write().await;
        *slot = None;
        tracing::debug!(target: "portal.auth.certs", "Signing key cache invalidated");
    }

    async fn fresh_keys(&self, now: DateTime<Utc>) -> Option<Arc<SigningKeySet>> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|cached| now < cached.expires_at)
            .map(|cached| Arc::clone(&cached.keys))
    }

    /// Caller must hold `refresh_lock`.
    async fn refresh(&self) -> Result<Arc<SigningKeySet>, AuthError> {
        let start = Instant::now();
        let fetched = match self.fetcher.fetch().await {
            Ok(fetched) => {
                metrics::record_signing_key_fetch("success", start.elapsed());
                fetched
            }
            Err(e) => {
                metrics::record_signing_key_fetch("error", start.elapsed());
                return Err(e);
            }
        };

        let keys = Arc::new(fetched.keys);
        tracing::info!(
            target: "portal.auth.certs",
            key_count = keys.len(),
            expires_at = %fetched.expires_at,
            "Signing key cache refreshed"
        );

        let mut slot = self.slot.write().await;
        *slot = Some(CachedKeys {
            keys: Arc::clone(&keys),
            expires_at: fetched.expires_at,
        });

        Ok(keys)
    }
}
