//! Signing key cache integration tests.
//!
//! Runs the cache against a wiremock certificate endpoint and counts the
//! fetches that actually reach it.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::Utc;
use portal_api::auth::{AuthError, HttpKeyFetcher, SigningKeyCache};
use portal_test_utils::{primary_key, rotated_key, MockCertServer, PRIMARY_KID, ROTATED_KID};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn cache_for(certs_url: String) -> SigningKeyCache {
    SigningKeyCache::new(Arc::new(HttpKeyFetcher::new(
        certs_url,
        Duration::from_secs(5),
    )))
}

/// Two lookups inside the freshness window hit the provider once.
#[tokio::test]
async fn test_lookups_within_window_fetch_once() -> Result<(), anyhow::Error> {
    let server = MockCertServer::start(&[&primary_key()]).await;
    let cache = cache_for(server.certs_url());

    let first = cache.get_keys().await?;
    let second = cache.get_keys().await?;

    assert!(first.contains(PRIMARY_KID));
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(server.fetch_count().await, 1);

    Ok(())
}

/// A lookup after `max-age` has elapsed fetches again.
#[tokio::test]
async fn test_lookup_after_expiry_refetches() -> Result<(), anyhow::Error> {
    let server = MockCertServer::start(&[&primary_key()]).await;
    let cache = cache_for(server.certs_url());

    let now = Utc::now();
    cache.get_keys_at(now).await?;
    cache.get_keys_at(now + chrono::Duration::minutes(30)).await?;
    assert_eq!(server.fetch_count().await, 1);

    cache.get_keys_at(now + chrono::Duration::hours(2)).await?;
    assert_eq!(server.fetch_count().await, 2);

    Ok(())
}

/// `no-store` responses are used once and never cached.
#[tokio::test]
async fn test_uncacheable_response_fetches_every_time() -> Result<(), anyhow::Error> {
    let server = MockCertServer::start_with_cache_control(&[&primary_key()], "no-store").await;
    let cache = cache_for(server.certs_url());

    cache.get_keys().await?;
    cache.get_keys().await?;

    assert_eq!(server.fetch_count().await, 2);

    Ok(())
}

#[tokio::test]
async fn test_provider_error_status_is_key_fetch() {
    let server = MockCertServer::start_failing(500).await;
    let cache = cache_for(server.certs_url());

    let result = cache.get_keys().await;

    assert!(
        matches!(result, Err(AuthError::KeyFetch(_))),
        "Expected KeyFetch, got {:?}",
        result.map(|k| k.len())
    );
}

#[tokio::test]
async fn test_unreachable_provider_is_key_fetch() {
    // Nothing listens on port 1
    let cache = cache_for("http://127.0.0.1:1/certs".to_string());

    assert!(matches!(
        cache.get_keys().await,
        Err(AuthError::KeyFetch(_))
    ));
}

#[tokio::test]
async fn test_unparseable_body_is_key_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/certs"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("cache-control", "max-age=3600")
                .set_body_string("<html>maintenance</html>"),
        )
        .mount(&server)
        .await;

    let cache = cache_for(format!("{}/certs", server.uri()));

    assert!(matches!(
        cache.get_keys().await,
        Err(AuthError::KeyFetch(_))
    ));
}

#[tokio::test]
async fn test_body_without_usable_certificates_is_key_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/certs"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"k1": "not a certificate"})),
        )
        .mount(&server)
        .await;

    let cache = cache_for(format!("{}/certs", server.uri()));

    assert!(matches!(
        cache.get_keys().await,
        Err(AuthError::KeyFetch(_))
    ));
}

#[tokio::test]
async fn test_every_published_key_is_available() -> Result<(), anyhow::Error> {
    let server = MockCertServer::start(&[&primary_key(), &rotated_key()]).await;
    let cache = cache_for(server.certs_url());

    let keys = cache.get_keys().await?;

    assert_eq!(keys.len(), 2);
    assert!(keys.get(PRIMARY_KID).is_some());
    assert!(keys.get(ROTATED_KID).is_some());

    Ok(())
}

#[tokio::test]
async fn test_invalidate_forces_refetch() -> Result<(), anyhow::Error> {
    let server = MockCertServer::start(&[&primary_key()]).await;
    let cache = cache_for(server.certs_url());

    cache.get_keys().await?;
    cache.invalidate().await;
    cache.get_keys().await?;

    assert_eq!(server.fetch_count().await, 2);

    Ok(())
}

#[tokio::test]
async fn test_prime_fetches_and_populates() -> Result<(), anyhow::Error> {
    let server = MockCertServer::start(&[&primary_key()]).await;
    let cache = cache_for(server.certs_url());

    cache.prime().await?;
    cache.get_keys().await?;

    assert_eq!(server.fetch_count().await, 1);

    Ok(())
}

/// Simultaneous misses share one fetch.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_misses_fetch_once() -> Result<(), anyhow::Error> {
    let server = MockCertServer::start(&[&primary_key()]).await;
    let cache = Arc::new(cache_for(server.certs_url()));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get_keys().await })
        })
        .collect();

    for handle in handles {
        assert!(handle.await?.is_ok());
    }

    assert_eq!(server.fetch_count().await, 1);

    Ok(())
}
