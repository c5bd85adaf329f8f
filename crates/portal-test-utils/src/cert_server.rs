//! Mock certificate metadata endpoint.
//!
//! Serves `{kid: pem_certificate}` at `/certs` the way an identity provider
//! does, with configurable caching headers or a failing status.

use crate::crypto_fixtures::{certificates_body, TestSigningKey};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Default `Cache-Control` returned by [`MockCertServer::start`].
pub const DEFAULT_CACHE_CONTROL: &str = "public, max-age=3600, must-revalidate, no-transform";

/// A running mock certificate endpoint.
pub struct MockCertServer {
    server: MockServer,
}

impl MockCertServer {
    /// Publish `keys`, cacheable for an hour.
    pub async fn start(keys: &[&TestSigningKey]) -> Self {
        Self::start_with_cache_control(keys, DEFAULT_CACHE_CONTROL).await
    }

    /// Publish `keys` with a specific `Cache-Control` header.
    pub async fn start_with_cache_control(keys: &[&TestSigningKey], cache_control: &str) -> Self {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/certs"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("cache-control", cache_control)
                    .set_body_json(certificates_body(keys)),
            )
            .mount(&server)
            .await;
        Self { server }
    }

    /// Respond to every fetch with `status`.
    pub async fn start_failing(status: u16) -> Self {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/certs"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;
        Self { server }
    }

    /// URL to configure as the certificate metadata URL.
    pub fn certs_url(&self) -> String {
        format!("{}/certs", self.server.uri())
    }

    /// Number of fetches received so far.
    pub async fn fetch_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map_or(0, |requests| requests.len())
    }
}
