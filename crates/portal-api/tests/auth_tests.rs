//! HTTP-level authentication tests.
//!
//! Drives the full router with `tower::ServiceExt::oneshot`. The database
//! pool is lazy and never connected: every request here is answered by the
//! gate, by request validation, or by an endpoint that does not touch the
//! database.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use metrics_exporter_prometheus::PrometheusBuilder;
use portal_api::auth::{
    AuthGate, CertificateVerifier, ClaimsPolicy, HttpKeyFetcher, MockPrincipalStore,
    PrincipalStore, SharedSecretVerifier, SigningKeyCache,
};
use portal_api::config::Config;
use portal_api::routes::{build_routes, AppState};
use portal_test_utils::{
    certificate_issuer, primary_key, sign_hs256, MockCertServer, TestClaimsBuilder,
    TEST_PROJECT_ID, TEST_SHARED_SECRET, TEST_SHARED_SECRET_ISSUER,
};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn test_config() -> Config {
    let vars = HashMap::from([
        (
            "DATABASE_URL".to_string(),
            "postgres://localhost/portal_test".to_string(),
        ),
        ("AUTH_MODE".to_string(), "shared_secret".to_string()),
        (
            "AUTH_ISSUER".to_string(),
            TEST_SHARED_SECRET_ISSUER.to_string(),
        ),
        (
            "AUTH_SHARED_SECRET".to_string(),
            TEST_SHARED_SECRET.to_string(),
        ),
    ]);
    Config::from_vars(&vars).unwrap()
}

fn app_with_gate(gate: AuthGate) -> Router {
    let config = test_config();
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(100))
        .connect_lazy(&config.database_url)
        .unwrap();
    let state = Arc::new(AppState { pool });
    let metrics_handle = PrometheusBuilder::new().build_recorder().handle();

    build_routes(state, Arc::new(gate), metrics_handle)
}

fn shared_secret_app(store: Arc<dyn PrincipalStore>) -> Router {
    app_with_gate(AuthGate::new(
        Arc::new(SharedSecretVerifier::new(TEST_SHARED_SECRET.as_bytes(), 300)),
        ClaimsPolicy::from_config(&test_config().auth),
        store,
    ))
}

fn valid_token() -> String {
    sign_hs256(&TestClaimsBuilder::shared_secret().build(), TEST_SHARED_SECRET)
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn assert_unauthorized(response: axum::response::Response) {
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response
        .headers()
        .get(header::WWW_AUTHENTICATE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Bearer")));
    assert_eq!(
        body_json(response).await,
        json!({"error": {"code": "UNAUTHORIZED", "messages": ["Please log in"]}})
    );
}

#[tokio::test]
async fn test_health_is_public() -> Result<(), anyhow::Error> {
    let app = shared_secret_app(Arc::new(MockPrincipalStore::empty()));

    let response = app
        .oneshot(request(Method::GET, "/health", None, None))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await?.to_bytes();
    assert_eq!(&bytes[..], b"OK");

    Ok(())
}

#[tokio::test]
async fn test_metrics_is_public() -> Result<(), anyhow::Error> {
    let app = shared_secret_app(Arc::new(MockPrincipalStore::empty()));

    let response = app
        .oneshot(request(Method::GET, "/metrics", None, None))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn test_me_returns_principal() -> Result<(), anyhow::Error> {
    let app = shared_secret_app(Arc::new(MockPrincipalStore::with_principals(["user-123"])));

    let response = app
        .oneshot(request(Method::GET, "/api/v1/me", Some(&valid_token()), None))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"uid": "user-123"}));

    Ok(())
}

#[tokio::test]
async fn test_missing_header_is_401() -> Result<(), anyhow::Error> {
    let app = shared_secret_app(Arc::new(MockPrincipalStore::with_principals(["user-123"])));

    let response = app
        .oneshot(request(Method::GET, "/api/v1/me", None, None))
        .await?;

    assert_unauthorized(response).await;

    Ok(())
}

/// Every gate rejection produces the same response.
#[tokio::test]
async fn test_rejections_are_indistinguishable() -> Result<(), anyhow::Error> {
    let store: Arc<dyn PrincipalStore> =
        Arc::new(MockPrincipalStore::with_principals(["user-123"]));

    let tokens = [
        "garbage".to_string(),
        sign_hs256(&TestClaimsBuilder::shared_secret().build(), "wrong-secret"),
        sign_hs256(
            &TestClaimsBuilder::shared_secret().audience("anon").build(),
            TEST_SHARED_SECRET,
        ),
        sign_hs256(
            &TestClaimsBuilder::shared_secret().for_user("stranger").build(),
            TEST_SHARED_SECRET,
        ),
    ];

    for token in tokens {
        let app = shared_secret_app(Arc::clone(&store));
        let response = app
            .oneshot(request(Method::GET, "/api/v1/me", Some(&token), None))
            .await?;
        assert_unauthorized(response).await;
    }

    Ok(())
}

#[tokio::test]
async fn test_every_resource_route_requires_auth() -> Result<(), anyhow::Error> {
    let id = "6f1c1c56-0d53-4a52-9a2f-3b1c3d5e7f90";
    let routes = [
        (Method::GET, "/api/v1/tasks".to_string()),
        (Method::POST, "/api/v1/tasks".to_string()),
        (Method::PATCH, format!("/api/v1/tasks/{id}")),
        (Method::DELETE, format!("/api/v1/tasks/{id}")),
        (Method::GET, "/api/v1/task_lists".to_string()),
        (Method::PUT, format!("/api/v1/task_lists/{id}")),
        (Method::GET, "/api/v1/cars".to_string()),
        (Method::GET, format!("/api/v1/cars/{id}")),
        (Method::DELETE, format!("/api/v1/cars/{id}")),
        (Method::GET, format!("/api/v1/cars/{id}/refuelings")),
        (Method::GET, format!("/api/v1/cars/{id}/refuelings/{id}")),
        (Method::GET, "/api/v1/notes".to_string()),
        (Method::PATCH, format!("/api/v1/notes/{id}")),
        (Method::POST, format!("/api/v1/notes/{id}/sections")),
        (Method::DELETE, format!("/api/v1/notes/{id}/sections/{id}")),
        (Method::GET, format!("/api/v1/notes/{id}/sections/{id}/pages")),
        (Method::PUT, format!("/api/v1/notes/{id}/sections/{id}/pages/{id}")),
        (Method::GET, "/api/v1/confidentials".to_string()),
        (Method::GET, format!("/api/v1/confidentials/{id}")),
    ];

    for (method, uri) in routes {
        let app = shared_secret_app(Arc::new(MockPrincipalStore::with_principals(["user-123"])));
        let response = app.oneshot(request(method, &uri, None, None)).await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }

    Ok(())
}

#[tokio::test]
async fn test_principal_store_failure_is_500() -> Result<(), anyhow::Error> {
    let app = shared_secret_app(Arc::new(MockPrincipalStore::failing()));

    let response = app
        .oneshot(request(Method::GET, "/api/v1/me", Some(&valid_token()), None))
        .await?;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    assert_eq!(body_json(response).await["error"]["code"], "DATABASE_ERROR");

    Ok(())
}

#[tokio::test]
async fn test_create_task_validation_is_422() -> Result<(), anyhow::Error> {
    let app = shared_secret_app(Arc::new(MockPrincipalStore::with_principals(["user-123"])));

    let response = app
        .oneshot(request(
            Method::POST,
            "/api/v1/tasks",
            Some(&valid_token()),
            Some(json!({"task": {"description": "no title"}})),
        ))
        .await?;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body_json(response).await,
        json!({"error": {"code": "VALIDATION_FAILED", "messages": ["Title can't be blank"]}})
    );

    Ok(())
}

#[tokio::test]
async fn test_create_car_reports_every_missing_field() -> Result<(), anyhow::Error> {
    let app = shared_secret_app(Arc::new(MockPrincipalStore::with_principals(["user-123"])));

    let response = app
        .oneshot(request(
            Method::POST,
            "/api/v1/cars",
            Some(&valid_token()),
            Some(json!({"car": {"name": "Daily", "seq": 1}})),
        ))
        .await?;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(
        body["error"]["messages"],
        json!([
            "Maker can't be blank",
            "Model can't be blank",
            "Model year can't be blank",
            "License plate can't be blank",
            "Tank capacity can't be blank"
        ])
    );

    Ok(())
}

#[tokio::test]
async fn test_create_refueling_validation_is_422() -> Result<(), anyhow::Error> {
    let app = shared_secret_app(Arc::new(MockPrincipalStore::with_principals(["user-123"])));

    let response = app
        .oneshot(request(
            Method::POST,
            "/api/v1/cars/6f1c1c56-0d53-4a52-9a2f-3b1c3d5e7f90/refuelings",
            Some(&valid_token()),
            Some(json!({"refueling": {"odometer": 42000, "gas_stand": ""}})),
        ))
        .await?;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    Ok(())
}

#[tokio::test]
async fn test_create_page_reports_every_missing_field() -> Result<(), anyhow::Error> {
    let app = shared_secret_app(Arc::new(MockPrincipalStore::with_principals(["user-123"])));
    let id = "6f1c1c56-0d53-4a52-9a2f-3b1c3d5e7f90";

    let response = app
        .oneshot(request(
            Method::POST,
            &format!("/api/v1/notes/{id}/sections/{id}/pages"),
            Some(&valid_token()),
            Some(json!({"page": {"title": "Setup"}})),
        ))
        .await?;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body_json(response).await["error"]["messages"],
        json!(["Content can't be blank", "Seq can't be blank"])
    );

    Ok(())
}

#[tokio::test]
async fn test_create_section_and_confidential_validation_is_422() -> Result<(), anyhow::Error> {
    let cases = [
        (
            "/api/v1/notes/6f1c1c56-0d53-4a52-9a2f-3b1c3d5e7f90/sections",
            json!({"section": {"seq": 1}}),
            json!(["Name can't be blank"]),
        ),
        (
            "/api/v1/confidentials",
            json!({"confidential": {"service_name": "Bank", "password": "hunter2"}}),
            json!(["Login can't be blank"]),
        ),
    ];

    for (uri, body, messages) in cases {
        let app = shared_secret_app(Arc::new(MockPrincipalStore::with_principals(["user-123"])));
        let response = app
            .oneshot(request(Method::POST, uri, Some(&valid_token()), Some(body)))
            .await?;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "{uri}");
        assert_eq!(body_json(response).await["error"]["messages"], messages);
    }

    Ok(())
}

#[tokio::test]
async fn test_unparseable_body_is_400() -> Result<(), anyhow::Error> {
    let app = shared_secret_app(Arc::new(MockPrincipalStore::with_principals(["user-123"])));

    let response = app
        .oneshot(request(
            Method::POST,
            "/api/v1/task_lists",
            Some(&valid_token()),
            Some(json!({"name": "missing envelope"})),
        ))
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "BAD_REQUEST");

    Ok(())
}

#[tokio::test]
async fn test_unknown_route_is_404() -> Result<(), anyhow::Error> {
    let app = shared_secret_app(Arc::new(MockPrincipalStore::empty()));

    let response = app
        .oneshot(request(Method::GET, "/api/v1/nonexistent", None, None))
        .await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_certificate_mode_end_to_end() -> Result<(), anyhow::Error> {
    let server = MockCertServer::start(&[&primary_key()]).await;
    let cache = Arc::new(SigningKeyCache::new(Arc::new(HttpKeyFetcher::new(
        server.certs_url(),
        Duration::from_secs(5),
    ))));
    let gate = AuthGate::new(
        Arc::new(CertificateVerifier::new(cache, 300)),
        ClaimsPolicy::new(certificate_issuer(TEST_PROJECT_ID), TEST_PROJECT_ID),
        Arc::new(MockPrincipalStore::with_principals(["user-123"])),
    );
    let app = app_with_gate(gate);

    let token = primary_key().sign(&TestClaimsBuilder::certificates(TEST_PROJECT_ID).build());
    let response = app
        .clone()
        .oneshot(request(Method::GET, "/api/v1/me", Some(&token), None))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["uid"], "user-123");

    // A token for another project is rejected like any other failure
    let other = primary_key().sign(&TestClaimsBuilder::certificates("other-project").build());
    let response = app
        .oneshot(request(Method::GET, "/api/v1/me", Some(&other), None))
        .await?;
    assert_unauthorized(response).await;

    Ok(())
}

#[tokio::test]
async fn test_certificate_provider_outage_is_401() -> Result<(), anyhow::Error> {
    let server = MockCertServer::start_failing(503).await;
    let cache = Arc::new(SigningKeyCache::new(Arc::new(HttpKeyFetcher::new(
        server.certs_url(),
        Duration::from_secs(5),
    ))));
    let app = app_with_gate(AuthGate::new(
        Arc::new(CertificateVerifier::new(cache, 300)),
        ClaimsPolicy::new(certificate_issuer(TEST_PROJECT_ID), TEST_PROJECT_ID),
        Arc::new(MockPrincipalStore::with_principals(["user-123"])),
    ));

    let token = primary_key().sign(&TestClaimsBuilder::certificates(TEST_PROJECT_ID).build());
    let response = app
        .oneshot(request(Method::GET, "/api/v1/me", Some(&token), None))
        .await?;

    assert_unauthorized(response).await;

    Ok(())
}
