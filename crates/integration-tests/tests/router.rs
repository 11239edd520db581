//! Router tests that need no database.
//!
//! The pool connects lazily, so only routes that stop before touching
//! storage (health, public resources, authentication rejections) are
//! exercised here.
//!
//! Run with: cargo test -p calmly-integration-tests --test router

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::middleware::from_fn;
use secrecy::SecretString;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use url::Url;

use calmly_server::config::{CalmlyConfig, GeminiConfig};
use calmly_server::middleware::{request_id_middleware, security_headers_middleware};
use calmly_server::routes;
use calmly_server::state::AppState;

fn app() -> Router {
    let config = CalmlyConfig {
        database_url: SecretString::from("postgres://calmly@localhost/calmly_test"),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        base_url: Url::parse("http://localhost:8080").unwrap(),
        session_secret: SecretString::from("x".repeat(32)),
        gemini: GeminiConfig::default(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    };
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://calmly@localhost/calmly_test")
        .unwrap();
    let state = AppState::new(config, pool).unwrap();

    routes::routes()
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

// ============================================================================
// Public routes
// ============================================================================

#[tokio::test]
async fn test_health() {
    let response = app().oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
}

#[tokio::test]
async fn test_crisis_resources_are_public() {
    let response = app().oneshot(get("/api/resources/crisis")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let contacts = body.as_array().unwrap();
    assert!(!contacts.is_empty());
    assert_eq!(contacts[0]["number"], "112");
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_protected_routes_require_session() {
    for uri in [
        "/api/chat/history",
        "/api/dashboard/student",
        "/api/analytics",
        "/api/forum/posts",
        "/api/auth/session",
    ] {
        let response = app().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(json_body(response).await["error"], "Not authenticated");
    }
}

#[tokio::test]
async fn test_chat_message_requires_session() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/chat/messages")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"message":"hello"}"#))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let response = app().oneshot(get("/api/does-not-exist")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
