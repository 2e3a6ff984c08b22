//! Helpers for exercising the full router against a throwaway sqlite file.

use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response, header},
};
use config::Config;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::AppState;

pub async fn test_app() -> (TempDir, Router) {
    let dir = TempDir::new().expect("temp dir");
    let database_url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("test.sqlite").display()
    );
    let config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url,
        jwt_secret: "test-secret".to_string(),
        token_ttl_days: 1,
    };
    let state = AppState::new(config).await.expect("test database");
    (dir, crate::http::router(&state))
}

pub fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body");
    serde_json::from_slice(&bytes).expect("json body")
}

/// Registers a user and returns their bearer token.
pub async fn register_user(app: &Router, email: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/users/register",
            None,
            Some(serde_json::json!({
                "name": "Test User",
                "email": email,
                "password": "hunter2",
            })),
        ))
        .await
        .unwrap();
    assert!(response.status().is_success(), "registration failed");
    let json = body_json(response).await;
    json["token"].as_str().expect("token").to_string()
}

pub async fn create_task(app: &Router, token: &str, title: &str, description: &str) -> Value {
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/tasks/create",
            Some(token),
            Some(serde_json::json!({"title": title, "description": description})),
        ))
        .await
        .unwrap();
    assert!(response.status().is_success(), "task creation failed");
    body_json(response).await
}
