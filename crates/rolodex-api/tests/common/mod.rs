//! Shared helpers for router-level integration tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Duration;
use rolodex_api::{ApiServer, ApiServerConfig, Environment};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use tower::ServiceExt; // For `oneshot` method

pub const TEST_SECRET: &str = "integration-test-secret";
pub const PASSWORD: &str = "secret1";

/// Helper to create an in-memory database with migrations applied
pub async fn create_test_db() -> DatabaseConnection {
    let db = rolodex_db::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    rolodex_db::migrate(&db)
        .await
        .expect("Failed to run migrations");

    db
}

pub fn create_test_server(db: DatabaseConnection, environment: Environment) -> ApiServer {
    let config = ApiServerConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(), // Random port
        environment,
        cors_origins: Vec::new(),
        jwt_secret: TEST_SECRET.to_string(),
        jwt_ttl: Duration::days(7),
    };

    ApiServer::new(config, db).expect("Failed to build server")
}

/// Router plus a handle on its database
pub async fn create_test_app() -> (Router, DatabaseConnection) {
    let db = create_test_db().await;
    let app = create_test_server(db.clone(), Environment::Production).build_router();
    (app, db)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    TestResponse {
        status,
        headers,
        body,
    }
}

/// Register an identity and return its id
pub async fn register(app: &Router, name: &str, email: &str) -> String {
    let response = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "name": name, "email": email, "password": PASSWORD })),
    )
    .await;

    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response.body["user"]["id"].as_str().unwrap().to_string()
}

/// Log in and return the bearer token
pub async fn login(app: &Router, email: &str) -> String {
    let response = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": PASSWORD })),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    response.body["token"].as_str().unwrap().to_string()
}

/// Register and log in, returning `(id, token)`
pub async fn register_and_login(app: &Router, name: &str, email: &str) -> (String, String) {
    let id = register(app, name, email).await;
    let token = login(app, email).await;
    (id, token)
}
