use axum::{extract::State, http::StatusCode, http::Uri, Json};
use chrono::Utc;
use std::sync::Arc;
use tracing::warn;
use utoipa::OpenApi;

use crate::models::*;
use crate::{ApiDoc, AppState};

/// Health check endpoint
///
/// Pings the store; a failed ping turns the answer into a 503.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Store unreachable", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let (status, health, database) = match state.db.ping().await {
        Ok(()) => (StatusCode::OK, "healthy", "connected"),
        Err(e) => {
            warn!("Health check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", "disconnected")
        }
    };

    (
        status,
        Json(HealthResponse {
            status: health.to_string(),
            timestamp: Utc::now(),
            uptime_seconds: state.started_at.elapsed().as_secs(),
            database: database.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// OpenAPI document for this server
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub async fn route_not_found(uri: Uri) -> (StatusCode, Json<RouteNotFoundResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(RouteNotFoundResponse {
            error: "Route not found".to_string(),
            path: uri.path().to_string(),
        }),
    )
}
