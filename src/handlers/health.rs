use axum::Json;
use crate::models::HealthResponse;
use tracing::debug;

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    debug!("Health check requested");
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Relay is running".to_string(),
    })
}

/// Readiness check endpoint
pub async fn ready_check() -> Json<HealthResponse> {
    debug!("Readiness check requested");
    // The relay keeps no state worth waiting for, so it is ready as soon as it listens.
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Relay is ready".to_string(),
    })
}
