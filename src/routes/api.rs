use crate::{docs::ApiDoc, handlers::{diagnostics, health_check, ready_check}, websocket::{websocket_handler, RelayState}};
use axum::{http::HeaderValue, routing::get, Router};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create API routes
pub fn create_api_routes(state: Arc<RelayState>) -> Router {
    Router::<Arc<RelayState>>::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .route("/v1/diagnostics", get(diagnostics))
        .with_state(state)
}

/// Create the websocket route peers connect to, one relay channel per path segment
pub fn create_relay_routes(state: Arc<RelayState>) -> Router {
    Router::<Arc<RelayState>>::new()
        .route("/mesh/:channel", get(websocket_handler))
        .with_state(state)
}

/// The whole relay server: API, websocket relay, Swagger UI and request tracing
pub fn create_app(state: Arc<RelayState>) -> Router {
    Router::new()
        // Mount API routes
        .nest("/api", create_api_routes(state.clone()))
        // Mount the relay
        .merge(create_relay_routes(state))
        // Mount Swagger UI
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add tracing layer
        .layer(TraceLayer::new_for_http())
}

/// CORS for the relay API. No origins means any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return cors.allow_origin(Any);
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {}: {}", origin, e);
                None
            }
        })
        .collect();
    cors.allow_origin(allowed)
}
