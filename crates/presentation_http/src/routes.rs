//! Route definitions

use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use infrastructure::ServerConfig;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::{handlers, state::AppState};

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Status endpoints
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        // Chat API
        .route("/api/chat", post(handlers::chat::chat))
        // Attach state
        .with_state(state)
}

/// Router with request tracing and CORS applied
pub fn create_app(state: AppState, server: &ServerConfig) -> Router {
    create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(server))
}

/// CORS policy: any origin when `allowed_origins` is empty, only those otherwise
pub fn cors_layer(server: &ServerConfig) -> CorsLayer {
    if server.cors_open() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = server
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring unparsable CORS origin");
                None
            },
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
