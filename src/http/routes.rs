use super::handlers;
use super::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Uploaded recordings can be long; raise the default multipart body cap.
const MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Service banner
        .route("/", get(handlers::index))
        // Health check
        .route("/health", get(handlers::health_check))
        // Transcription
        .route("/api/inference/", post(handlers::api_inference))
        // Model lifecycle introspection
        .route("/debug/models", get(handlers::debug_models))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
