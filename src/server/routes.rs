//! Router configuration for the web server.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // Site registration
        .route("/api/seo/site", post(handlers::register_site))
        // Triggers acknowledge with 202 and run detached
        .route(
            "/api/seo/compliance/trigger",
            post(handlers::trigger_compliance),
        )
        .route(
            "/api/seo/performance/trigger",
            post(handlers::trigger_performance),
        )
        // Latest audited records
        .route("/api/seo/compliance", get(handlers::get_compliance))
        .route("/api/seo/performance", get(handlers::get_performance))
        // Lifecycle events
        .route(
            "/api/seo/events/:organization_id",
            get(handlers::event_stream),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
