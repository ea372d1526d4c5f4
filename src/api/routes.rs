//! API Routes
//!
//! Configures the Axum router with the admin endpoints and, optionally, the
//! application's own routes behind the response-cache middleware.

use axum::{
    middleware,
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    delete_handler, health_handler, invalidate_handler, stats_handler, AppState,
};
use super::interceptor::response_cache;

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/cache/keys/:key", delete(delete_handler))
        .route("/cache/prefixes/:prefix", delete(invalidate_handler))
}

/// Creates the admin router.
///
/// # Endpoints
/// - `GET /health` - Health check with remote connection state
/// - `GET /stats` - Tier and hit/miss statistics
/// - `DELETE /cache/keys/:key` - Delete one key from both tiers
/// - `DELETE /cache/prefixes/:prefix` - Invalidate every key under a prefix
pub fn create_router(state: AppState) -> Router {
    mount(state, Router::new(), false)
}

/// Merges application routes with the admin routes.
///
/// When `cache_responses` is set the application routes are wrapped in the
/// response-cache middleware; admin routes never are.
pub fn mount(state: AppState, app_routes: Router<AppState>, cache_responses: bool) -> Router {
    let app_routes = if cache_responses {
        app_routes.layer(middleware::from_fn_with_state(state.clone(), response_cache))
    } else {
        app_routes
    };

    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    admin_routes()
        .merge(app_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
