//! API Routes
//!
//! Configures the Axum router with all endpoints.

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cache_stats_handler, create_session_handler, dashboard_handler, destroy_session_handler,
    health_handler, invalidate_user_handler, login_attempt_handler, resolve_alert_handler,
    validate_password_handler, validate_session_handler, AppState,
};
use super::middleware::rate_limit;

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - Rate limiting: every `/api` route, keyed by client IP
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Full paths rather than `nest` so the middleware sees the original URI
    let api = Router::new()
        .route("/api/cache/stats", get(cache_stats_handler))
        .route("/api/cache/users/:user_id", delete(invalidate_user_handler))
        .route("/api/auth/login", post(login_attempt_handler))
        .route("/api/auth/password/validate", post(validate_password_handler))
        .route("/api/sessions", post(create_session_handler))
        .route("/api/sessions/validate", post(validate_session_handler))
        .route("/api/sessions/:session_id", delete(destroy_session_handler))
        .route("/api/security/dashboard", get(dashboard_handler))
        .route("/api/security/alerts/:id/resolve", post(resolve_alert_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit));

    Router::new()
        .route("/health", get(health_handler))
        .merge(api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
