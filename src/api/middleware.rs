//! Rate-limit middleware for `/api` routes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::handlers::{AppState, ClientContext};
use crate::error::Error;

/// Rejects the request with 429 when the caller's IP exceeds the rule
/// matching the request path.
pub async fn rate_limit(
    State(state): State<AppState>,
    client: ClientContext,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    if !state.security.check_rate_limit(&path, &client.ip) {
        debug!(ip = %client.ip, %path, "Request rejected by rate limit");
        return Error::RateLimited(format!("Too many requests to {}", path)).into_response();
    }

    next.run(request).await
}
