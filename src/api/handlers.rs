//! API Handlers
//!
//! HTTP request handlers for each endpoint the reporting portal calls.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{ConnectInfo, FromRequestParts, Path, State},
    http::{request::Parts, HeaderMap, StatusCode},
    Json,
};
use serde_json::Value;

use crate::cache::{CacheStats, TtlCache};
use crate::clock::current_timestamp_ms;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{
    DashboardResponse, HealthResponse, InvalidateResponse, LoginAttemptRequest,
    LoginAttemptResponse, PasswordRequest, ResolveAlertResponse, SessionRequest, SessionResponse,
    SessionValidationResponse,
};
use crate::security::{default_rate_limit_rules, PasswordValidation, SecurityEngine, TracingAuditSink};

/// Client IP used when neither a trusted `x-forwarded-for` entry nor the peer
/// address is available.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Application state shared across all handlers.
///
/// Both services are internally synchronized, so the state is cheap to clone.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Cache for user profiles and report listings
    pub cache: TtlCache<Value>,
    pub security: SecurityEngine,
    /// Take the client IP from `x-forwarded-for` when present
    pub trust_forwarded_for: bool,
}

impl AppState {
    pub fn new(cache: TtlCache<Value>, security: SecurityEngine) -> Self {
        Self {
            cache,
            security,
            trust_forwarded_for: true,
        }
    }

    pub fn with_trust_forwarded_for(mut self, trust: bool) -> Self {
        self.trust_forwarded_for = trust;
        self
    }

    /// Creates a new AppState from configuration.
    ///
    /// Audit records go to the `audit` tracing target.
    pub fn from_config(config: &Config) -> Self {
        let cache = TtlCache::new(config.cache_max_entries, config.cache_default_ttl_ms);
        let security = SecurityEngine::new(
            config.security_policy(),
            default_rate_limit_rules(),
            Arc::new(TracingAuditSink),
        );
        Self::new(cache, security).with_trust_forwarded_for(config.trust_forwarded_for)
    }
}

// == Client Context ==
/// Caller identity used for lockout keys, rate limits and session pinning.
///
/// The IP is the first `x-forwarded-for` entry when the state trusts that
/// header, else the peer address, else `"unknown"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientContext {
    pub ip: String,
    pub user_agent: String,
}

#[async_trait]
impl FromRequestParts<AppState> for ClientContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let forwarded = if state.trust_forwarded_for {
            forwarded_ip(&parts.headers)
        } else {
            None
        };
        let peer = ConnectInfo::<SocketAddr>::from_request_parts(parts, state)
            .await
            .ok()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        Ok(Self {
            ip: forwarded
                .or(peer)
                .unwrap_or_else(|| UNKNOWN_CLIENT.to_string()),
            user_agent: user_agent(&parts.headers),
        })
    }
}

/// First non-empty entry of `x-forwarded-for`.
pub fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(String::from)
}

pub fn user_agent(headers: &HeaderMap) -> String {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string()
}

// == Cache ==
/// Handler for GET /api/cache/stats
pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache.stats())
}

/// Handler for DELETE /api/cache/users/:user_id
///
/// Drops the user's profile and report listing.
pub async fn invalidate_user_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<InvalidateResponse> {
    let removed = state.cache.invalidate_user(&user_id);
    Json(InvalidateResponse { user_id, removed })
}

// == Auth ==
/// Handler for POST /api/auth/login
///
/// Runs the attempt through the block list, domain allow list and lockout
/// tracking. A denied attempt is still a 200; the body carries the verdict.
pub async fn login_attempt_handler(
    State(state): State<AppState>,
    client: ClientContext,
    Json(req): Json<LoginAttemptRequest>,
) -> Json<LoginAttemptResponse> {
    let outcome =
        state
            .security
            .handle_login_attempt(&req.email, &client.ip, &client.user_agent, req.success);
    Json(LoginAttemptResponse::new(outcome))
}

/// Handler for POST /api/auth/password/validate
pub async fn validate_password_handler(
    State(state): State<AppState>,
    Json(req): Json<PasswordRequest>,
) -> Json<PasswordValidation> {
    Json(state.security.validate_password(&req.password))
}

// == Sessions ==
/// Handler for POST /api/sessions
///
/// Binds the session to the caller's IP.
pub async fn create_session_handler(
    State(state): State<AppState>,
    client: ClientContext,
    Json(req): Json<SessionRequest>,
) -> Result<(StatusCode, Json<SessionResponse>)> {
    if let Some(error_msg) = req.validate() {
        return Err(Error::InvalidRequest(error_msg));
    }

    state
        .security
        .create_session(&req.session_id, &req.user_id, &client.ip);

    Ok((StatusCode::CREATED, Json(SessionResponse::created(req.session_id))))
}

/// Handler for POST /api/sessions/validate
pub async fn validate_session_handler(
    State(state): State<AppState>,
    client: ClientContext,
    Json(req): Json<SessionRequest>,
) -> Result<Json<SessionValidationResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(Error::InvalidRequest(error_msg));
    }

    let valid = state
        .security
        .validate_session(&req.session_id, &req.user_id, &client.ip);

    Ok(Json(SessionValidationResponse {
        session_id: req.session_id,
        valid,
    }))
}

/// Handler for DELETE /api/sessions/:session_id
pub async fn destroy_session_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionResponse>> {
    if !state.security.destroy_session(&session_id) {
        return Err(Error::NotFound(format!("Session '{}' not found", session_id)));
    }
    Ok(Json(SessionResponse::destroyed(session_id)))
}

// == Security ==
/// Handler for GET /api/security/dashboard
pub async fn dashboard_handler(State(state): State<AppState>) -> Json<DashboardResponse> {
    Json(DashboardResponse::new(
        state.security.security_dashboard(),
        current_timestamp_ms(),
    ))
}

/// Handler for POST /api/security/alerts/:id/resolve
pub async fn resolve_alert_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ResolveAlertResponse>> {
    if !state.security.resolve_alert(&id) {
        return Err(Error::NotFound(format!("Alert '{}' not found", id)));
    }
    Ok(Json(ResolveAlertResponse { id, resolved: true }))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
