//! Response DTOs for the HTTP surface
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::security::{LoginOutcome, SecurityDashboard};

/// Response body for POST /api/auth/login
#[derive(Debug, Clone, Serialize)]
pub struct LoginAttemptResponse {
    /// Boolean verdict kept for callers that only need allow/deny
    pub allowed: bool,
    #[serde(flatten)]
    pub outcome: LoginOutcome,
}

impl LoginAttemptResponse {
    pub fn new(outcome: LoginOutcome) -> Self {
        Self {
            allowed: outcome.is_allowed(),
            outcome,
        }
    }
}

/// Response body for POST /api/sessions/validate
#[derive(Debug, Clone, Serialize)]
pub struct SessionValidationResponse {
    pub session_id: String,
    pub valid: bool,
}

/// Response body for POST /api/sessions and DELETE /api/sessions/:session_id
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub message: String,
    pub session_id: String,
}

impl SessionResponse {
    pub fn created(session_id: impl Into<String>) -> Self {
        let session_id = session_id.into();
        Self {
            message: format!("Session '{}' created", session_id),
            session_id,
        }
    }

    pub fn destroyed(session_id: impl Into<String>) -> Self {
        let session_id = session_id.into();
        Self {
            message: format!("Session '{}' destroyed", session_id),
            session_id,
        }
    }
}

/// Response body for DELETE /api/cache/users/:user_id
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub user_id: String,
    pub removed: usize,
}

/// Response body for POST /api/security/alerts/:id/resolve
#[derive(Debug, Clone, Serialize)]
pub struct ResolveAlertResponse {
    pub id: String,
    pub resolved: bool,
}

/// Response body for GET /api/security/dashboard
#[derive(Debug, Clone, Serialize)]
pub struct DashboardResponse {
    /// Snapshot time in ISO 8601 format
    pub generated_at: String,
    #[serde(flatten)]
    pub dashboard: SecurityDashboard,
}

impl DashboardResponse {
    /// Wraps a dashboard taken at `now_ms` (Unix milliseconds).
    pub fn new(dashboard: SecurityDashboard, now_ms: u64) -> Self {
        let generated_at = chrono::DateTime::from_timestamp_millis(now_ms as i64)
            .unwrap_or_default()
            .to_rfc3339();
        Self {
            generated_at,
            dashboard,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response_flattens_outcome() {
        let resp = LoginAttemptResponse::new(LoginOutcome::FailedRecorded {
            attempt_count: 2,
            locked: false,
        });
        let json = serde_json::to_value(&resp).unwrap();

        assert_eq!(json["allowed"], false);
        assert_eq!(json["outcome"], "failed_recorded");
        assert_eq!(json["attempt_count"], 2);
    }

    #[test]
    fn test_login_response_allowed() {
        let json = serde_json::to_value(LoginAttemptResponse::new(LoginOutcome::Allowed)).unwrap();
        assert_eq!(json["allowed"], true);
        assert_eq!(json["outcome"], "allowed");
    }

    #[test]
    fn test_session_response_messages() {
        assert!(SessionResponse::created("s1").message.contains("created"));
        assert!(SessionResponse::destroyed("s1").message.contains("destroyed"));
    }

    #[test]
    fn test_dashboard_generated_at() {
        let dashboard = SecurityDashboard {
            recent_events: Vec::new(),
            active_alerts: Vec::new(),
            login_attempts_last_hour: 0,
            failed_logins_last_hour: 0,
            blocked_ip_count: 0,
            active_sessions: 0,
        };
        let resp = DashboardResponse::new(dashboard, 0);
        assert_eq!(resp.generated_at, "1970-01-01T00:00:00+00:00");

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["active_sessions"], 0);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
