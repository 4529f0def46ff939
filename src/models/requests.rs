//! Request DTOs for the HTTP surface
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Request body for POST /api/auth/login
///
/// `success` is the verdict of the upstream identity provider.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginAttemptRequest {
    #[serde(default)]
    pub email: String,
    pub success: bool,
}

/// Request body for POST /api/auth/password/validate
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordRequest {
    pub password: String,
}

/// Request body for POST /api/sessions and POST /api/sessions/validate
#[derive(Debug, Clone, Deserialize)]
pub struct SessionRequest {
    pub session_id: String,
    pub user_id: String,
}

impl SessionRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.session_id.trim().is_empty() {
            return Some("session_id cannot be empty".to_string());
        }
        if self.user_id.trim().is_empty() {
            return Some("user_id cannot be empty".to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_deserialize() {
        let json = r#"{"email": "alice@corp.com", "success": false}"#;
        let req: LoginAttemptRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.email, "alice@corp.com");
        assert!(!req.success);
    }

    #[test]
    fn test_login_request_missing_email_is_empty() {
        let req: LoginAttemptRequest = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert_eq!(req.email, "");
    }

    #[test]
    fn test_validate_empty_session_id() {
        let req = SessionRequest {
            session_id: " ".to_string(),
            user_id: "u1".to_string(),
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_valid_session_request() {
        let req = SessionRequest {
            session_id: "s1".to_string(),
            user_id: "u1".to_string(),
        };
        assert!(req.validate().is_none());
    }
}
