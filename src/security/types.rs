//! Security Types
//!
//! Events, alerts, tracked records and the values returned by the engine.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

// == Event Type ==
/// Kind of security event recorded by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityEventType {
    LoginAttempt,
    LoginSuccess,
    LoginFailure,
    Logout,
    UnauthorizedAccess,
    PermissionDenied,
    SuspiciousActivity,
    DataAccess,
    DataModification,
    PasswordChange,
    AccountLockout,
    SessionTimeout,
}

impl SecurityEventType {
    /// All event types, in declaration order.
    pub const ALL: [SecurityEventType; 12] = [
        Self::LoginAttempt,
        Self::LoginSuccess,
        Self::LoginFailure,
        Self::Logout,
        Self::UnauthorizedAccess,
        Self::PermissionDenied,
        Self::SuspiciousActivity,
        Self::DataAccess,
        Self::DataModification,
        Self::PasswordChange,
        Self::AccountLockout,
        Self::SessionTimeout,
    ];

    /// Base risk score before IP-based adjustments.
    pub fn base_risk_score(self) -> u8 {
        match self {
            Self::LoginAttempt => 1,
            Self::LoginSuccess => 0,
            Self::LoginFailure => 3,
            Self::Logout => 0,
            Self::UnauthorizedAccess => 8,
            Self::PermissionDenied => 5,
            Self::SuspiciousActivity => 7,
            Self::DataAccess => 2,
            Self::DataModification => 4,
            Self::PasswordChange => 2,
            Self::AccountLockout => 6,
            Self::SessionTimeout => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoginAttempt => "login_attempt",
            Self::LoginSuccess => "login_success",
            Self::LoginFailure => "login_failure",
            Self::Logout => "logout",
            Self::UnauthorizedAccess => "unauthorized_access",
            Self::PermissionDenied => "permission_denied",
            Self::SuspiciousActivity => "suspicious_activity",
            Self::DataAccess => "data_access",
            Self::DataModification => "data_modification",
            Self::PasswordChange => "password_change",
            Self::AccountLockout => "account_lockout",
            Self::SessionTimeout => "session_timeout",
        }
    }
}

impl fmt::Display for SecurityEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Event Details ==
/// Structured payload attached to an event.
///
/// Each engine-generated event uses the variant matching its type. Callers
/// logging their own events use `Fields`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventDetails {
    #[default]
    None,
    LoginFailure {
        attempt_count: u32,
    },
    Lockout {
        attempt_count: u32,
        locked_until: u64,
    },
    IpMismatch {
        session_ip: String,
        request_ip: String,
    },
    AccessDenied {
        reason: String,
    },
    Fields(BTreeMap<String, String>),
}

// == New Security Event ==
/// Event as submitted by a caller, before stamping and scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSecurityEvent {
    pub event_type: SecurityEventType,
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub ip_address: String,
    pub user_agent: String,
    #[serde(default)]
    pub details: EventDetails,
}

impl NewSecurityEvent {
    pub fn new(
        event_type: SecurityEventType,
        ip_address: impl Into<String>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            event_type,
            user_id: None,
            email: None,
            ip_address: ip_address.into(),
            user_agent: user_agent.into(),
            details: EventDetails::None,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_details(mut self, details: EventDetails) -> Self {
        self.details = details;
        self
    }
}

// == Security Event ==
/// Event as stored in the engine's log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub event_type: SecurityEventType,
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub ip_address: String,
    pub user_agent: String,
    /// Unix milliseconds
    pub timestamp: u64,
    pub details: EventDetails,
    /// 0 to 10
    pub risk_score: u8,
}

impl SecurityEvent {
    pub(crate) fn stamp(event: NewSecurityEvent, timestamp: u64, risk_score: u8) -> Self {
        Self {
            event_type: event.event_type,
            user_id: event.user_id,
            email: event.email,
            ip_address: event.ip_address,
            user_agent: event.user_agent,
            timestamp,
            details: event.details,
            risk_score,
        }
    }

    /// Identity reported to the audit log.
    pub fn actor_id(&self) -> &str {
        self.user_id
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("anonymous")
    }
}

// == Alerts ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityAlert {
    pub id: String,
    pub severity: AlertSeverity,
    pub message: String,
    pub user_id: Option<String>,
    /// Unix milliseconds
    pub timestamp: u64,
    pub resolved: bool,
}

// == Login Outcome ==
/// Result of processing a login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LoginOutcome {
    /// Successful login processed; any failure history cleared
    Allowed,
    /// Source IP is on the block list
    BlockedIp,
    /// Email domain is not on the allow list
    DomainDenied,
    /// Key is locked out until the given instant
    Locked { locked_until: u64 },
    /// Failure counted; `locked` is true when this attempt triggered a lockout
    FailedRecorded { attempt_count: u32, locked: bool },
}

impl LoginOutcome {
    /// Boolean verdict: true only for `Allowed`.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

// == Password Validation ==
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

// == Tracked Records ==
/// Failure history for one `email|ip` key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginAttemptRecord {
    pub count: u32,
    pub last_attempt_at: u64,
    pub locked_until: Option<u64>,
}

impl LoginAttemptRecord {
    pub fn is_locked(&self, now_ms: u64) -> bool {
        self.locked_until.is_some_and(|until| now_ms < until)
    }

    /// True once a lockout has ended, or once an unlocked record has seen no
    /// attempt for `failure_window_ms`.
    pub fn is_expired(&self, now_ms: u64, failure_window_ms: u64) -> bool {
        match self.locked_until {
            Some(until) => now_ms >= until,
            None => now_ms.saturating_sub(self.last_attempt_at) >= failure_window_ms,
        }
    }
}

/// Sliding window for one `pattern|ip` key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitRecord {
    /// Oldest first
    pub request_timestamps: VecDeque<u64>,
    pub blocked: bool,
    pub blocked_until: Option<u64>,
}

impl RateLimitRecord {
    /// Clears the block together with the window that caused it.
    pub fn lift_block(&mut self) {
        self.blocked = false;
        self.blocked_until = None;
        self.request_timestamps.clear();
    }

    /// Drops timestamps that have left a window of `window_ms` at `now_ms`.
    pub fn prune_window(&mut self, now_ms: u64, window_ms: u64) {
        while self
            .request_timestamps
            .front()
            .is_some_and(|&t| now_ms.saturating_sub(t) >= window_ms)
        {
            self.request_timestamps.pop_front();
        }
    }

    /// Not blocked and nothing left in the window.
    pub fn is_idle(&self) -> bool {
        !self.blocked && self.request_timestamps.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub ip_address: String,
    pub created_at: u64,
    pub last_activity_at: u64,
}

// == Dashboard ==
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityDashboard {
    /// Up to 20 most recent events from the last hour, oldest first
    pub recent_events: Vec<SecurityEvent>,
    pub active_alerts: Vec<SecurityAlert>,
    pub login_attempts_last_hour: usize,
    pub failed_logins_last_hour: usize,
    pub blocked_ip_count: usize,
    pub active_sessions: usize,
}

/// What a sweep reclaimed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub sessions: usize,
    pub rate_limit_blocks: usize,
    pub lockouts: usize,
    /// Idle rate-limit windows and decayed failure counts dropped
    pub stale_records: usize,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.sessions + self.rate_limit_blocks + self.lockouts + self.stale_records
    }
}
