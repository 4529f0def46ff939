//! Security Module
//!
//! Heuristics run on every authentication attempt, API request and session
//! check: lockout, rate limiting, session pinning, password rules, risk
//! scoring and alerting.

pub mod audit;
mod engine;
pub mod password;
mod policy;
pub mod risk;
mod types;


pub use audit::{AuditSink, NoopAuditSink, TracingAuditSink, SECURITY_EVENT_ACTION};
pub use engine::{SecurityEngine, DASHBOARD_EVENT_LIMIT, MAX_ALERTS, MAX_EVENTS};
pub use policy::{default_rate_limit_rules, RateLimitRule, RiskWeights, SecurityPolicy};
pub use types::{
    AlertSeverity, EventDetails, LoginAttemptRecord, LoginOutcome, NewSecurityEvent,
    PasswordValidation, RateLimitRecord, SecurityAlert, SecurityDashboard, SecurityEvent,
    SecurityEventType, Session, SweepReport,
};
