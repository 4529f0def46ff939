//! Security Engine
//!
//! Login lockout, sliding-window rate limiting, IP-pinned sessions, event
//! logging with risk scoring, and alerting.
//!
//! All state lives behind one mutex per engine. Every read path re-checks
//! expiry itself; the background sweep only reclaims memory.

use std::collections::{HashMap, HashSet, VecDeque};
use std::ops::ControlFlow;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clock::{system_clock, SharedClock};
use crate::security::audit::{AuditSink, SECURITY_EVENT_ACTION};
use crate::security::password::validate_password;
use crate::security::risk::calculate_risk_score;
use crate::security::{
    AlertSeverity, EventDetails, LoginAttemptRecord, LoginOutcome, NewSecurityEvent,
    PasswordValidation, RateLimitRecord, RateLimitRule, RiskWeights, SecurityAlert,
    SecurityDashboard, SecurityEvent, SecurityEventType, SecurityPolicy, Session, SweepReport,
};
use crate::tasks::{spawn_periodic, SweepHandle};

/// Events kept in memory.
pub const MAX_EVENTS: usize = 1000;
/// Alerts kept in memory.
pub const MAX_ALERTS: usize = 100;
/// Events returned by the dashboard.
pub const DASHBOARD_EVENT_LIMIT: usize = 20;

const HOUR_MS: u64 = 60 * 60_000;
const DISTINCT_IP_WINDOW_MS: u64 = 30 * 60_000;
const DISTINCT_IP_THRESHOLD: usize = 3;

// == Engine State ==
#[derive(Debug, Default)]
struct SecurityState {
    login_attempts: HashMap<String, LoginAttemptRecord>,
    rate_limits: HashMap<String, RateLimitRecord>,
    sessions: HashMap<String, Session>,
    events: VecDeque<SecurityEvent>,
    alerts: VecDeque<SecurityAlert>,
}

impl SecurityState {
    fn push_event(&mut self, event: SecurityEvent) {
        if self.events.len() >= MAX_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    fn push_alert(&mut self, alert: SecurityAlert) {
        if self.alerts.len() >= MAX_ALERTS {
            self.alerts.pop_front();
        }
        self.alerts.push_back(alert);
    }

    fn events_from_ip_since(&self, ip: &str, since: u64) -> usize {
        self.events
            .iter()
            .filter(|e| e.timestamp >= since && e.ip_address == ip)
            .count()
    }

    fn failure_ips_for_email(&self, email: &str, since: u64) -> usize {
        self.events
            .iter()
            .filter(|e| {
                e.event_type == SecurityEventType::LoginFailure
                    && e.timestamp >= since
                    && e.email.as_deref() == Some(email)
            })
            .map(|e| e.ip_address.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Applies one login attempt for `key` to its failure record.
    fn record_login_attempt(
        &mut self,
        key: String,
        now: u64,
        success: bool,
        policy: &SecurityPolicy,
    ) -> AttemptDecision {
        if let Some(record) = self.login_attempts.get(&key) {
            if let Some(until) = record.locked_until.filter(|&until| now < until) {
                return AttemptDecision::Locked {
                    attempt_count: record.count,
                    locked_until: until,
                };
            }
            if record.is_expired(now, policy.failure_window_ms()) {
                // Lockout over or failures decayed: start from zero
                self.login_attempts.remove(&key);
            }
        }

        if success {
            self.login_attempts.remove(&key);
            return AttemptDecision::Cleared;
        }

        let record = self.login_attempts.entry(key).or_default();
        record.count = record.count.saturating_add(1);
        record.last_attempt_at = now;
        if record.count >= policy.max_login_attempts {
            record.locked_until = Some(now.saturating_add(policy.lockout_duration_ms()));
        }
        AttemptDecision::Failed {
            attempt_count: record.count,
            locked_until: record.locked_until,
        }
    }

    /// Drops everything that has expired at `now`.
    ///
    /// Rate-limit windows are pruned against the rule that created them and
    /// records left idle are removed. Login records go once their lockout
    /// ends or, if never locked, once they fall outside the failure window.
    fn sweep(&mut self, now: u64, policy: &SecurityPolicy, rules: &[RateLimitRule]) -> SweepReport {
        let sessions_before = self.sessions.len();
        let session_timeout_ms = policy.session_timeout_ms();
        self.sessions
            .retain(|_, s| now.saturating_sub(s.last_activity_at) <= session_timeout_ms);

        let mut rate_limit_blocks = 0;
        for (key, record) in self.rate_limits.iter_mut() {
            if record.blocked && record.blocked_until.map_or(true, |until| now >= until) {
                record.lift_block();
                rate_limit_blocks += 1;
            }
            // A key whose rule is gone keeps nothing
            record.prune_window(now, rule_window_ms(rules, key).unwrap_or(0));
        }
        let rate_limits_before = self.rate_limits.len();
        self.rate_limits.retain(|_, r| !r.is_idle());
        let mut stale_records = rate_limits_before - self.rate_limits.len();

        let mut lockouts = 0;
        let failure_window_ms = policy.failure_window_ms();
        self.login_attempts.retain(|_, r| {
            if !r.is_expired(now, failure_window_ms) {
                return true;
            }
            if r.locked_until.is_some() {
                lockouts += 1;
            } else {
                stale_records += 1;
            }
            false
        });

        SweepReport {
            sessions: sessions_before - self.sessions.len(),
            rate_limit_blocks,
            lockouts,
            stale_records,
        }
    }
}

enum AttemptDecision {
    Locked {
        attempt_count: u32,
        locked_until: u64,
    },
    Cleared,
    Failed {
        attempt_count: u32,
        locked_until: Option<u64>,
    },
}

enum SessionCheck {
    IpMismatch { session_ip: String },
    TimedOut,
}

// == Security Engine ==
/// Shareable security engine. Clones share state.
#[derive(Clone)]
pub struct SecurityEngine {
    policy: Arc<SecurityPolicy>,
    rules: Arc<Vec<RateLimitRule>>,
    weights: RiskWeights,
    clock: SharedClock,
    audit: Arc<dyn AuditSink>,
    state: Arc<Mutex<SecurityState>>,
    sweep: Arc<Mutex<Option<SweepHandle>>>,
}

impl std::fmt::Debug for SecurityEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityEngine")
            .field("policy", &self.policy)
            .field("rules", &self.rules)
            .field("weights", &self.weights)
            .finish_non_exhaustive()
    }
}

impl SecurityEngine {
    // == Constructor ==
    /// Creates an engine on the system clock with default risk weights.
    ///
    /// Rules are evaluated in the order given; the first matching rule wins.
    pub fn new(policy: SecurityPolicy, rules: Vec<RateLimitRule>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            policy: Arc::new(policy),
            rules: Arc::new(rules),
            weights: RiskWeights::default(),
            clock: system_clock(),
            audit,
            state: Arc::new(Mutex::new(SecurityState::default())),
            sweep: Arc::new(Mutex::new(None)),
        }
    }

    /// Replaces the clock. Call before cloning the engine.
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the risk weights. Call before cloning the engine.
    pub fn with_risk_weights(mut self, weights: RiskWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn policy(&self) -> &SecurityPolicy {
        &self.policy
    }

    pub fn is_ip_blocked(&self, ip: &str) -> bool {
        self.policy.is_ip_blocked(ip)
    }

    pub fn is_domain_allowed(&self, email: &str) -> bool {
        self.policy.is_domain_allowed(email)
    }

    // == Login Attempts ==
    /// Processes one login attempt for `email` from `ip`.
    ///
    /// `success` is the upstream credential check. The outcome is `Allowed`
    /// only for a successful attempt that passed every gate.
    pub fn handle_login_attempt(
        &self,
        email: &str,
        ip: &str,
        user_agent: &str,
        success: bool,
    ) -> LoginOutcome {
        if self.is_ip_blocked(ip) {
            self.log_security_event(
                NewSecurityEvent::new(SecurityEventType::UnauthorizedAccess, ip, user_agent)
                    .with_email(email)
                    .with_details(EventDetails::AccessDenied {
                        reason: "blocked_ip".to_string(),
                    }),
            );
            return LoginOutcome::BlockedIp;
        }

        if !self.is_domain_allowed(email) {
            self.log_security_event(
                NewSecurityEvent::new(SecurityEventType::UnauthorizedAccess, ip, user_agent)
                    .with_email(email)
                    .with_details(EventDetails::AccessDenied {
                        reason: "domain_not_allowed".to_string(),
                    }),
            );
            return LoginOutcome::DomainDenied;
        }

        let now = self.clock.now_ms();
        let key = login_key(email, ip);

        // Check, clear and count under one guard; logging happens after release
        let decision = self
            .state
            .lock()
            .record_login_attempt(key, now, success, &self.policy);

        let (attempt_count, locked_until) = match decision {
            AttemptDecision::Locked {
                attempt_count,
                locked_until,
            } => {
                debug!(email, ip, "Login rejected, key is locked");
                self.log_security_event(
                    NewSecurityEvent::new(SecurityEventType::AccountLockout, ip, user_agent)
                        .with_email(email)
                        .with_details(EventDetails::Lockout {
                            attempt_count,
                            locked_until,
                        }),
                );
                return LoginOutcome::Locked { locked_until };
            }
            AttemptDecision::Cleared => {
                self.log_security_event(
                    NewSecurityEvent::new(SecurityEventType::LoginSuccess, ip, user_agent)
                        .with_email(email),
                );
                return LoginOutcome::Allowed;
            }
            AttemptDecision::Failed {
                attempt_count,
                locked_until,
            } => (attempt_count, locked_until),
        };

        if locked_until.is_some() {
            warn!(email, ip, attempt_count, "Login key locked out");
            self.raise_alert(
                AlertSeverity::High,
                format!("Account {email} locked after {attempt_count} failed login attempts from {ip}"),
                None,
            );
        }

        self.log_security_event(
            NewSecurityEvent::new(SecurityEventType::LoginFailure, ip, user_agent)
                .with_email(email)
                .with_details(EventDetails::LoginFailure { attempt_count }),
        );

        LoginOutcome::FailedRecorded {
            attempt_count,
            locked: locked_until.is_some(),
        }
    }

    // == Rate Limiting ==
    /// Returns whether a request to `endpoint` from `ip` may proceed.
    ///
    /// Endpoints matching no rule are always allowed.
    pub fn check_rate_limit(&self, endpoint: &str, ip: &str) -> bool {
        let Some(rule) = self.rules.iter().find(|rule| rule.matches(endpoint)) else {
            return true;
        };

        let now = self.clock.now_ms();
        let key = rate_limit_key(&rule.endpoint_pattern, ip);
        let mut state = self.state.lock();
        let record = state.rate_limits.entry(key).or_default();

        if record.blocked {
            match record.blocked_until {
                Some(until) if now < until => {
                    debug!(endpoint, ip, "Request denied, still blocked");
                    return false;
                }
                _ => record.lift_block(),
            }
        }

        record.prune_window(now, rule.window_ms);

        if record.request_timestamps.len() >= rule.max_requests {
            record.blocked = true;
            record.blocked_until = Some(now.saturating_add(rule.block_duration_ms));
            warn!(
                endpoint,
                ip,
                pattern = %rule.endpoint_pattern,
                "Rate limit exceeded, blocking for {} ms",
                rule.block_duration_ms
            );
            return false;
        }

        record.request_timestamps.push_back(now);
        record.blocked = false;
        true
    }

    // == Sessions ==
    /// Registers a session. An existing session with the same id is replaced.
    pub fn create_session(&self, session_id: &str, user_id: &str, ip: &str) {
        let now = self.clock.now_ms();
        self.state.lock().sessions.insert(
            session_id.to_string(),
            Session {
                user_id: user_id.to_string(),
                ip_address: ip.to_string(),
                created_at: now,
                last_activity_at: now,
            },
        );
    }

    /// Removes a session, returning whether it existed.
    pub fn destroy_session(&self, session_id: &str) -> bool {
        self.state.lock().sessions.remove(session_id).is_some()
    }

    pub fn session(&self, session_id: &str) -> Option<Session> {
        self.state.lock().sessions.get(session_id).cloned()
    }

    pub fn active_session_count(&self) -> usize {
        self.state.lock().sessions.len()
    }

    /// Checks that `session_id` belongs to `user_id` on `ip` and is not idle.
    ///
    /// A valid check refreshes the session's activity time.
    pub fn validate_session(&self, session_id: &str, user_id: &str, ip: &str) -> bool {
        let now = self.clock.now_ms();
        let timeout = self.policy.session_timeout_ms();

        let failure = {
            let mut state = self.state.lock();
            let Some(session) = state.sessions.get_mut(session_id) else {
                return false;
            };
            if session.user_id != user_id {
                return false;
            }
            let failure = if session.ip_address != ip {
                SessionCheck::IpMismatch {
                    session_ip: session.ip_address.clone(),
                }
            } else if now.saturating_sub(session.last_activity_at) > timeout {
                SessionCheck::TimedOut
            } else {
                session.last_activity_at = now;
                return true;
            };
            if matches!(failure, SessionCheck::TimedOut) {
                state.sessions.remove(session_id);
            }
            failure
        };

        match failure {
            SessionCheck::IpMismatch { session_ip } => {
                warn!(session_id, user_id, %session_ip, request_ip = ip, "Session IP mismatch");
                self.log_security_event(
                    NewSecurityEvent::new(SecurityEventType::SuspiciousActivity, ip, "")
                        .with_user(user_id)
                        .with_details(EventDetails::IpMismatch {
                            session_ip,
                            request_ip: ip.to_string(),
                        }),
                );
            }
            SessionCheck::TimedOut => {
                info!(session_id, user_id, "Session timed out");
                self.log_security_event(
                    NewSecurityEvent::new(SecurityEventType::SessionTimeout, ip, "")
                        .with_user(user_id),
                );
            }
        }
        false
    }

    // == Passwords ==
    pub fn validate_password(&self, password: &str) -> PasswordValidation {
        validate_password(password, self.policy.password_min_length)
    }

    // == Events ==
    /// Scores an event of `event_type` from `ip` against the current log.
    pub fn calculate_risk_score(&self, event_type: SecurityEventType, ip: &str) -> u8 {
        let now = self.clock.now_ms();
        let state = self.state.lock();
        self.score(&state, event_type, ip, now)
    }

    fn score(&self, state: &SecurityState, event_type: SecurityEventType, ip: &str, now: u64) -> u8 {
        let since = now.saturating_sub(self.weights.burst_window_ms());
        calculate_risk_score(
            event_type,
            self.is_ip_blocked(ip),
            state.events_from_ip_since(ip, since),
            &self.weights,
        )
    }

    /// Stamps, scores and records an event, forwards it to the audit sink and
    /// raises any alerts it warrants.
    ///
    /// The audit write runs in the background; its failure is logged here and
    /// never reported to the caller.
    pub fn log_security_event(&self, event: NewSecurityEvent) -> SecurityEvent {
        let now = self.clock.now_ms();
        let recorded = {
            let mut state = self.state.lock();
            let risk_score = self.score(&state, event.event_type, &event.ip_address, now);
            let recorded = SecurityEvent::stamp(event, now, risk_score);
            state.push_event(recorded.clone());
            recorded
        };

        debug!(
            event_type = %recorded.event_type,
            ip = %recorded.ip_address,
            risk_score = recorded.risk_score,
            "Security event recorded"
        );

        self.dispatch_audit(&recorded);
        self.detect_suspicious_activity(&recorded, now);
        recorded
    }

    fn dispatch_audit(&self, event: &SecurityEvent) {
        let details = match serde_json::to_value(event) {
            Ok(details) => details,
            Err(err) => {
                warn!(error = %err, "Failed to serialize security event for audit");
                return;
            }
        };
        let actor_id = event.actor_id().to_string();
        let sink = Arc::clone(&self.audit);

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if let Err(err) = sink.log_action(SECURITY_EVENT_ACTION, &actor_id, details).await {
                        warn!(error = %err, %actor_id, "Failed to write security event to audit log");
                    }
                });
            }
            Err(_) => warn!(%actor_id, "No async runtime, audit write skipped"),
        }
    }

    fn detect_suspicious_activity(&self, event: &SecurityEvent, now: u64) {
        if event.event_type == SecurityEventType::LoginFailure {
            if let Some(email) = event.email.as_deref() {
                let since = now.saturating_sub(DISTINCT_IP_WINDOW_MS);
                let distinct_ips = self.state.lock().failure_ips_for_email(email, since);
                if distinct_ips >= DISTINCT_IP_THRESHOLD {
                    self.raise_alert(
                        AlertSeverity::High,
                        format!("Failed logins for {email} from {distinct_ips} different IPs in 30 minutes"),
                        event.user_id.clone(),
                    );
                }
            }
        }

        if event.risk_score >= self.weights.alert_threshold {
            let severity = if event.risk_score >= self.weights.high_alert_threshold {
                AlertSeverity::High
            } else {
                AlertSeverity::Medium
            };
            self.raise_alert(
                severity,
                format!(
                    "High-risk {} event from {} (score {})",
                    event.event_type, event.ip_address, event.risk_score
                ),
                event.user_id.clone(),
            );
        }
    }

    // == Alerts ==
    fn raise_alert(&self, severity: AlertSeverity, message: String, user_id: Option<String>) {
        warn!(?severity, %message, "Security alert raised");
        let alert = SecurityAlert {
            id: Uuid::new_v4().to_string(),
            severity,
            message,
            user_id,
            timestamp: self.clock.now_ms(),
            resolved: false,
        };
        self.state.lock().push_alert(alert);
    }

    /// Marks an alert resolved. Returns false for unknown ids.
    pub fn resolve_alert(&self, alert_id: &str) -> bool {
        let mut state = self.state.lock();
        match state.alerts.iter_mut().find(|a| a.id == alert_id) {
            Some(alert) => {
                alert.resolved = true;
                true
            }
            None => false,
        }
    }

    /// All retained alerts, oldest first.
    pub fn alerts(&self) -> Vec<SecurityAlert> {
        self.state.lock().alerts.iter().cloned().collect()
    }

    /// All retained events, oldest first.
    pub fn events(&self) -> Vec<SecurityEvent> {
        self.state.lock().events.iter().cloned().collect()
    }

    // == Dashboard ==
    pub fn security_dashboard(&self) -> SecurityDashboard {
        let now = self.clock.now_ms();
        let since = now.saturating_sub(HOUR_MS);
        let state = self.state.lock();

        let last_hour: Vec<&SecurityEvent> =
            state.events.iter().filter(|e| e.timestamp >= since).collect();
        let count_of = |event_type: SecurityEventType| {
            last_hour.iter().filter(|e| e.event_type == event_type).count()
        };
        let skip = last_hour.len().saturating_sub(DASHBOARD_EVENT_LIMIT);

        SecurityDashboard {
            recent_events: last_hour.iter().skip(skip).map(|e| (*e).clone()).collect(),
            active_alerts: state.alerts.iter().filter(|a| !a.resolved).cloned().collect(),
            login_attempts_last_hour: count_of(SecurityEventType::LoginAttempt),
            failed_logins_last_hour: count_of(SecurityEventType::LoginFailure),
            blocked_ip_count: self.policy.blocked_ips.len(),
            active_sessions: state.sessions.len(),
        }
    }

    // == Sweep ==
    /// Expires sessions, lapsed lockouts and lapsed rate-limit blocks.
    pub fn cleanup_expired(&self) -> SweepReport {
        let now = self.clock.now_ms();
        self.state.lock().sweep(now, &self.policy, &self.rules)
    }

    /// Starts the background sweep, replacing any sweep already running.
    ///
    /// # Panics
    /// Must be called from within a tokio runtime.
    pub fn start_sweep(&self, interval: Duration) {
        let state: Weak<Mutex<SecurityState>> = Arc::downgrade(&self.state);
        let clock = Arc::clone(&self.clock);
        let policy = Arc::clone(&self.policy);
        let rules = Arc::clone(&self.rules);

        let handle = spawn_periodic("security", interval, move || {
            let Some(state) = state.upgrade() else {
                return ControlFlow::Break(());
            };
            let report = state.lock().sweep(clock.now_ms(), &policy, &rules);
            if report.total() > 0 {
                info!(
                    sessions = report.sessions,
                    rate_limit_blocks = report.rate_limit_blocks,
                    lockouts = report.lockouts,
                    stale_records = report.stale_records,
                    "Security sweep reclaimed expired state"
                );
            } else {
                debug!("Security sweep: nothing expired");
            }
            ControlFlow::Continue(())
        });

        if let Some(previous) = self.sweep.lock().replace(handle) {
            previous.stop();
        }
    }

    pub fn stop_sweep(&self) {
        if let Some(handle) = self.sweep.lock().take() {
            handle.stop();
        }
    }
}

fn login_key(email: &str, ip: &str) -> String {
    format!("{email}|{ip}")
}

fn rate_limit_key(pattern: &str, ip: &str) -> String {
    format!("{pattern}|{ip}")
}

/// Window of the rule a rate-limit key was built from.
fn rule_window_ms(rules: &[RateLimitRule], key: &str) -> Option<u64> {
    let (pattern, _) = key.rsplit_once('|')?;
    rules
        .iter()
        .find(|rule| rule.endpoint_pattern == pattern)
        .map(|rule| rule.window_ms)
}
