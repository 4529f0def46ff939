//! Security Policy
//!
//! Immutable configuration for the security engine: login and session policy,
//! rate-limit rules and risk-scoring weights.

use std::collections::HashSet;

const MINUTE_MS: u64 = 60_000;

// == Security Policy ==
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityPolicy {
    /// Failed attempts per `email|ip` before lockout
    pub max_login_attempts: u32,
    pub lockout_duration_minutes: u64,
    /// Inactivity after which an unlocked failure count is forgotten
    pub failure_window_minutes: u64,
    /// Idle time after which a session is invalid
    pub session_timeout_minutes: u64,
    pub password_min_length: usize,
    /// Email domains allowed to log in; empty allows every domain
    pub allowed_domains: HashSet<String>,
    pub blocked_ips: HashSet<String>,
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self {
            max_login_attempts: 5,
            lockout_duration_minutes: 15,
            failure_window_minutes: 15,
            session_timeout_minutes: 30,
            password_min_length: 8,
            allowed_domains: HashSet::new(),
            blocked_ips: HashSet::new(),
        }
    }
}

impl SecurityPolicy {
    pub fn with_allowed_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_domains = domains
            .into_iter()
            .map(|d| d.into().trim().to_ascii_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        self
    }

    pub fn with_blocked_ips<I, S>(mut self, ips: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blocked_ips = ips
            .into_iter()
            .map(|ip| ip.into().trim().to_string())
            .filter(|ip| !ip.is_empty())
            .collect();
        self
    }

    pub fn lockout_duration_ms(&self) -> u64 {
        self.lockout_duration_minutes.saturating_mul(MINUTE_MS)
    }

    pub fn failure_window_ms(&self) -> u64 {
        self.failure_window_minutes.saturating_mul(MINUTE_MS)
    }

    pub fn session_timeout_ms(&self) -> u64 {
        self.session_timeout_minutes.saturating_mul(MINUTE_MS)
    }

    pub fn is_ip_blocked(&self, ip: &str) -> bool {
        self.blocked_ips.contains(ip)
    }

    /// Checks the domain after the last `@` against the allow list.
    ///
    /// Comparison is case-insensitive. With an empty allow list every email,
    /// malformed or not, is allowed. Otherwise an email without `@` has an
    /// empty domain and is rejected.
    pub fn is_domain_allowed(&self, email: &str) -> bool {
        if self.allowed_domains.is_empty() {
            return true;
        }
        let domain = email
            .rsplit_once('@')
            .map(|(_, domain)| domain.trim())
            .unwrap_or("");
        self.allowed_domains
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(domain))
    }
}

// == Rate Limit Rule ==
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitRule {
    /// Matched as a substring of the request endpoint
    pub endpoint_pattern: String,
    pub max_requests: usize,
    pub window_ms: u64,
    pub block_duration_ms: u64,
}

impl RateLimitRule {
    pub fn new(
        endpoint_pattern: impl Into<String>,
        max_requests: usize,
        window_ms: u64,
        block_duration_ms: u64,
    ) -> Self {
        Self {
            endpoint_pattern: endpoint_pattern.into(),
            max_requests,
            window_ms,
            block_duration_ms,
        }
    }

    pub fn matches(&self, endpoint: &str) -> bool {
        endpoint.contains(self.endpoint_pattern.as_str())
    }
}

/// Rules applied when none are configured, most specific first.
pub fn default_rate_limit_rules() -> Vec<RateLimitRule> {
    vec![
        RateLimitRule::new("/api/auth", 5, 15 * MINUTE_MS, 15 * MINUTE_MS),
        RateLimitRule::new("/api/reports", 30, MINUTE_MS, 5 * MINUTE_MS),
        RateLimitRule::new("/api/", 100, MINUTE_MS, MINUTE_MS),
    ]
}

// == Risk Weights ==
/// Adjustments applied on top of an event type's base score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskWeights {
    /// Added when the event's IP is on the block list
    pub blocked_ip_bonus: u8,
    /// Added when the IP produced more than `burst_threshold` events
    pub burst_bonus: u8,
    pub burst_threshold: usize,
    pub burst_window_minutes: u64,
    /// Score at which an alert is raised
    pub alert_threshold: u8,
    /// Score at which that alert is high severity
    pub high_alert_threshold: u8,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            blocked_ip_bonus: 5,
            burst_bonus: 3,
            burst_threshold: 10,
            burst_window_minutes: 60,
            alert_threshold: 7,
            high_alert_threshold: 9,
        }
    }
}

impl RiskWeights {
    pub fn burst_window_ms(&self) -> u64 {
        self.burst_window_minutes.saturating_mul(MINUTE_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_defaults() {
        let policy = SecurityPolicy::default();
        assert_eq!(policy.max_login_attempts, 5);
        assert_eq!(policy.lockout_duration_ms(), 15 * 60_000);
        assert_eq!(policy.session_timeout_ms(), 30 * 60_000);
        assert_eq!(policy.password_min_length, 8);
        assert_eq!(policy.failure_window_ms(), 15 * 60_000);
    }

    #[test]
    fn test_durations_saturate() {
        let policy = SecurityPolicy {
            lockout_duration_minutes: u64::MAX,
            failure_window_minutes: u64::MAX,
            session_timeout_minutes: u64::MAX,
            ..SecurityPolicy::default()
        };
        assert_eq!(policy.lockout_duration_ms(), u64::MAX);
        assert_eq!(policy.failure_window_ms(), u64::MAX);
        assert_eq!(policy.session_timeout_ms(), u64::MAX);

        let weights = RiskWeights {
            burst_window_minutes: u64::MAX,
            ..RiskWeights::default()
        };
        assert_eq!(weights.burst_window_ms(), u64::MAX);
    }

    #[test]
    fn test_empty_allow_list_allows_everything() {
        let policy = SecurityPolicy::default();
        assert!(policy.is_domain_allowed("someone@anywhere.io"));
        assert!(policy.is_domain_allowed(""));
        assert!(policy.is_domain_allowed("not-an-email"));
    }

    #[test]
    fn test_domain_allow_list() {
        let policy = SecurityPolicy::default().with_allowed_domains(["Corp.com", " plant.corp.com "]);

        assert!(policy.is_domain_allowed("alice@corp.com"));
        assert!(policy.is_domain_allowed("BOB@CORP.COM"));
        assert!(policy.is_domain_allowed("carol@plant.corp.com"));
        assert!(!policy.is_domain_allowed("mallory@evil.com"));
        assert!(!policy.is_domain_allowed(""));
        assert!(!policy.is_domain_allowed("corp.com"));
    }

    #[test]
    fn test_domain_uses_last_at() {
        let policy = SecurityPolicy::default().with_allowed_domains(["corp.com"]);
        assert!(policy.is_domain_allowed("weird@name@corp.com"));
        assert!(!policy.is_domain_allowed("x@corp.com@evil.com"));
    }

    #[test]
    fn test_blocked_ips() {
        let policy = SecurityPolicy::default().with_blocked_ips(["10.0.0.66", ""]);
        assert!(policy.is_ip_blocked("10.0.0.66"));
        assert!(!policy.is_ip_blocked("10.0.0.1"));
        assert_eq!(policy.blocked_ips.len(), 1);
    }

    #[test]
    fn test_rule_substring_match() {
        let rule = RateLimitRule::new("/api/auth", 5, 60_000, 60_000);
        assert!(rule.matches("/api/auth/login"));
        assert!(rule.matches("/v2/api/auth"));
        assert!(!rule.matches("/api/reports"));
    }

    #[test]
    fn test_default_rules_most_specific_first() {
        let rules = default_rate_limit_rules();
        let first = rules.iter().find(|r| r.matches("/api/auth/login")).unwrap();
        assert_eq!(first.endpoint_pattern, "/api/auth");
    }
}
