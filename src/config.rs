//! Configuration Module
//!
//! Handles loading and managing configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::security::SecurityPolicy;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub cache_max_entries: usize,
    /// Default TTL in milliseconds for entries stored without one
    pub cache_default_ttl_ms: u64,
    /// Cache sweep interval in seconds
    pub cache_sweep_interval: u64,
    /// Security sweep interval in seconds
    pub security_sweep_interval: u64,
    pub max_login_attempts: u32,
    pub lockout_duration_minutes: u64,
    pub failure_window_minutes: u64,
    pub session_timeout_minutes: u64,
    pub password_min_length: usize,
    /// Allowed email domains; empty allows all
    pub allowed_domains: Vec<String>,
    pub blocked_ips: Vec<String>,
    /// Use `x-forwarded-for` for the client IP; disable when not behind a proxy
    pub trust_forwarded_for: bool,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `CACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 300000)
    /// - `CACHE_SWEEP_INTERVAL_SECS` - Cache sweep frequency (default: 60)
    /// - `SECURITY_SWEEP_INTERVAL_SECS` - Security sweep frequency (default: 300)
    /// - `MAX_LOGIN_ATTEMPTS` - Failures before lockout (default: 5)
    /// - `LOCKOUT_DURATION_MINUTES` - Lockout length (default: 15)
    /// - `FAILURE_WINDOW_MINUTES` - Inactivity that resets a failure count (default: 15)
    /// - `SESSION_TIMEOUT_MINUTES` - Session idle timeout (default: 30)
    /// - `PASSWORD_MIN_LENGTH` - Minimum password length (default: 8)
    /// - `ALLOWED_DOMAINS` - Comma-separated email domains (default: none)
    /// - `BLOCKED_IPS` - Comma-separated IP addresses (default: none)
    /// - `TRUST_FORWARDED_FOR` - Read the client IP from `x-forwarded-for` (default: true)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_max_entries: parse_var("CACHE_MAX_ENTRIES", defaults.cache_max_entries),
            cache_default_ttl_ms: parse_var("CACHE_DEFAULT_TTL_MS", defaults.cache_default_ttl_ms),
            cache_sweep_interval: parse_var("CACHE_SWEEP_INTERVAL_SECS", defaults.cache_sweep_interval),
            security_sweep_interval: parse_var(
                "SECURITY_SWEEP_INTERVAL_SECS",
                defaults.security_sweep_interval,
            ),
            max_login_attempts: parse_var("MAX_LOGIN_ATTEMPTS", defaults.max_login_attempts),
            lockout_duration_minutes: parse_var(
                "LOCKOUT_DURATION_MINUTES",
                defaults.lockout_duration_minutes,
            ),
            failure_window_minutes: parse_var(
                "FAILURE_WINDOW_MINUTES",
                defaults.failure_window_minutes,
            ),
            session_timeout_minutes: parse_var(
                "SESSION_TIMEOUT_MINUTES",
                defaults.session_timeout_minutes,
            ),
            password_min_length: parse_var("PASSWORD_MIN_LENGTH", defaults.password_min_length),
            allowed_domains: list_var("ALLOWED_DOMAINS"),
            blocked_ips: list_var("BLOCKED_IPS"),
            trust_forwarded_for: parse_var("TRUST_FORWARDED_FOR", defaults.trust_forwarded_for),
            server_port: parse_var("SERVER_PORT", defaults.server_port),
        }
    }

    /// Builds the security policy described by this configuration.
    pub fn security_policy(&self) -> SecurityPolicy {
        SecurityPolicy {
            max_login_attempts: self.max_login_attempts,
            lockout_duration_minutes: self.lockout_duration_minutes,
            failure_window_minutes: self.failure_window_minutes,
            session_timeout_minutes: self.session_timeout_minutes,
            password_min_length: self.password_min_length,
            ..SecurityPolicy::default()
        }
        .with_allowed_domains(self.allowed_domains.iter().cloned())
        .with_blocked_ips(self.blocked_ips.iter().cloned())
    }

    pub fn cache_sweep_every(&self) -> Duration {
        Duration::from_secs(self.cache_sweep_interval.max(1))
    }

    pub fn security_sweep_every(&self) -> Duration {
        Duration::from_secs(self.security_sweep_interval.max(1))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_max_entries: 1000,
            cache_default_ttl_ms: 300_000,
            cache_sweep_interval: 60,
            security_sweep_interval: 300,
            max_login_attempts: 5,
            lockout_duration_minutes: 15,
            failure_window_minutes: 15,
            session_timeout_minutes: 30,
            password_min_length: 8,
            allowed_domains: Vec::new(),
            blocked_ips: Vec::new(),
            trust_forwarded_for: true,
            server_port: 3000,
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn list_var(name: &str) -> Vec<String> {
    env::var(name)
        .map(|v| parse_list(&v))
        .unwrap_or_default()
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.cache_max_entries, 1000);
        assert_eq!(config.cache_default_ttl_ms, 300_000);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cache_sweep_interval, 60);
        assert_eq!(config.security_sweep_interval, 300);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        for name in [
            "CACHE_MAX_ENTRIES",
            "CACHE_DEFAULT_TTL_MS",
            "CACHE_SWEEP_INTERVAL_SECS",
            "SECURITY_SWEEP_INTERVAL_SECS",
            "MAX_LOGIN_ATTEMPTS",
            "LOCKOUT_DURATION_MINUTES",
            "FAILURE_WINDOW_MINUTES",
            "SESSION_TIMEOUT_MINUTES",
            "PASSWORD_MIN_LENGTH",
            "ALLOWED_DOMAINS",
            "BLOCKED_IPS",
            "TRUST_FORWARDED_FOR",
            "SERVER_PORT",
        ] {
            env::remove_var(name);
        }

        assert_eq!(Config::from_env(), Config::default());
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            parse_list(" corp.com, ,plant.corp.com ,"),
            vec!["corp.com".to_string(), "plant.corp.com".to_string()]
        );
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn test_security_policy_from_config() {
        let config = Config {
            max_login_attempts: 3,
            failure_window_minutes: 60,
            allowed_domains: vec!["Corp.com".to_string()],
            blocked_ips: vec!["6.6.6.6".to_string()],
            ..Config::default()
        };
        let policy = config.security_policy();

        assert_eq!(policy.max_login_attempts, 3);
        assert_eq!(policy.failure_window_ms(), 60 * 60_000);
        assert!(policy.is_domain_allowed("a@corp.com"));
        assert!(policy.is_ip_blocked("6.6.6.6"));
    }
}
