//! Risk Scoring
//!
//! Deterministic 0-10 score for a security event.

use crate::security::{RiskWeights, SecurityEventType};

/// Highest score an event can receive.
pub const MAX_RISK_SCORE: u8 = 10;

/// Scores an event from its type and the reputation of its source IP.
///
/// `recent_from_ip` is the number of events the same IP produced within the
/// burst window, not counting the event being scored.
pub fn calculate_risk_score(
    event_type: SecurityEventType,
    ip_blocked: bool,
    recent_from_ip: usize,
    weights: &RiskWeights,
) -> u8 {
    let mut score = u32::from(event_type.base_risk_score());

    if ip_blocked {
        score += u32::from(weights.blocked_ip_bonus);
    }
    if recent_from_ip > weights.burst_threshold {
        score += u32::from(weights.burst_bonus);
    }

    score.min(u32::from(MAX_RISK_SCORE)) as u8
}
