//! Audit Sink
//!
//! Destination for security events on the persistence backend. Writes are
//! fire-and-forget from the engine's point of view.

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::error::Result;

/// Action name used for every event the engine forwards.
pub const SECURITY_EVENT_ACTION: &str = "SECURITY_EVENT";

/// Backend that records audit actions.
#[async_trait]
pub trait AuditSink: Send + Sync + 'static {
    /// Records one action performed by `actor_id`.
    async fn log_action(&self, action: &str, actor_id: &str, details: Value) -> Result<()>;
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuditSink;

#[async_trait]
impl AuditSink for NoopAuditSink {
    async fn log_action(&self, _action: &str, _actor_id: &str, _details: Value) -> Result<()> {
        Ok(())
    }
}

/// Sink that writes each action as a structured log record under target `audit`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn log_action(&self, action: &str, actor_id: &str, details: Value) -> Result<()> {
        info!(target: "audit", action, actor_id, details = %details, "Audit action recorded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_noop_sink_accepts() {
        let sink = NoopAuditSink;
        assert!(sink
            .log_action(SECURITY_EVENT_ACTION, "u1", json!({"k": "v"}))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_tracing_sink_accepts() {
        let sink: Box<dyn AuditSink> = Box::new(TracingAuditSink);
        assert!(sink
            .log_action(SECURITY_EVENT_ACTION, "anonymous", json!(null))
            .await
            .is_ok());
    }
}
