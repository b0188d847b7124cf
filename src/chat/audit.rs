use std::sync::Arc;

use crate::chat::rooms::ConnectionId;

/// Structured-logging collaborator injected into the dispatcher at
/// construction. Advisory only: nothing here may block or fail an
/// operation.
pub trait AuditLog: Send + Sync {
    fn connection_opened(&self, conn_id: ConnectionId, user_id: Option<&str>);
    fn connection_closed(&self, conn_id: ConnectionId);
    fn member_joined(&self, chat_id: &str, conn_id: ConnectionId, user_id: Option<&str>);
    fn member_left(&self, chat_id: &str, conn_id: ConnectionId, user_id: Option<&str>);
    /// A request rejected before any state change (missing field, missing
    /// identity).
    fn request_rejected(&self, conn_id: ConnectionId, detail: &str);
    /// A persistence call failed or timed out.
    fn store_failure(&self, conn_id: ConnectionId, op: &str, detail: &str);
    /// A transient signal was dropped without surfacing an error.
    fn signal_dropped(&self, conn_id: ConnectionId, op: &str, detail: &str);
}

pub type SharedAudit = Arc<dyn AuditLog>;

/// Production impl backed by `tracing`.
pub struct TracingAudit;

impl AuditLog for TracingAudit {
    fn connection_opened(&self, conn_id: ConnectionId, user_id: Option<&str>) {
        tracing::info!(%conn_id, user_id, "connection opened");
    }

    fn connection_closed(&self, conn_id: ConnectionId) {
        tracing::info!(%conn_id, "connection closed");
    }

    fn member_joined(&self, chat_id: &str, conn_id: ConnectionId, user_id: Option<&str>) {
        tracing::info!(chat_id, %conn_id, user_id, "joined chat");
    }

    fn member_left(&self, chat_id: &str, conn_id: ConnectionId, user_id: Option<&str>) {
        tracing::info!(chat_id, %conn_id, user_id, "left chat");
    }

    fn request_rejected(&self, conn_id: ConnectionId, detail: &str) {
        tracing::debug!(%conn_id, detail, "request rejected");
    }

    fn store_failure(&self, conn_id: ConnectionId, op: &str, detail: &str) {
        tracing::error!(%conn_id, op, detail, "store operation failed");
    }

    fn signal_dropped(&self, conn_id: ConnectionId, op: &str, detail: &str) {
        tracing::warn!(%conn_id, op, detail, "signal dropped");
    }
}
