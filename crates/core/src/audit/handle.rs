use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use super::AuditEvent;

/// Event plus the moment it was emitted.
#[derive(Debug, Clone)]
pub struct AuditEventEnvelope {
    pub timestamp: DateTime<Utc>,
    pub event: AuditEvent,
}

impl AuditEventEnvelope {
    fn now(event: AuditEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Cloneable sender side of the audit log.
///
/// Emitting never fails the caller; delivery problems are logged.
#[derive(Clone)]
pub struct AuditHandle {
    tx: mpsc::Sender<AuditEventEnvelope>,
}

impl AuditHandle {
    pub fn new(tx: mpsc::Sender<AuditEventEnvelope>) -> Self {
        Self { tx }
    }

    /// Queue an event, waiting for buffer space if needed.
    pub async fn emit(&self, event: AuditEvent) {
        let kind = event.event_type();
        if self.tx.send(AuditEventEnvelope::now(event)).await.is_err() {
            tracing::error!(event_type = kind, "Audit writer gone, event dropped");
        }
    }

    /// Queue an event without waiting. Returns false if it was dropped.
    pub fn try_emit(&self, event: AuditEvent) -> bool {
        let kind = event.event_type();
        match self.tx.try_send(AuditEventEnvelope::now(event)) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(event_type = kind, error = %e, "Failed to queue audit event");
                false
            }
        }
    }
}
