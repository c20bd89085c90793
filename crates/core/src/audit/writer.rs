use std::sync::Arc;

use tokio::sync::mpsc;

use super::{AuditEventEnvelope, AuditHandle, AuditRecord, AuditStore};

/// Background task draining the audit channel into the store.
pub struct AuditWriter {
    rx: mpsc::Receiver<AuditEventEnvelope>,
    store: Arc<dyn AuditStore>,
}

impl AuditWriter {
    pub fn new(rx: mpsc::Receiver<AuditEventEnvelope>, store: Arc<dyn AuditStore>) -> Self {
        Self { rx, store }
    }

    /// Consume events until every `AuditHandle` is dropped.
    pub async fn run(mut self) {
        tracing::info!("Audit writer started");

        while let Some(AuditEventEnvelope { timestamp, event }) = self.rx.recv().await {
            let record = AuditRecord {
                id: 0,
                timestamp,
                event_type: event.event_type().to_string(),
                channel_id: event.channel_id().map(String::from),
                actor_id: event.actor_id().map(String::from),
                data: event,
            };

            if let Err(e) = self.store.insert(&record) {
                tracing::error!(event_type = %record.event_type, "Failed to write audit event: {}", e);
            }
        }

        tracing::info!("Audit writer shutting down");
    }
}

/// Wire up a handle/writer pair over a bounded channel.
///
/// Spawn the writer with `tokio::spawn(writer.run())` and clone the handle
/// wherever events are produced.
pub fn create_audit_system(
    store: Arc<dyn AuditStore>,
    buffer_size: usize,
) -> (AuditHandle, AuditWriter) {
    let (tx, rx) = mpsc::channel(buffer_size);
    (AuditHandle::new(tx), AuditWriter::new(rx, store))
}
