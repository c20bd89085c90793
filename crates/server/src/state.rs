use std::sync::Arc;

use quickeats_core::{AuditHandle, AuditStore, Authenticator, Config, SanitizedConfig, TicketEngine};

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    engine: TicketEngine,
    audit: AuditHandle,
    audit_store: Arc<dyn AuditStore>,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        engine: TicketEngine,
        audit: AuditHandle,
        audit_store: Arc<dyn AuditStore>,
    ) -> Self {
        Self {
            config,
            authenticator,
            engine,
            audit,
            audit_store,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn engine(&self) -> &TicketEngine {
        &self.engine
    }

    pub fn audit(&self) -> &AuditHandle {
        &self.audit
    }

    pub fn audit_store(&self) -> &dyn AuditStore {
        self.audit_store.as_ref()
    }
}
