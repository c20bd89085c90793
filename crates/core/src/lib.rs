//! QuickEats order desk core.
//!
//! Ticket lifecycle engine, chef ledger, ticket store and the chat platform
//! seams the server crate wires together.

pub mod access;
pub mod audit;
pub mod auth;
pub mod config;
pub mod engine;
pub mod ledger;
pub mod messaging;
pub mod metrics;
pub mod money;
pub mod status;
pub mod testing;
pub mod ticket;

pub use access::{authorize, AccessControl, AccessError, Action, Capabilities, StaticAccessControl};
pub use audit::{
    create_audit_system, AuditError, AuditEvent, AuditFilter, AuditHandle, AuditRecord,
    AuditStore, SqliteAuditStore,
};
pub use auth::{
    create_authenticator, ApiKeyAuthenticator, AuthError, Authenticator, Credentials, Identity,
    NoneAuthenticator,
};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthMethod, Config, ConfigError,
    SanitizedConfig,
};
pub use engine::{
    CompletionAmount, CompletionReceipt, CreateTicketRequest, CreatedTicket, EngineError,
    TicketEngine,
};
pub use ledger::{Chef, ChefLedger, ChefStatus, LedgerError, OrderType, SqliteChefLedger};
pub use messaging::{create_messenger, Messenger, MessagingError};
pub use status::StatusProjection;
pub use ticket::{SqliteTicketStore, StoreError, Ticket, TicketState, TicketStore};
