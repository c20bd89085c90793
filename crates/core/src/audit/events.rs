use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::{ChefStatus, OrderType};

/// Audit event types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    // System events
    ServiceStarted {
        version: String,
        config_hash: String,
    },
    ServiceStopped {
        reason: String,
    },

    // Ticket lifecycle
    TicketCreated {
        channel_id: String,
        customer_id: String,
        order_type: OrderType,
        total: String,
    },
    TicketClaimed {
        channel_id: String,
        chef_id: String,
    },
    TicketCompleted {
        channel_id: String,
        chef_id: String,
        completed_by: String,
        order_id: i64,
        amount: Decimal,
    },
    TicketCancelled {
        channel_id: String,
        cancelled_by: String,
    },
    TicketClosed {
        channel_id: String,
        closed_by: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    /// The ticket's channel disappeared outside of the order desk.
    TicketChannelRemoved {
        channel_id: String,
    },
    TicketsPurged {
        purged_by: String,
        deleted: usize,
        failed: usize,
    },

    // Chef ledger
    ChefStatusChanged {
        chef_id: String,
        changed_by: String,
        status: ChefStatus,
    },
    DebtCleared {
        chef_id: String,
        cleared_by: String,
        amount: Decimal,
    },
    ChefRemoved {
        chef_id: String,
        removed_by: String,
        historical_orders: u32,
    },
}

impl AuditEvent {
    /// Stable name stored in the `event_type` column.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ServiceStarted { .. } => "service_started",
            Self::ServiceStopped { .. } => "service_stopped",
            Self::TicketCreated { .. } => "ticket_created",
            Self::TicketClaimed { .. } => "ticket_claimed",
            Self::TicketCompleted { .. } => "ticket_completed",
            Self::TicketCancelled { .. } => "ticket_cancelled",
            Self::TicketClosed { .. } => "ticket_closed",
            Self::TicketChannelRemoved { .. } => "ticket_channel_removed",
            Self::TicketsPurged { .. } => "tickets_purged",
            Self::ChefStatusChanged { .. } => "chef_status_changed",
            Self::DebtCleared { .. } => "debt_cleared",
            Self::ChefRemoved { .. } => "chef_removed",
        }
    }

    /// Ticket channel the event refers to, if any.
    pub fn channel_id(&self) -> Option<&str> {
        match self {
            Self::TicketCreated { channel_id, .. }
            | Self::TicketClaimed { channel_id, .. }
            | Self::TicketCompleted { channel_id, .. }
            | Self::TicketCancelled { channel_id, .. }
            | Self::TicketClosed { channel_id, .. }
            | Self::TicketChannelRemoved { channel_id } => Some(channel_id),
            _ => None,
        }
    }

    /// User who caused the event, if any.
    pub fn actor_id(&self) -> Option<&str> {
        match self {
            Self::TicketCreated { customer_id, .. } => Some(customer_id),
            Self::TicketClaimed { chef_id, .. } => Some(chef_id),
            Self::TicketCompleted { completed_by, .. } => Some(completed_by),
            Self::TicketCancelled { cancelled_by, .. } => Some(cancelled_by),
            Self::TicketClosed { closed_by, .. } => Some(closed_by),
            Self::TicketsPurged { purged_by, .. } => Some(purged_by),
            Self::ChefStatusChanged { changed_by, .. } => Some(changed_by),
            Self::DebtCleared { cleared_by, .. } => Some(cleared_by),
            Self::ChefRemoved { removed_by, .. } => Some(removed_by),
            Self::ServiceStarted { .. }
            | Self::ServiceStopped { .. }
            | Self::TicketChannelRemoved { .. } => None,
        }
    }
}

/// Stored audit row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub channel_id: Option<String>,
    pub actor_id: Option<String>,
    pub data: AuditEvent,
}
