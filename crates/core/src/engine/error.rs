use thiserror::Error;

use crate::access::Denial;
use crate::ledger::LedgerError;
use crate::ticket::StoreError;

/// Rejections and failures of engine operations.
///
/// Everything except `ChannelUnavailable`, `PersistenceFailure` and
/// `InvalidConfig` is an expected, user-facing outcome.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("You already have an open ticket ({channel_id})")]
    DuplicateTicket { channel_id: String },

    #[error("Ticket {0} has already been claimed")]
    AlreadyClaimed(String),

    #[error("Ticket {0} has already been completed")]
    AlreadyCompleted(String),

    #[error("Ticket {0} has not been claimed by a chef yet")]
    NotClaimed(String),

    #[error("Chef {0} is not available to take orders")]
    ChefUnavailable(String),

    #[error("You are not allowed to do that")]
    NotAuthorized,

    #[error("Only the assigned chef or an admin can complete ticket {0}")]
    NotAssignedChef(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Chef {chef_id} still has {count} active ticket(s)")]
    HasActiveTickets { chef_id: String, count: usize },

    #[error("{0} not found")]
    NotFound(String),

    #[error("Could not open a ticket channel: {0}")]
    ChannelUnavailable(String),

    #[error("Storage failure: {0}")]
    PersistenceFailure(String),

    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),
}

impl EngineError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateTicket { .. } => "duplicate_ticket",
            Self::AlreadyClaimed(_) => "already_claimed",
            Self::AlreadyCompleted(_) => "already_completed",
            Self::NotClaimed(_) => "not_claimed",
            Self::ChefUnavailable(_) => "chef_unavailable",
            Self::NotAuthorized => "not_authorized",
            Self::NotAssignedChef(_) => "not_assigned_chef",
            Self::InvalidAmount(_) => "invalid_amount",
            Self::HasActiveTickets { .. } => "has_active_tickets",
            Self::NotFound(_) => "not_found",
            Self::ChannelUnavailable(_) => "channel_unavailable",
            Self::PersistenceFailure(_) => "persistence_failure",
            Self::InvalidConfig(_) => "invalid_config",
        }
    }

    pub(crate) fn from_denial(denial: Denial, channel_id: &str) -> Self {
        match denial {
            Denial::MissingRole => Self::NotAuthorized,
            Denial::NotAssignedChef => Self::NotAssignedChef(channel_id.to_string()),
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(channel_id) => Self::NotFound(format!("Ticket {}", channel_id)),
            other => Self::PersistenceFailure(other.to_string()),
        }
    }
}

impl From<LedgerError> for EngineError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::NotFound(chef_id) => Self::NotFound(format!("Chef {}", chef_id)),
            LedgerError::InvalidAmount(reason) => Self::InvalidAmount(reason),
            other => Self::PersistenceFailure(other.to_string()),
        }
    }
}
