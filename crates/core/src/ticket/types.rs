//! Ticket types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ledger::OrderType;

/// Derived lifecycle position of a ticket.
///
/// Cancelled and closed tickets are not represented: their records are removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketState {
    Unclaimed,
    Claimed,
    Completed,
}

impl TicketState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketState::Unclaimed => "UNCLAIMED",
            TicketState::Claimed => "CLAIMED",
            TicketState::Completed => "COMPLETED",
        }
    }
}

/// One customer order in flight, keyed by its chat channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub channel_id: String,
    pub customer_id: String,
    /// Set once the ticket is claimed.
    pub chef_id: Option<String>,
    pub order_type: OrderType,
    pub order_link: String,
    /// Free-text total as entered by the customer.
    pub total: String,
    pub special_instructions: Option<String>,
    pub created_at: DateTime<Utc>,
    pub claimed: bool,
    pub claimed_at: Option<DateTime<Utc>>,
    pub completed: bool,
}

impl Ticket {
    /// A fresh, unclaimed ticket.
    pub fn new(
        channel_id: impl Into<String>,
        customer_id: impl Into<String>,
        order_type: OrderType,
        order_link: impl Into<String>,
        total: impl Into<String>,
        special_instructions: Option<String>,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            customer_id: customer_id.into(),
            chef_id: None,
            order_type,
            order_link: order_link.into(),
            total: total.into(),
            special_instructions: special_instructions.filter(|s| !s.trim().is_empty()),
            created_at: Utc::now(),
            claimed: false,
            claimed_at: None,
            completed: false,
        }
    }

    pub fn state(&self) -> TicketState {
        match (self.claimed, self.completed) {
            (_, true) => TicketState::Completed,
            (true, false) => TicketState::Claimed,
            (false, false) => TicketState::Unclaimed,
        }
    }

    /// Unclaimed or claimed; a completed ticket only lingers for cleanup.
    pub fn is_active(&self) -> bool {
        !self.completed
    }

    /// Claimed, not yet completed, and assigned to `chef_id`.
    pub fn is_open_claim_of(&self, chef_id: &str) -> bool {
        self.claimed && !self.completed && self.chef_id.as_deref() == Some(chef_id)
    }

    /// Returns a copy claimed by `chef_id`.
    pub fn claimed_by(&self, chef_id: &str) -> Self {
        Self {
            chef_id: Some(chef_id.to_string()),
            claimed: true,
            claimed_at: Some(Utc::now()),
            ..self.clone()
        }
    }

    /// Returns a copy marked completed.
    pub fn marked_completed(&self) -> Self {
        Self {
            completed: true,
            ..self.clone()
        }
    }
}
