//! Role lookup and the permission rules of every engine action.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::config::AccessConfig;

/// Roles a user holds on the chat platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub admin: bool,
    pub chef: bool,
}

impl Capabilities {
    pub const NONE: Capabilities = Capabilities {
        admin: false,
        chef: false,
    };

    pub fn admin() -> Self {
        Self {
            admin: true,
            chef: false,
        }
    }

    pub fn chef() -> Self {
        Self {
            admin: false,
            chef: true,
        }
    }

    /// Holds the chef role, or is an admin.
    pub fn can_cook(&self) -> bool {
        self.chef || self.admin
    }
}

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("Role lookup failed: {0}")]
    Lookup(String),
}

/// Resolves a user's roles.
#[async_trait]
pub trait AccessControl: Send + Sync {
    async fn capabilities(&self, user_id: &str) -> Result<Capabilities, AccessError>;
}

/// Role assignments read from configuration.
pub struct StaticAccessControl {
    admins: HashSet<String>,
    chefs: HashSet<String>,
}

impl StaticAccessControl {
    pub fn new(config: &AccessConfig) -> Self {
        Self {
            admins: config.admins.iter().cloned().collect(),
            chefs: config.chefs.iter().cloned().collect(),
        }
    }
}

#[async_trait]
impl AccessControl for StaticAccessControl {
    async fn capabilities(&self, user_id: &str) -> Result<Capabilities, AccessError> {
        Ok(Capabilities {
            admin: self.admins.contains(user_id),
            chef: self.chefs.contains(user_id),
        })
    }
}

/// An action checked against the actor's capabilities.
#[derive(Debug, Clone, Copy)]
pub enum Action<'a> {
    ClaimTicket,
    CompleteTicket { assigned_chef: Option<&'a str> },
    CancelTicket { customer: &'a str },
    CloseTicket {
        customer: &'a str,
        assigned_chef: Option<&'a str>,
    },
    SetChefStatus { target: &'a str },
    ViewChefDebt { target: &'a str },
    ViewOrderHistory { target: Option<&'a str> },
    ViewAllDebts,
    ViewActiveTickets,
    ClearDebt,
    RemoveChef,
    PurgeTickets,
}

/// Why an action was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// The actor lacks the required role.
    MissingRole,
    /// The actor is not the chef assigned to the ticket.
    NotAssignedChef,
}

/// Decide whether `actor` holding `caps` may perform `action`.
pub fn authorize(actor: &str, caps: Capabilities, action: &Action<'_>) -> Result<(), Denial> {
    if caps.admin {
        return Ok(());
    }

    let allowed = match *action {
        Action::ClaimTicket => caps.chef,
        Action::CompleteTicket { assigned_chef } => {
            if assigned_chef != Some(actor) {
                return Err(Denial::NotAssignedChef);
            }
            true
        }
        Action::CancelTicket { customer } => customer == actor,
        Action::CloseTicket {
            customer,
            assigned_chef,
        } => customer == actor || assigned_chef == Some(actor),
        Action::SetChefStatus { target } => caps.chef && target == actor,
        Action::ViewChefDebt { target } => target == actor,
        Action::ViewOrderHistory { target } => target.is_none_or(|t| t == actor),
        Action::ViewAllDebts
        | Action::ViewActiveTickets
        | Action::ClearDebt
        | Action::RemoveChef
        | Action::PurgeTickets => false,
    };

    if allowed {
        Ok(())
    } else {
        Err(Denial::MissingRole)
    }
}
