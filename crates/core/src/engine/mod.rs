//! Ticket lifecycle engine.
//!
//! Owns the ticket repository and drives tickets through
//! create → claim → complete (or cancel / close), keeping the chef ledger and
//! the status projection in step. Chat side effects go through the
//! [`Messenger`] and never roll back committed state.

mod chefs;
mod error;
mod notices;
mod tickets;
mod types;

pub use error::EngineError;
pub use types::{
    ActiveTickets, ChefDebt, CompletionAmount, CompletionReceipt, CreateTicketRequest,
    CreatedTicket, DebtOverview, OrderHistory, OrderTotals, PurgeReport, RemovedChef,
};

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use regex_lite::Regex;
use tracing::{debug, info, warn};

use crate::access::{authorize, AccessControl, Action, Capabilities};
use crate::audit::{AuditEvent, AuditHandle};
use crate::config::{ClaimPolicy, OrdersConfig, TicketsConfig};
use crate::ledger::{Chef, ChefLedger, ChefStatus};
use crate::messaging::{Messenger, MessagingError};
use crate::metrics;
use crate::status::StatusProjection;
use crate::ticket::{TicketRepository, TicketStore};

/// The order desk state machine.
///
/// Cheap to clone; clones share the same repository and collaborators.
#[derive(Clone)]
pub struct TicketEngine {
    tickets: Arc<TicketRepository>,
    ledger: Arc<dyn ChefLedger>,
    messenger: Arc<dyn Messenger>,
    access: Arc<dyn AccessControl>,
    audit: Option<AuditHandle>,
    orders: Arc<OrdersConfig>,
    settings: Arc<TicketsConfig>,
    completion_pattern: Regex,
}

impl TicketEngine {
    /// Build the engine, rehydrating the ticket cache from `store`.
    pub fn new(
        store: Arc<dyn TicketStore>,
        ledger: Arc<dyn ChefLedger>,
        messenger: Arc<dyn Messenger>,
        access: Arc<dyn AccessControl>,
        orders: OrdersConfig,
        settings: TicketsConfig,
    ) -> Result<Self, EngineError> {
        let completion_pattern = Regex::new(&orders.completion_pattern)
            .map_err(|e| EngineError::InvalidConfig(format!("completion_pattern: {}", e)))?;
        let tickets = TicketRepository::load(store)?;

        let engine = Self {
            tickets: Arc::new(tickets),
            ledger,
            messenger,
            access,
            audit: None,
            orders: Arc::new(orders),
            settings: Arc::new(settings),
            completion_pattern,
        };
        engine.refresh_active_gauge();
        Ok(engine)
    }

    /// Attach the audit log.
    pub fn with_audit(mut self, audit: AuditHandle) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Finalize tickets a previous run left in COMPLETED state.
    ///
    /// Returns the number of tickets cleaned up.
    pub async fn recover(&self) -> Result<usize, EngineError> {
        let leftovers: Vec<_> = self
            .tickets
            .list()
            .into_iter()
            .filter(|t| t.completed)
            .collect();

        for ticket in &leftovers {
            self.tickets.remove(&ticket.channel_id)?;
            side_effect(
                "delete_channel",
                self.messenger.delete_channel(&ticket.channel_id),
            )
            .await;
            if let Some(chef_id) = &ticket.chef_id {
                self.release_chef(chef_id).await;
            }
        }

        if !leftovers.is_empty() {
            info!(count = leftovers.len(), "Finalized completed tickets from previous run");
        }
        self.refresh_active_gauge();
        self.refresh_projection().await;
        Ok(leftovers.len())
    }

    /// Current chef availability.
    pub fn status(&self) -> Result<StatusProjection, EngineError> {
        let chefs = self.ledger.list_all()?;
        Ok(StatusProjection::from_chefs(
            &chefs,
            self.settings.dashboard_capacity,
        ))
    }

    async fn capabilities(&self, user_id: &str) -> Result<Capabilities, EngineError> {
        self.access.capabilities(user_id).await.map_err(|e| {
            warn!(user_id, error = %e, "Role lookup failed, denying action");
            EngineError::NotAuthorized
        })
    }

    /// Look up the actor's roles once and check a ticket-independent action.
    async fn authorize_action(
        &self,
        actor: &str,
        action: Action<'_>,
    ) -> Result<Capabilities, EngineError> {
        let caps = self.capabilities(actor).await?;
        authorize(actor, caps, &action).map_err(|d| EngineError::from_denial(d, ""))?;
        Ok(caps)
    }

    fn may_claim(&self, chef: &Chef) -> bool {
        match self.settings.claim_policy {
            ClaimPolicy::NotClosed => chef.status != ChefStatus::Closed,
            ClaimPolicy::OpenOnly => chef.status == ChefStatus::Open,
        }
    }

    async fn emit(&self, event: AuditEvent) {
        if let Some(audit) = &self.audit {
            audit.emit(event).await;
        }
    }

    fn refresh_active_gauge(&self) {
        let active = self.tickets.count_where(|t| t.is_active());
        metrics::ACTIVE_TICKETS.set(active as i64);
    }

    /// Recompute the projection, update the gauge and post the dashboard.
    async fn refresh_projection(&self) {
        let projection = match self.status() {
            Ok(projection) => projection,
            Err(e) => {
                warn!(error = %e, "Failed to compute chef status projection");
                return;
            }
        };

        metrics::CHEFS_OPEN.set(projection.open as i64);
        debug!(
            open = projection.open,
            busy = projection.busy,
            closed = projection.closed,
            "Chef status projection updated"
        );

        if let Some(channel) = &self.settings.status_channel {
            side_effect(
                "post_status",
                self.messenger.send_message(channel, &projection.render()),
            )
            .await;
        }
    }

    /// Put a chef with no remaining claims back to OPEN, whatever their status.
    async fn release_chef(&self, chef_id: &str) {
        let remaining = self.tickets.count_where(|t| t.is_open_claim_of(chef_id));
        if remaining > 0 {
            return;
        }

        match self.ledger.get(chef_id) {
            Ok(Some(chef)) if chef.status != ChefStatus::Open => {
                if let Err(e) = self.ledger.set_status(chef_id, ChefStatus::Open) {
                    warn!(chef_id, error = %e, "Failed to reopen chef");
                    return;
                }
                info!(chef_id, "Chef has no remaining tickets, back to OPEN");
                self.refresh_projection().await;
            }
            Ok(_) => {}
            Err(e) => warn!(chef_id, error = %e, "Failed to load chef for release"),
        }
    }

    /// Delete a ticket channel after `grace_secs`, optionally dropping the
    /// ticket record first. Zero grace runs inline.
    async fn teardown(&self, channel_id: String, grace_secs: u64, forget_ticket: bool) {
        if grace_secs == 0 {
            self.finish_teardown(&channel_id, forget_ticket).await;
            return;
        }

        let engine = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(grace_secs)).await;
            engine.finish_teardown(&channel_id, forget_ticket).await;
        });
    }

    async fn finish_teardown(&self, channel_id: &str, forget_ticket: bool) {
        if forget_ticket {
            match self.tickets.remove(channel_id) {
                Ok(Some(_)) => debug!(channel_id, "Removed completed ticket"),
                Ok(None) => {}
                Err(e) => warn!(channel_id, error = %e, "Failed to remove completed ticket"),
            }
            self.refresh_active_gauge();
        }
        side_effect("delete_channel", self.messenger.delete_channel(channel_id)).await;
    }
}

/// Await a messaging call whose failure must not affect the caller.
async fn side_effect<F>(operation: &'static str, call: F)
where
    F: Future<Output = Result<(), MessagingError>>,
{
    if let Err(e) = call.await {
        warn!(operation, error = %e, "Messaging side effect failed");
        metrics::SIDE_EFFECT_FAILURES
            .with_label_values(&[operation])
            .inc();
    }
}
