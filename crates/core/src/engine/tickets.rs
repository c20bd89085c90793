use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::notices;
use super::{
    side_effect, ActiveTickets, CompletionAmount, CompletionReceipt, CreateTicketRequest,
    CreatedTicket, EngineError, PurgeReport, TicketEngine,
};
use crate::access::{authorize, Action};
use crate::audit::AuditEvent;
use crate::ledger::{ChefStatus, NewOrder, OrderType};
use crate::metrics;
use crate::money::amount_or;
use crate::ticket::Ticket;

impl TicketEngine {
    /// Open a ticket channel for a customer's order.
    pub async fn create_ticket(
        &self,
        request: CreateTicketRequest,
    ) -> Result<CreatedTicket, EngineError> {
        let duplicate_of = |tickets: &[&Ticket]| {
            tickets
                .iter()
                .find(|t| t.customer_id == request.customer_id && t.is_active())
                .map_or(Ok(()), |t| {
                    Err(EngineError::DuplicateTicket {
                        channel_id: t.channel_id.clone(),
                    })
                })
        };

        // Fail fast before creating a channel; re-checked at insert.
        let snapshot = self.tickets.list();
        duplicate_of(snapshot.iter().collect::<Vec<_>>().as_slice())?;

        let eligible: Vec<String> = self
            .ledger
            .list_all()?
            .into_iter()
            .filter(|c| c.status == ChefStatus::Open)
            .map(|c| c.id)
            .collect();

        let channel_id = self
            .messenger
            .create_ticket_channel(&request.customer_id, &eligible)
            .await
            .map_err(|e| {
                warn!(customer_id = %request.customer_id, error = %e, "Failed to create ticket channel");
                EngineError::ChannelUnavailable(e.to_string())
            })?;

        let ticket = Ticket::new(
            channel_id.clone(),
            request.customer_id.clone(),
            request.order_type,
            request.order_link.clone(),
            request.total.clone(),
            request.special_instructions.clone(),
        );

        let ticket = match self.tickets.insert_with(ticket, duplicate_of) {
            Ok(ticket) => ticket,
            Err(e) => {
                side_effect("delete_channel", self.messenger.delete_channel(&channel_id)).await;
                return Err(e);
            }
        };

        let active = self.tickets.count_where(|t| t.is_active());
        let high_demand = active >= self.settings.high_demand_threshold;
        metrics::TICKETS_CREATED.inc();
        metrics::ACTIVE_TICKETS.set(active as i64);

        info!(
            channel_id = %ticket.channel_id,
            customer_id = %ticket.customer_id,
            order_type = %ticket.order_type,
            eligible_chefs = eligible.len(),
            "Ticket created"
        );

        self.emit(AuditEvent::TicketCreated {
            channel_id: ticket.channel_id.clone(),
            customer_id: ticket.customer_id.clone(),
            order_type: ticket.order_type,
            total: ticket.total.clone(),
        })
        .await;

        side_effect(
            "send_message",
            self.messenger
                .send_message(&ticket.channel_id, &notices::welcome(&ticket, high_demand)),
        )
        .await;

        Ok(CreatedTicket {
            ticket,
            high_demand,
        })
    }

    /// Assign an unclaimed ticket to `chef_id`.
    pub async fn claim_ticket(&self, channel_id: &str, chef_id: &str) -> Result<Ticket, EngineError> {
        self.authorize_action(chef_id, Action::ClaimTicket).await?;

        // Chef checked under the ticket lock, same as remove_chef.
        let mut claimant = None;
        let ticket = self.tickets.update(channel_id, |t| {
            if t.claimed {
                return Err(EngineError::AlreadyClaimed(channel_id.to_string()));
            }
            let chef = self
                .ledger
                .get(chef_id)?
                .filter(|c| self.may_claim(c))
                .ok_or_else(|| EngineError::ChefUnavailable(chef_id.to_string()))?;
            claimant = Some(chef);
            Ok(t.claimed_by(chef_id))
        })?;
        let chef = claimant.ok_or_else(|| EngineError::ChefUnavailable(chef_id.to_string()))?;

        metrics::TICKET_TRANSITIONS
            .with_label_values(&["claimed"])
            .inc();
        info!(channel_id, chef_id, "Ticket claimed");

        let open_claims = self.tickets.count_where(|t| t.is_open_claim_of(chef_id));
        if open_claims > 1 && chef.status != ChefStatus::Busy {
            match self.ledger.set_status(chef_id, ChefStatus::Busy) {
                Ok(_) => {
                    info!(chef_id, open_claims, "Chef is now BUSY");
                    self.refresh_projection().await;
                }
                Err(e) => warn!(chef_id, error = %e, "Failed to mark chef busy"),
            }
        }

        self.emit(AuditEvent::TicketClaimed {
            channel_id: channel_id.to_string(),
            chef_id: chef_id.to_string(),
        })
        .await;

        side_effect(
            "set_channel_visibility",
            self.messenger
                .set_channel_visibility(channel_id, chef_id, true),
        )
        .await;
        side_effect(
            "send_message",
            self.messenger
                .send_message(channel_id, &notices::claimed(chef_id)),
        )
        .await;

        Ok(ticket)
    }

    /// Complete a claimed ticket and charge the assigned chef.
    ///
    /// The debt increment and history record commit before the ticket is
    /// marked completed; if they fail the ticket is left as it was. A retry
    /// after the ticket write failed finds the recorded order and does not
    /// charge again.
    pub async fn complete_ticket(
        &self,
        channel_id: &str,
        actor_id: &str,
        amount: CompletionAmount,
    ) -> Result<CompletionReceipt, EngineError> {
        let caps = self.capabilities(actor_id).await?;

        let mut recorded = None;
        let ticket = self.tickets.update(channel_id, |t| {
            authorize(
                actor_id,
                caps,
                &Action::CompleteTicket {
                    assigned_chef: t.chef_id.as_deref(),
                },
            )
            .map_err(|d| EngineError::from_denial(d, channel_id))?;

            if t.completed {
                return Err(EngineError::AlreadyCompleted(channel_id.to_string()));
            }
            let chef_id = match (&t.chef_id, t.claimed) {
                (Some(chef_id), true) => chef_id.clone(),
                _ => return Err(EngineError::NotClaimed(channel_id.to_string())),
            };

            let order = NewOrder {
                channel_id: t.channel_id.clone(),
                chef_id,
                customer_id: t.customer_id.clone(),
                order_type: t.order_type,
                amount: self.resolve_amount(t, amount)?,
            };
            recorded = Some(self.ledger.record_completed_order(&order)?);
            Ok(t.marked_completed())
        })?;

        let (chef, order) = recorded.ok_or_else(|| {
            EngineError::PersistenceFailure("completion was not recorded".to_string())
        })?;

        metrics::TICKET_TRANSITIONS
            .with_label_values(&["completed"])
            .inc();
        metrics::record_completion(order.order_type.as_str(), order.amount);
        self.refresh_active_gauge();

        info!(
            channel_id,
            chef_id = %chef.id,
            completed_by = actor_id,
            amount = %order.amount,
            debt = %chef.debt,
            "Ticket completed"
        );

        self.emit(AuditEvent::TicketCompleted {
            channel_id: channel_id.to_string(),
            chef_id: chef.id.clone(),
            completed_by: actor_id.to_string(),
            order_id: order.id,
            amount: order.amount,
        })
        .await;

        side_effect(
            "send_message",
            self.messenger
                .send_message(channel_id, &notices::completed(order.amount)),
        )
        .await;
        side_effect(
            "notify_user",
            self.messenger
                .notify_user(&chef.id, &notices::debt_summary(&chef, order.amount)),
        )
        .await;

        self.release_chef(&chef.id).await;
        self.teardown(
            channel_id.to_string(),
            self.settings.completion_grace_secs,
            true,
        )
        .await;

        Ok(CompletionReceipt {
            ticket,
            order,
            chef,
        })
    }

    /// Amount to charge, bounded to `0..=orders.max_amount`.
    fn resolve_amount(
        &self,
        ticket: &Ticket,
        amount: CompletionAmount,
    ) -> Result<Decimal, EngineError> {
        let value = match amount {
            CompletionAmount::Fixed(value) => value,
            CompletionAmount::OrderTypeFee => match ticket.order_type {
                OrderType::DoorDash => self.orders.doordash_fee,
                OrderType::UberEats => self.orders.ubereats_fee,
            },
            CompletionAmount::FromTotal => amount_or(&ticket.total, self.orders.fallback_amount),
        };

        if value < Decimal::ZERO {
            return Err(EngineError::InvalidAmount(format!("{} is negative", value)));
        }
        if value > self.orders.max_amount {
            return Err(EngineError::InvalidAmount(format!(
                "{} exceeds the {} limit",
                value, self.orders.max_amount
            )));
        }
        Ok(value)
    }

    /// Withdraw an unclaimed ticket.
    pub async fn cancel_ticket(&self, channel_id: &str, actor_id: &str) -> Result<Ticket, EngineError> {
        let caps = self.capabilities(actor_id).await?;

        let ticket = self.tickets.remove_if(channel_id, |t| {
            authorize(
                actor_id,
                caps,
                &Action::CancelTicket {
                    customer: &t.customer_id,
                },
            )
            .map_err(|d| EngineError::from_denial(d, channel_id))?;
            if t.claimed {
                return Err(EngineError::AlreadyClaimed(channel_id.to_string()));
            }
            Ok(())
        })?;

        metrics::TICKET_TRANSITIONS
            .with_label_values(&["cancelled"])
            .inc();
        self.refresh_active_gauge();
        info!(channel_id, cancelled_by = actor_id, "Ticket cancelled");

        self.emit(AuditEvent::TicketCancelled {
            channel_id: channel_id.to_string(),
            cancelled_by: actor_id.to_string(),
        })
        .await;

        side_effect(
            "send_message",
            self.messenger
                .send_message(channel_id, &notices::cancelled()),
        )
        .await;
        self.teardown(
            channel_id.to_string(),
            self.settings.close_grace_secs,
            false,
        )
        .await;

        Ok(ticket)
    }

    /// Close a ticket that will not be completed.
    pub async fn close_ticket(
        &self,
        channel_id: &str,
        actor_id: &str,
        reason: Option<String>,
    ) -> Result<Ticket, EngineError> {
        let caps = self.capabilities(actor_id).await?;

        let ticket = self.tickets.remove_if(channel_id, |t| {
            authorize(
                actor_id,
                caps,
                &Action::CloseTicket {
                    customer: &t.customer_id,
                    assigned_chef: t.chef_id.as_deref(),
                },
            )
            .map_err(|d| EngineError::from_denial(d, channel_id))?;
            if t.completed {
                return Err(EngineError::AlreadyCompleted(channel_id.to_string()));
            }
            Ok(())
        })?;

        metrics::TICKET_TRANSITIONS
            .with_label_values(&["closed"])
            .inc();
        self.refresh_active_gauge();
        info!(channel_id, closed_by = actor_id, reason = ?reason, "Ticket closed");

        self.emit(AuditEvent::TicketClosed {
            channel_id: channel_id.to_string(),
            closed_by: actor_id.to_string(),
            reason: reason.clone(),
        })
        .await;

        side_effect(
            "send_message",
            self.messenger
                .send_message(channel_id, &notices::closed(reason.as_deref())),
        )
        .await;

        if let Some(chef_id) = ticket.chef_id.as_deref().filter(|_| ticket.claimed) {
            self.release_chef(chef_id).await;
        }
        self.teardown(
            channel_id.to_string(),
            self.settings.close_grace_secs,
            false,
        )
        .await;

        Ok(ticket)
    }

    /// Forget a ticket whose channel was deleted outside the order desk.
    ///
    /// Returns the dropped ticket, or `None` for channels that were not tickets.
    pub async fn channel_removed(&self, channel_id: &str) -> Result<Option<Ticket>, EngineError> {
        let Some(ticket) = self.tickets.remove(channel_id)? else {
            debug!(channel_id, "Ignoring removal of non-ticket channel");
            return Ok(None);
        };

        metrics::TICKET_TRANSITIONS
            .with_label_values(&["channel_removed"])
            .inc();
        self.refresh_active_gauge();
        info!(channel_id, state = ticket.state().as_str(), "Ticket channel removed externally");

        self.emit(AuditEvent::TicketChannelRemoved {
            channel_id: channel_id.to_string(),
        })
        .await;

        if let Some(chef_id) = ticket.chef_id.as_deref().filter(|_| ticket.claimed) {
            self.release_chef(chef_id).await;
        }

        Ok(Some(ticket))
    }

    /// Inspect a chat message and complete the ticket when its assigned chef
    /// reports the order as placed.
    ///
    /// Messages outside ticket channels, from anyone but the assigned chef, or
    /// not matching the completion pattern are ignored.
    pub async fn handle_chat_message(
        &self,
        channel_id: &str,
        author_id: &str,
        content: &str,
    ) -> Result<Option<CompletionReceipt>, EngineError> {
        let Some(ticket) = self.tickets.get(channel_id) else {
            return Ok(None);
        };
        if !ticket.is_open_claim_of(author_id) || !self.completion_pattern.is_match(content) {
            return Ok(None);
        }

        debug!(channel_id, author_id, "Completion message detected");
        self.complete_ticket(channel_id, author_id, CompletionAmount::FromTotal)
            .await
            .map(Some)
    }

    /// Drop every ticket and delete their channels.
    pub async fn purge_tickets(&self, actor_id: &str) -> Result<PurgeReport, EngineError> {
        self.authorize_action(actor_id, Action::PurgeTickets).await?;

        let drained = self.tickets.drain()?;
        self.refresh_active_gauge();

        let deletions = drained
            .iter()
            .map(|t| self.messenger.delete_channel(&t.channel_id));
        let results = futures::future::join_all(deletions).await;

        let mut failed = 0;
        for (ticket, result) in drained.iter().zip(results) {
            if let Err(e) = result {
                warn!(channel_id = %ticket.channel_id, error = %e, "Failed to delete ticket channel");
                metrics::SIDE_EFFECT_FAILURES
                    .with_label_values(&["delete_channel"])
                    .inc();
                failed += 1;
            }
        }

        let chefs_reopened = self.ledger.reopen_active()?;
        self.refresh_projection().await;

        let report = PurgeReport {
            deleted: drained.len() - failed,
            failed,
            chefs_reopened,
        };
        metrics::TICKET_TRANSITIONS
            .with_label_values(&["purged"])
            .inc_by(drained.len() as u64);
        info!(
            purged_by = actor_id,
            deleted = report.deleted,
            failed = report.failed,
            chefs_reopened,
            "Purged all tickets"
        );

        self.emit(AuditEvent::TicketsPurged {
            purged_by: actor_id.to_string(),
            deleted: report.deleted,
            failed: report.failed,
        })
        .await;

        Ok(report)
    }

    /// Tickets not yet completed, oldest first.
    pub async fn active_tickets(&self, actor_id: &str) -> Result<ActiveTickets, EngineError> {
        self.authorize_action(actor_id, Action::ViewActiveTickets)
            .await?;

        let tickets: Vec<Ticket> = self
            .tickets
            .list()
            .into_iter()
            .filter(|t| t.is_active())
            .collect();
        let high_demand = tickets.len() >= self.settings.high_demand_threshold;
        Ok(ActiveTickets {
            tickets,
            high_demand,
        })
    }

    pub fn get_ticket(&self, channel_id: &str) -> Result<Ticket, EngineError> {
        self.tickets
            .get(channel_id)
            .ok_or_else(|| EngineError::NotFound(format!("Ticket {}", channel_id)))
    }
}
