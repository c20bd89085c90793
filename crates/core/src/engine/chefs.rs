use rust_decimal::Decimal;
use tracing::info;

use super::notices;
use super::{side_effect, ChefDebt, DebtOverview, EngineError, OrderHistory, RemovedChef, TicketEngine};
use crate::access::{authorize, Action};
use crate::audit::AuditEvent;
use crate::ledger::{Chef, ChefStatus, OrderFilter};

impl TicketEngine {
    /// Set a chef's availability, registering them if needed.
    ///
    /// Going CLOSED hides the chef's claimed tickets from their customers;
    /// going OPEN shows them again.
    pub async fn set_chef_status(
        &self,
        actor_id: &str,
        chef_id: &str,
        name: Option<&str>,
        status: ChefStatus,
    ) -> Result<Chef, EngineError> {
        self.authorize_action(actor_id, Action::SetChefStatus { target: chef_id })
            .await?;

        let name = match name {
            Some(name) => name.to_string(),
            None => self
                .ledger
                .get(chef_id)?
                .map(|c| c.name)
                .unwrap_or_else(|| chef_id.to_string()),
        };
        self.ledger.upsert_chef(chef_id, &name)?;
        let chef = self.ledger.set_status(chef_id, status)?;

        info!(chef_id, changed_by = actor_id, status = %status, "Chef status changed");

        let visibility = match status {
            ChefStatus::Closed => Some((false, notices::chef_went_offline())),
            ChefStatus::Open => Some((true, notices::chef_back_online())),
            ChefStatus::Busy => None,
        };
        if let Some((visible, notice)) = visibility {
            let claimed: Vec<_> = self
                .tickets
                .list()
                .into_iter()
                .filter(|t| t.is_open_claim_of(chef_id))
                .collect();
            for ticket in &claimed {
                side_effect(
                    "set_channel_visibility",
                    self.messenger.set_channel_visibility(
                        &ticket.channel_id,
                        &ticket.customer_id,
                        visible,
                    ),
                )
                .await;
                side_effect(
                    "send_message",
                    self.messenger.send_message(&ticket.channel_id, &notice),
                )
                .await;
            }
        }

        self.refresh_projection().await;
        self.emit(AuditEvent::ChefStatusChanged {
            chef_id: chef_id.to_string(),
            changed_by: actor_id.to_string(),
            status,
        })
        .await;

        Ok(chef)
    }

    /// All registered chefs, by name.
    pub fn list_chefs(&self) -> Result<Vec<Chef>, EngineError> {
        Ok(self.ledger.list_all()?)
    }

    pub async fn chef_debt(&self, actor_id: &str, chef_id: &str) -> Result<ChefDebt, EngineError> {
        self.authorize_action(actor_id, Action::ViewChefDebt { target: chef_id })
            .await?;

        self.ledger
            .get(chef_id)?
            .map(|chef| ChefDebt::from(&chef))
            .ok_or_else(|| EngineError::NotFound(format!("Chef {}", chef_id)))
    }

    /// Every chef with outstanding debt.
    pub async fn all_debts(&self, actor_id: &str) -> Result<DebtOverview, EngineError> {
        self.authorize_action(actor_id, Action::ViewAllDebts).await?;

        let chefs: Vec<ChefDebt> = self
            .ledger
            .list_with_debt()?
            .iter()
            .map(ChefDebt::from)
            .collect();
        let total_outstanding = chefs.iter().map(|c| c.debt).sum();
        Ok(DebtOverview {
            chefs,
            total_outstanding,
        })
    }

    /// Reset a chef's debt. Returns the amount cleared.
    pub async fn clear_debt(&self, actor_id: &str, chef_id: &str) -> Result<Decimal, EngineError> {
        self.authorize_action(actor_id, Action::ClearDebt).await?;

        let cleared = self.ledger.clear_debt(chef_id)?;
        if cleared.is_zero() {
            return Ok(cleared);
        }

        info!(chef_id, cleared_by = actor_id, amount = %cleared, "Chef debt cleared");
        self.emit(AuditEvent::DebtCleared {
            chef_id: chef_id.to_string(),
            cleared_by: actor_id.to_string(),
            amount: cleared,
        })
        .await;
        side_effect(
            "notify_user",
            self.messenger
                .notify_user(chef_id, &notices::debt_cleared(cleared)),
        )
        .await;

        Ok(cleared)
    }

    /// Remove a chef with no tickets in flight. Order history is kept.
    pub async fn remove_chef(&self, actor_id: &str, chef_id: &str) -> Result<RemovedChef, EngineError> {
        self.authorize_action(actor_id, Action::RemoveChef).await?;

        let (chef, history) = self.tickets.with_locked(|tickets| -> Result<_, EngineError> {
            let count = tickets
                .iter()
                .filter(|t| t.is_active() && t.chef_id.as_deref() == Some(chef_id))
                .count();
            if count > 0 {
                return Err(EngineError::HasActiveTickets {
                    chef_id: chef_id.to_string(),
                    count,
                });
            }

            let chef = self
                .ledger
                .get(chef_id)?
                .ok_or_else(|| EngineError::NotFound(format!("Chef {}", chef_id)))?;
            let history = self.ledger.order_summary(chef_id)?;
            self.ledger.remove(chef_id)?;
            Ok((chef, history))
        })?;

        info!(
            chef_id,
            removed_by = actor_id,
            outstanding_debt = %chef.debt,
            historical_orders = history.count,
            "Chef removed"
        );

        self.refresh_projection().await;
        self.emit(AuditEvent::ChefRemoved {
            chef_id: chef_id.to_string(),
            removed_by: actor_id.to_string(),
            historical_orders: history.count,
        })
        .await;

        Ok(RemovedChef { chef, history })
    }

    /// Completed orders, newest first.
    ///
    /// Without a `chef_id`, admins see every chef and everyone else sees
    /// their own orders.
    pub async fn order_history(
        &self,
        actor_id: &str,
        chef_id: Option<&str>,
        limit: Option<i64>,
    ) -> Result<OrderHistory, EngineError> {
        let caps = self.capabilities(actor_id).await?;
        let target = match chef_id {
            Some(chef_id) => Some(chef_id),
            None if caps.admin => None,
            None => Some(actor_id),
        };
        authorize(actor_id, caps, &Action::ViewOrderHistory { target })
            .map_err(|d| EngineError::from_denial(d, ""))?;

        let mut filter = OrderFilter::new();
        if let Some(target) = target {
            filter = filter.with_chef(target);
        }
        if let Some(limit) = limit {
            filter = filter.with_limit(limit);
        }

        let orders = self.ledger.order_history(&filter)?;
        Ok(OrderHistory::new(target.map(String::from), orders))
    }
}
