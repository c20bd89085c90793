//! Engine requests and results.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::{Chef, ChefStatus, OrderRecord, OrderSummary, OrderType};
use crate::ticket::Ticket;

/// A customer's order form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTicketRequest {
    pub customer_id: String,
    pub order_type: OrderType,
    pub order_link: String,
    pub total: String,
    #[serde(default)]
    pub special_instructions: Option<String>,
}

/// How much debt a completion charges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum CompletionAmount {
    /// The configured fee for the ticket's order type.
    #[default]
    OrderTypeFee,
    /// Parsed from the ticket total, falling back to the configured fallback amount.
    FromTotal,
    /// An explicit amount.
    Fixed(Decimal),
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedTicket {
    pub ticket: Ticket,
    /// Active ticket count reached the high demand threshold.
    pub high_demand: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletionReceipt {
    pub ticket: Ticket,
    pub order: OrderRecord,
    /// Chef ledger entry after the debt was added.
    pub chef: Chef,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActiveTickets {
    pub tickets: Vec<Ticket>,
    pub high_demand: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PurgeReport {
    pub deleted: usize,
    /// Channels whose deletion failed.
    pub failed: usize,
    pub chefs_reopened: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChefDebt {
    pub chef_id: String,
    pub name: String,
    pub status: ChefStatus,
    pub debt: Decimal,
    pub completed_orders: u32,
    pub average_per_order: Decimal,
}

impl From<&Chef> for ChefDebt {
    fn from(chef: &Chef) -> Self {
        Self {
            chef_id: chef.id.clone(),
            name: chef.name.clone(),
            status: chef.status,
            debt: chef.debt,
            completed_orders: chef.completed_orders,
            average_per_order: chef.average_per_order(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DebtOverview {
    /// Chefs with outstanding debt, largest first.
    pub chefs: Vec<ChefDebt>,
    pub total_outstanding: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemovedChef {
    pub chef: Chef,
    /// Historical orders, kept after removal.
    pub history: OrderSummary,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OrderTotals {
    pub amount: Decimal,
    pub doordash: u32,
    pub ubereats: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderHistory {
    pub chef_id: Option<String>,
    pub orders: Vec<OrderRecord>,
    pub totals: OrderTotals,
}

impl OrderHistory {
    pub(crate) fn new(chef_id: Option<String>, orders: Vec<OrderRecord>) -> Self {
        let totals = orders.iter().fold(OrderTotals::default(), |mut acc, o| {
            acc.amount += o.amount;
            match o.order_type {
                OrderType::DoorDash => acc.doordash += 1,
                OrderType::UberEats => acc.ubereats += 1,
            }
            acc
        });
        Self {
            chef_id,
            orders,
            totals,
        }
    }
}
