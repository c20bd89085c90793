//! Chef ledger storage trait.

use rust_decimal::Decimal;
use thiserror::Error;

use super::{Chef, ChefStatus, NewOrder, OrderFilter, OrderRecord, OrderSummary};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Chef not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Corrupt ledger row: {0}")]
    Corrupt(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

/// Durable per-chef record of status, debt and completed orders, plus the
/// append-only order history.
///
/// Every method is individually atomic.
pub trait ChefLedger: Send + Sync {
    /// Register a chef or refresh their name. Status and debt are kept.
    fn upsert_chef(&self, id: &str, name: &str) -> Result<Chef, LedgerError>;

    fn set_status(&self, id: &str, status: ChefStatus) -> Result<Chef, LedgerError>;

    fn get(&self, id: &str) -> Result<Option<Chef>, LedgerError>;

    /// All chefs sorted by name.
    fn list_all(&self) -> Result<Vec<Chef>, LedgerError>;

    /// Chefs with positive debt, largest debt first.
    fn list_with_debt(&self) -> Result<Vec<Chef>, LedgerError>;

    /// Reset debt to zero, keeping the order count. Returns the cleared amount.
    fn clear_debt(&self, id: &str) -> Result<Decimal, LedgerError>;

    /// Delete a chef. Order history is preserved.
    fn remove(&self, id: &str) -> Result<(), LedgerError>;

    /// Set every chef that is not CLOSED back to OPEN. Returns the number changed.
    fn reopen_active(&self) -> Result<usize, LedgerError>;

    /// Increment debt and order count and append the history record as one unit.
    ///
    /// A channel that already has a history record is not charged again; the
    /// existing record is returned with the chef as it stands.
    fn record_completed_order(&self, order: &NewOrder)
        -> Result<(Chef, OrderRecord), LedgerError>;

    /// Completed orders, newest first.
    fn order_history(&self, filter: &OrderFilter) -> Result<Vec<OrderRecord>, LedgerError>;

    fn order_summary(&self, chef_id: &str) -> Result<OrderSummary, LedgerError>;
}
