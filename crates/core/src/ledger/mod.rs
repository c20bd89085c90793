//! Chef ledger and order history.

mod sqlite;
mod store;
mod types;

pub use sqlite::SqliteChefLedger;
pub use store::{ChefLedger, LedgerError};
pub use types::{
    Chef, ChefStatus, NewOrder, OrderFilter, OrderRecord, OrderSummary, OrderType,
};
