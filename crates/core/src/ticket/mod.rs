//! In-flight order tickets: durable store plus the in-process cache.

mod repository;
mod sqlite_store;
mod store;
mod types;

pub use repository::TicketRepository;
pub use sqlite_store::SqliteTicketStore;
pub use store::{StoreError, TicketStore};
pub use types::{Ticket, TicketState};
