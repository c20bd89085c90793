//! Ticket storage trait.

use thiserror::Error;

use super::Ticket;

/// Error type for ticket persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Ticket not found: {0}")]
    NotFound(String),

    #[error("Ticket already exists for channel {0}")]
    AlreadyExists(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Durable record of in-flight tickets keyed by channel.
pub trait TicketStore: Send + Sync {
    fn insert(&self, ticket: &Ticket) -> Result<(), StoreError>;

    /// Overwrite an existing ticket.
    fn update(&self, ticket: &Ticket) -> Result<(), StoreError>;

    fn get(&self, channel_id: &str) -> Result<Option<Ticket>, StoreError>;

    /// Delete a ticket. Returns false if it did not exist.
    fn delete(&self, channel_id: &str) -> Result<bool, StoreError>;

    /// All tickets, oldest first.
    fn list(&self) -> Result<Vec<Ticket>, StoreError>;

    /// Delete every ticket. Returns the number deleted.
    fn delete_all(&self) -> Result<usize, StoreError>;
}
