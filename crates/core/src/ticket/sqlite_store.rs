//! SQLite-backed ticket store implementation.

use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, types::Type, Connection, ErrorCode, OptionalExtension};

use super::{StoreError, Ticket, TicketStore};
use crate::ledger::OrderType;

const TICKET_COLUMNS: &str = "channel_id, customer_id, chef_id, order_type, order_link, total, special_instructions, created_at, claimed, claimed_at, completed";

/// SQLite-backed ticket store.
pub struct SqliteTicketStore {
    conn: Mutex<Connection>,
}

impl SqliteTicketStore {
    /// Create a new SQLite ticket store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite ticket store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS tickets (
                channel_id TEXT PRIMARY KEY,
                customer_id TEXT NOT NULL,
                chef_id TEXT,
                order_type TEXT NOT NULL,
                order_link TEXT NOT NULL,
                total TEXT NOT NULL,
                special_instructions TEXT,
                created_at TEXT NOT NULL,
                claimed INTEGER NOT NULL DEFAULT 0,
                claimed_at TEXT,
                completed INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_tickets_customer_id ON tickets(customer_id);
            CREATE INDEX IF NOT EXISTS idx_tickets_chef_id ON tickets(chef_id);
            "#,
        )
        .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("ticket store connection poisoned".to_string()))
    }

    fn row_to_ticket(row: &rusqlite::Row) -> rusqlite::Result<Ticket> {
        let order_type_str: String = row.get(3)?;
        let created_at_str: String = row.get(7)?;
        let claimed_at_str: Option<String> = row.get(9)?;

        let order_type = OrderType::from_str(&order_type_str)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, e.into()))?;

        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());
        let claimed_at = claimed_at_str.and_then(|s| {
            DateTime::parse_from_rfc3339(&s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        });

        Ok(Ticket {
            channel_id: row.get(0)?,
            customer_id: row.get(1)?,
            chef_id: row.get(2)?,
            order_type,
            order_link: row.get(4)?,
            total: row.get(5)?,
            special_instructions: row.get(6)?,
            created_at,
            claimed: row.get(8)?,
            claimed_at,
            completed: row.get(10)?,
        })
    }
}

impl TicketStore for SqliteTicketStore {
    fn insert(&self, ticket: &Ticket) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            &format!(
                "INSERT INTO tickets ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                TICKET_COLUMNS
            ),
            params![
                ticket.channel_id,
                ticket.customer_id,
                ticket.chef_id,
                ticket.order_type.as_str(),
                ticket.order_link,
                ticket.total,
                ticket.special_instructions,
                ticket.created_at.to_rfc3339(),
                ticket.claimed,
                ticket.claimed_at.map(|t| t.to_rfc3339()),
                ticket.completed,
            ],
        )
        .map_err(|e| match e.sqlite_error_code() {
            Some(ErrorCode::ConstraintViolation) => {
                StoreError::AlreadyExists(ticket.channel_id.clone())
            }
            _ => StoreError::Database(e.to_string()),
        })?;
        Ok(())
    }

    fn update(&self, ticket: &Ticket) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE tickets SET chef_id = ?, claimed = ?, claimed_at = ?, completed = ?, total = ?, special_instructions = ? WHERE channel_id = ?",
                params![
                    ticket.chef_id,
                    ticket.claimed,
                    ticket.claimed_at.map(|t| t.to_rfc3339()),
                    ticket.completed,
                    ticket.total,
                    ticket.special_instructions,
                    ticket.channel_id,
                ],
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        if changed == 0 {
            return Err(StoreError::NotFound(ticket.channel_id.clone()));
        }
        Ok(())
    }

    fn get(&self, channel_id: &str) -> Result<Option<Ticket>, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT {} FROM tickets WHERE channel_id = ?", TICKET_COLUMNS),
            params![channel_id],
            Self::row_to_ticket,
        )
        .optional()
        .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn delete(&self, channel_id: &str) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let deleted = conn
            .execute(
                "DELETE FROM tickets WHERE channel_id = ?",
                params![channel_id],
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(deleted > 0)
    }

    fn list(&self) -> Result<Vec<Ticket>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM tickets ORDER BY created_at ASC",
                TICKET_COLUMNS
            ))
            .map_err(|e| StoreError::Database(e.to_string()))?;
        let rows = stmt
            .query_map([], Self::row_to_ticket)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn delete_all(&self) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM tickets", [])
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}
