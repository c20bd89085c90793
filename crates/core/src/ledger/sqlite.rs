//! SQLite-backed chef ledger.

use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, types::Type, Connection, OptionalExtension};
use rust_decimal::Decimal;

use super::{
    Chef, ChefLedger, ChefStatus, LedgerError, NewOrder, OrderFilter, OrderRecord, OrderSummary,
    OrderType,
};

const CHEF_COLUMNS: &str = "id, name, status, debt, completed_orders, created_at";
const ORDER_COLUMNS: &str =
    "id, chef_id, customer_id, order_type, amount, completed_at, channel_id";

/// SQLite-backed chef ledger.
///
/// Amounts are stored as decimal text so no precision is lost.
pub struct SqliteChefLedger {
    conn: Mutex<Connection>,
}

impl SqliteChefLedger {
    /// Open (or create) the ledger tables in the database at `path`.
    pub fn new(path: &Path) -> Result<Self, LedgerError> {
        let conn = Connection::open(path).map_err(|e| LedgerError::Database(e.to_string()))?;
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory ledger (useful for testing).
    pub fn in_memory() -> Result<Self, LedgerError> {
        let conn =
            Connection::open_in_memory().map_err(|e| LedgerError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), LedgerError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS chefs (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'CLOSED',
                debt TEXT NOT NULL DEFAULT '0',
                completed_orders INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS orders (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                channel_id TEXT NOT NULL UNIQUE,
                chef_id TEXT NOT NULL,
                customer_id TEXT NOT NULL,
                order_type TEXT NOT NULL,
                amount TEXT NOT NULL,
                completed_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_orders_chef_id ON orders(chef_id);
            CREATE INDEX IF NOT EXISTS idx_orders_completed_at ON orders(completed_at);
            "#,
        )
        .map_err(|e| LedgerError::Database(e.to_string()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, LedgerError> {
        self.conn
            .lock()
            .map_err(|_| LedgerError::Database("ledger connection poisoned".to_string()))
    }

    fn fetch(conn: &Connection, id: &str) -> Result<Option<Chef>, LedgerError> {
        conn.query_row(
            &format!("SELECT {} FROM chefs WHERE id = ?", CHEF_COLUMNS),
            params![id],
            Self::row_to_chef,
        )
        .optional()
        .map_err(|e| LedgerError::Database(e.to_string()))
    }

    fn fetch_existing(conn: &Connection, id: &str) -> Result<Chef, LedgerError> {
        Self::fetch(conn, id)?.ok_or_else(|| LedgerError::NotFound(id.to_string()))
    }

    fn fetch_order_for_channel(
        conn: &Connection,
        channel_id: &str,
    ) -> Result<Option<OrderRecord>, LedgerError> {
        conn.query_row(
            &format!("SELECT {} FROM orders WHERE channel_id = ?", ORDER_COLUMNS),
            params![channel_id],
            Self::row_to_order,
        )
        .optional()
        .map_err(|e| LedgerError::Database(e.to_string()))
    }

    fn select_chefs(conn: &Connection) -> Result<Vec<Chef>, LedgerError> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM chefs ORDER BY name COLLATE NOCASE, id",
                CHEF_COLUMNS
            ))
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        let rows = stmt
            .query_map([], Self::row_to_chef)
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| LedgerError::Corrupt(e.to_string()))
    }

    fn row_to_chef(row: &rusqlite::Row) -> rusqlite::Result<Chef> {
        let status_str: String = row.get(2)?;
        let debt_str: String = row.get(3)?;
        let created_at_str: String = row.get(5)?;

        let status = ChefStatus::from_str(&status_str)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, e.into()))?;
        let debt = Decimal::from_str(&debt_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e))
        })?;
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(Chef {
            id: row.get(0)?,
            name: row.get(1)?,
            status,
            debt,
            completed_orders: row.get(4)?,
            created_at,
        })
    }

    fn row_to_order(row: &rusqlite::Row) -> rusqlite::Result<OrderRecord> {
        let order_type_str: String = row.get(3)?;
        let amount_str: String = row.get(4)?;
        let completed_at_str: String = row.get(5)?;

        let order_type = OrderType::from_str(&order_type_str)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, e.into()))?;
        let amount = Decimal::from_str(&amount_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e))
        })?;
        let completed_at = DateTime::parse_from_rfc3339(&completed_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(OrderRecord {
            id: row.get(0)?,
            channel_id: row.get(6)?,
            chef_id: row.get(1)?,
            customer_id: row.get(2)?,
            order_type,
            amount,
            completed_at,
        })
    }
}

impl ChefLedger for SqliteChefLedger {
    fn upsert_chef(&self, id: &str, name: &str) -> Result<Chef, LedgerError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO chefs (id, name, created_at) VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name",
            params![id, name, Utc::now().to_rfc3339()],
        )
        .map_err(|e| LedgerError::Database(e.to_string()))?;
        Self::fetch_existing(&conn, id)
    }

    fn set_status(&self, id: &str, status: ChefStatus) -> Result<Chef, LedgerError> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE chefs SET status = ? WHERE id = ?",
                params![status.as_str(), id],
            )
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        if changed == 0 {
            return Err(LedgerError::NotFound(id.to_string()));
        }
        Self::fetch_existing(&conn, id)
    }

    fn get(&self, id: &str) -> Result<Option<Chef>, LedgerError> {
        let conn = self.lock()?;
        Self::fetch(&conn, id)
    }

    fn list_all(&self) -> Result<Vec<Chef>, LedgerError> {
        let conn = self.lock()?;
        Self::select_chefs(&conn)
    }

    fn list_with_debt(&self) -> Result<Vec<Chef>, LedgerError> {
        let conn = self.lock()?;
        let mut chefs: Vec<Chef> = Self::select_chefs(&conn)?
            .into_iter()
            .filter(|c| c.debt > Decimal::ZERO)
            .collect();
        chefs.sort_by(|a, b| b.debt.cmp(&a.debt));
        Ok(chefs)
    }

    fn clear_debt(&self, id: &str) -> Result<Decimal, LedgerError> {
        let conn = self.lock()?;
        let chef = Self::fetch_existing(&conn, id)?;
        if chef.debt.is_zero() {
            return Ok(Decimal::ZERO);
        }
        conn.execute("UPDATE chefs SET debt = '0' WHERE id = ?", params![id])
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        Ok(chef.debt)
    }

    fn remove(&self, id: &str) -> Result<(), LedgerError> {
        let conn = self.lock()?;
        let removed = conn
            .execute("DELETE FROM chefs WHERE id = ?", params![id])
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        if removed == 0 {
            return Err(LedgerError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn reopen_active(&self) -> Result<usize, LedgerError> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE chefs SET status = 'OPEN' WHERE status = 'BUSY'",
            [],
        )
        .map_err(|e| LedgerError::Database(e.to_string()))
    }

    fn record_completed_order(
        &self,
        order: &NewOrder,
    ) -> Result<(Chef, OrderRecord), LedgerError> {
        if order.amount < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(format!(
                "{} is negative",
                order.amount
            )));
        }

        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let mut chef = Self::fetch_existing(&tx, &order.chef_id)?;
        if let Some(existing) = Self::fetch_order_for_channel(&tx, &order.channel_id)? {
            return Ok((chef, existing));
        }

        chef.debt = chef.debt.checked_add(order.amount).ok_or_else(|| {
            LedgerError::InvalidAmount(format!(
                "{} would overflow the debt of chef {}",
                order.amount, chef.id
            ))
        })?;
        chef.completed_orders += 1;

        tx.execute(
            "UPDATE chefs SET debt = ?, completed_orders = ? WHERE id = ?",
            params![chef.debt.to_string(), chef.completed_orders, chef.id],
        )
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        let completed_at = Utc::now();
        tx.execute(
            "INSERT INTO orders (channel_id, chef_id, customer_id, order_type, amount, completed_at) VALUES (?, ?, ?, ?, ?, ?)",
            params![
                order.channel_id,
                order.chef_id,
                order.customer_id,
                order.order_type.as_str(),
                order.amount.to_string(),
                completed_at.to_rfc3339(),
            ],
        )
        .map_err(|e| LedgerError::Database(e.to_string()))?;
        let id = tx.last_insert_rowid();

        tx.commit()
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let record = OrderRecord {
            id,
            channel_id: order.channel_id.clone(),
            chef_id: order.chef_id.clone(),
            customer_id: order.customer_id.clone(),
            order_type: order.order_type,
            amount: order.amount,
            completed_at,
        };
        Ok((chef, record))
    }

    fn order_history(&self, filter: &OrderFilter) -> Result<Vec<OrderRecord>, LedgerError> {
        let conn = self.lock()?;
        let (sql, chef_param) = match &filter.chef_id {
            Some(chef_id) => (
                format!(
                    "SELECT {} FROM orders WHERE chef_id = ?1 ORDER BY completed_at DESC, id DESC LIMIT ?2",
                    ORDER_COLUMNS
                ),
                Some(chef_id.clone()),
            ),
            None => (
                format!(
                    "SELECT {} FROM orders ORDER BY completed_at DESC, id DESC LIMIT ?1",
                    ORDER_COLUMNS
                ),
                None,
            ),
        };

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        let rows = match chef_param {
            Some(chef_id) => stmt.query_map(params![chef_id, filter.limit], Self::row_to_order),
            None => stmt.query_map(params![filter.limit], Self::row_to_order),
        }
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| LedgerError::Corrupt(e.to_string()))
    }

    fn order_summary(&self, chef_id: &str) -> Result<OrderSummary, LedgerError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT amount FROM orders WHERE chef_id = ?")
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        let amounts = stmt
            .query_map(params![chef_id], |row| row.get::<_, String>(0))
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let mut summary = OrderSummary::default();
        for amount in amounts {
            let amount = amount.map_err(|e| LedgerError::Database(e.to_string()))?;
            summary.total += Decimal::from_str(&amount)
                .map_err(|e| LedgerError::Corrupt(format!("order amount {}: {}", amount, e)))?;
            summary.count += 1;
        }
        Ok(summary)
    }
}
