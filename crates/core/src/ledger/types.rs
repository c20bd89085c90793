//! Chef and order history types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Chef availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChefStatus {
    /// Accepting orders.
    Open,
    /// Holding more than one claimed ticket.
    Busy,
    /// Offline. The default for a newly registered chef.
    Closed,
}

impl ChefStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChefStatus::Open => "OPEN",
            ChefStatus::Busy => "BUSY",
            ChefStatus::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for ChefStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChefStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "OPEN" => Ok(ChefStatus::Open),
            "BUSY" => Ok(ChefStatus::Busy),
            "CLOSED" => Ok(ChefStatus::Closed),
            other => Err(format!("unknown chef status: {}", other)),
        }
    }
}

/// Delivery platform an order is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    #[serde(rename = "doordash", alias = "DoorDash")]
    DoorDash,
    #[serde(rename = "ubereats", alias = "UberEats")]
    UberEats,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::DoorDash => "doordash",
            OrderType::UberEats => "ubereats",
        }
    }

    /// Human-readable platform name.
    pub fn label(&self) -> &'static str {
        match self {
            OrderType::DoorDash => "DoorDash",
            OrderType::UberEats => "UberEats",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "doordash" => Ok(OrderType::DoorDash),
            "ubereats" => Ok(OrderType::UberEats),
            other => Err(format!("unknown order type: {}", other)),
        }
    }
}

/// Ledger entry for a chef.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chef {
    /// External user id.
    pub id: String,
    pub name: String,
    pub status: ChefStatus,
    /// Cumulative amount owed. Only an explicit clear lowers it.
    pub debt: Decimal,
    pub completed_orders: u32,
    pub created_at: DateTime<Utc>,
}

impl Chef {
    /// Debt divided by completed orders, zero when nothing was completed.
    pub fn average_per_order(&self) -> Decimal {
        if self.completed_orders == 0 {
            Decimal::ZERO
        } else {
            (self.debt / Decimal::from(self.completed_orders)).round_dp(2)
        }
    }
}

/// Completion to be recorded against a chef.
///
/// `channel_id` identifies the ticket; a ticket is charged at most once.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub channel_id: String,
    pub chef_id: String,
    pub customer_id: String,
    pub order_type: OrderType,
    pub amount: Decimal,
}

/// Immutable history record of a completed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: i64,
    pub channel_id: String,
    pub chef_id: String,
    pub customer_id: String,
    pub order_type: OrderType,
    pub amount: Decimal,
    pub completed_at: DateTime<Utc>,
}

/// Filter for order history queries.
#[derive(Debug, Clone)]
pub struct OrderFilter {
    pub chef_id: Option<String>,
    pub limit: i64,
}

impl Default for OrderFilter {
    fn default() -> Self {
        Self {
            chef_id: None,
            limit: 50,
        }
    }
}

impl OrderFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chef(mut self, chef_id: impl Into<String>) -> Self {
        self.chef_id = Some(chef_id.into());
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }
}

/// Aggregate over a chef's historical orders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub count: u32,
    pub total: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chef_status_round_trip_str() {
        for status in [ChefStatus::Open, ChefStatus::Busy, ChefStatus::Closed] {
            assert_eq!(status.as_str().parse::<ChefStatus>().unwrap(), status);
        }
        assert_eq!("open".parse::<ChefStatus>().unwrap(), ChefStatus::Open);
        assert!("away".parse::<ChefStatus>().is_err());
    }

    #[test]
    fn test_chef_status_serializes_uppercase() {
        let json = serde_json::to_string(&ChefStatus::Busy).unwrap();
        assert_eq!(json, "\"BUSY\"");
    }

    #[test]
    fn test_order_type_serde() {
        assert_eq!(
            serde_json::to_string(&OrderType::UberEats).unwrap(),
            "\"ubereats\""
        );
        let parsed: OrderType = serde_json::from_str("\"DoorDash\"").unwrap();
        assert_eq!(parsed, OrderType::DoorDash);
        assert_eq!("UberEats".parse::<OrderType>().unwrap(), OrderType::UberEats);
    }

    #[test]
    fn test_average_per_order() {
        let mut chef = Chef {
            id: "c1".to_string(),
            name: "Alice".to_string(),
            status: ChefStatus::Open,
            debt: Decimal::new(1000, 2),
            completed_orders: 3,
            created_at: Utc::now(),
        };
        assert_eq!(chef.average_per_order(), Decimal::new(333, 2));

        chef.completed_orders = 0;
        assert_eq!(chef.average_per_order(), Decimal::ZERO);
    }

    #[test]
    fn test_order_filter_defaults() {
        let filter = OrderFilter::new().with_chef("c1");
        assert_eq!(filter.limit, 50);
        assert_eq!(filter.chef_id.as_deref(), Some("c1"));
    }
}
