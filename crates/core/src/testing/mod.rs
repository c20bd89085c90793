//! Testing utilities and mock implementations.
//!
//! Mocks for the chat platform and role lookup, plus fixtures that wire a
//! complete engine against in-memory SQLite.
//!
//! # Example
//!
//! ```rust,ignore
//! use quickeats_core::testing::fixtures::TestDesk;
//!
//! let desk = TestDesk::new().await;
//! desk.open_chef("chef-1").await;
//! let created = desk.engine.create_ticket(fixtures::order("cust-1")).await?;
//! ```

mod mock_access;
mod mock_messenger;

pub use mock_access::MockAccessControl;
pub use mock_messenger::{MessengerCall, MockMessenger};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::sync::Arc;

    use super::{MockAccessControl, MockMessenger};
    use crate::config::{OrdersConfig, TicketsConfig};
    use crate::engine::{CreateTicketRequest, TicketEngine};
    use crate::ledger::{ChefStatus, OrderType, SqliteChefLedger};
    use crate::ticket::SqliteTicketStore;

    /// A DoorDash order for `customer_id` with a `$24.50` total.
    pub fn order(customer_id: &str) -> CreateTicketRequest {
        CreateTicketRequest {
            customer_id: customer_id.to_string(),
            order_type: OrderType::DoorDash,
            order_link: format!("https://order.example.com/{}", customer_id),
            total: "$24.50".to_string(),
            special_instructions: None,
        }
    }

    /// Ticket settings with no grace periods, so teardown runs inline.
    pub fn immediate_tickets_config() -> TicketsConfig {
        TicketsConfig {
            completion_grace_secs: 0,
            close_grace_secs: 0,
            ..TicketsConfig::default()
        }
    }

    /// An engine over in-memory stores with mock collaborators.
    pub struct TestDesk {
        pub engine: TicketEngine,
        pub messenger: Arc<MockMessenger>,
        pub access: Arc<MockAccessControl>,
        pub ledger: Arc<SqliteChefLedger>,
        pub store: Arc<SqliteTicketStore>,
    }

    impl TestDesk {
        pub async fn new() -> Self {
            Self::with_config(OrdersConfig::default(), immediate_tickets_config()).await
        }

        pub async fn with_config(orders: OrdersConfig, tickets: TicketsConfig) -> Self {
            let store = Arc::new(SqliteTicketStore::in_memory().unwrap());
            let ledger = Arc::new(SqliteChefLedger::in_memory().unwrap());
            Self::with_stores(store, ledger, orders, tickets).await
        }

        pub async fn with_stores(
            store: Arc<SqliteTicketStore>,
            ledger: Arc<SqliteChefLedger>,
            orders: OrdersConfig,
            tickets: TicketsConfig,
        ) -> Self {
            let messenger = Arc::new(MockMessenger::new());
            let access = Arc::new(MockAccessControl::new());
            access.grant_admin("admin").await;

            let engine = TicketEngine::new(
                store.clone(),
                ledger.clone(),
                messenger.clone(),
                access.clone(),
                orders,
                tickets,
            )
            .unwrap();

            Self {
                engine,
                messenger,
                access,
                ledger,
                store,
            }
        }

        /// Register `chef_id` with the chef role and set them OPEN.
        pub async fn open_chef(&self, chef_id: &str) {
            self.access.grant_chef(chef_id).await;
            self.engine
                .set_chef_status(chef_id, chef_id, Some(chef_id), ChefStatus::Open)
                .await
                .unwrap();
        }
    }
}
