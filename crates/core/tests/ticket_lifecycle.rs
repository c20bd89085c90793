//! Ticket lifecycle integration tests.
//!
//! Drive the engine through create -> claim -> complete and the side paths
//! (cancel, close, external channel removal, purge) against SQLite stores and
//! a mock chat platform.

use std::sync::Arc;

use rust_decimal::Decimal;
use tempfile::TempDir;

use quickeats_core::{
    config::{OrdersConfig, TicketsConfig},
    testing::fixtures::{self, TestDesk},
    ChefLedger, ChefStatus, CompletionAmount, EngineError, SqliteChefLedger, SqliteTicketStore,
    Ticket, TicketStore,
};

fn dollars(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Stores backed by a database file, for tests that need a second connection
/// or a restart.
struct FileStores {
    db_path: std::path::PathBuf,
    _temp_dir: TempDir,
}

impl FileStores {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        Self {
            db_path: temp_dir.path().join("quickeats.db"),
            _temp_dir: temp_dir,
        }
    }

    async fn desk(&self, tickets: TicketsConfig) -> TestDesk {
        let store = Arc::new(SqliteTicketStore::new(&self.db_path).unwrap());
        let ledger = Arc::new(SqliteChefLedger::new(&self.db_path).unwrap());
        TestDesk::with_stores(store, ledger, OrdersConfig::default(), tickets).await
    }
}

async fn claimed_ticket(desk: &TestDesk, customer: &str, chef: &str) -> Ticket {
    let created = desk.engine.create_ticket(fixtures::order(customer)).await.unwrap();
    desk.engine
        .claim_ticket(&created.ticket.channel_id, chef)
        .await
        .unwrap()
}

fn lingering_completions() -> TicketsConfig {
    TicketsConfig {
        completion_grace_secs: 3600,
        ..fixtures::immediate_tickets_config()
    }
}

#[tokio::test]
async fn test_full_lifecycle_charges_order_type_fee() {
    let desk = TestDesk::new().await;
    desk.open_chef("chef-1").await;

    let created = desk.engine.create_ticket(fixtures::order("cust-1")).await.unwrap();
    let channel = created.ticket.channel_id.clone();
    assert!(!created.ticket.claimed);
    assert!(desk.store.get(&channel).unwrap().is_some());

    let calls = desk.messenger.calls().await;
    assert!(calls.iter().any(|c| matches!(
        c,
        quickeats_core::testing::MessengerCall::CreateChannel { eligible_chefs, .. }
            if eligible_chefs == &vec!["chef-1".to_string()]
    )));

    let claimed = desk.engine.claim_ticket(&channel, "chef-1").await.unwrap();
    assert_eq!(claimed.chef_id.as_deref(), Some("chef-1"));
    assert!(claimed.claimed_at.is_some());

    let receipt = desk
        .engine
        .complete_ticket(&channel, "chef-1", CompletionAmount::OrderTypeFee)
        .await
        .unwrap();
    assert!(receipt.ticket.completed);
    assert_eq!(receipt.order.amount, dollars(500));
    assert_eq!(receipt.chef.debt, dollars(500));
    assert_eq!(receipt.chef.completed_orders, 1);

    // Zero grace: record and channel are gone once complete returns.
    assert!(desk.engine.get_ticket(&channel).is_err());
    assert!(desk.store.get(&channel).unwrap().is_none());
    assert_eq!(desk.messenger.deleted_channels().await, vec![channel.clone()]);

    let chef = desk.ledger.get("chef-1").unwrap().unwrap();
    assert_eq!(chef.status, ChefStatus::Open);
    assert_eq!(
        desk.ledger
            .order_history(&quickeats_core::ledger::OrderFilter::new())
            .unwrap()
            .len(),
        1
    );

    let notes = desk.messenger.notifications_for("chef-1").await;
    assert_eq!(notes.len(), 1);
    assert!(notes[0].contains("$5.00"));
}

#[tokio::test]
async fn test_duplicate_ticket_rejected() {
    let desk = TestDesk::new().await;

    let first = desk.engine.create_ticket(fixtures::order("cust-1")).await.unwrap();
    let result = desk.engine.create_ticket(fixtures::order("cust-1")).await;

    match result {
        Err(EngineError::DuplicateTicket { channel_id }) => {
            assert_eq!(channel_id, first.ticket.channel_id)
        }
        other => panic!("expected DuplicateTicket, got {:?}", other),
    }
    assert_eq!(desk.store.list().unwrap().len(), 1);

    // A different customer is unaffected.
    assert!(desk.engine.create_ticket(fixtures::order("cust-2")).await.is_ok());
}

#[tokio::test]
async fn test_channel_failure_persists_nothing() {
    let desk = TestDesk::new().await;
    desk.messenger.fail_operation("create_ticket_channel").await;

    let result = desk.engine.create_ticket(fixtures::order("cust-1")).await;
    assert!(matches!(result, Err(EngineError::ChannelUnavailable(_))));
    assert!(desk.store.list().unwrap().is_empty());

    desk.messenger.recover_operation("create_ticket_channel").await;
    assert!(desk.engine.create_ticket(fixtures::order("cust-1")).await.is_ok());
}

#[tokio::test]
async fn test_high_demand_warning() {
    let desk = TestDesk::new().await;

    let first = desk.engine.create_ticket(fixtures::order("cust-1")).await.unwrap();
    assert!(!first.high_demand);

    let second = desk.engine.create_ticket(fixtures::order("cust-2")).await.unwrap();
    assert!(second.high_demand);

    let welcome = desk.messenger.messages_in(&second.ticket.channel_id).await;
    assert!(welcome[0].contains("high demand"));
}

#[tokio::test]
async fn test_concurrent_claims_single_winner() {
    let desk = TestDesk::new().await;
    desk.open_chef("chef-1").await;
    desk.open_chef("chef-2").await;

    let created = desk.engine.create_ticket(fixtures::order("cust-1")).await.unwrap();
    let channel = created.ticket.channel_id;

    let (a, b) = tokio::join!(
        desk.engine.claim_ticket(&channel, "chef-1"),
        desk.engine.claim_ticket(&channel, "chef-2")
    );

    let winners = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    let loser = if a.is_ok() { b } else { a };
    assert!(matches!(loser, Err(EngineError::AlreadyClaimed(_))));
}

#[tokio::test]
async fn test_claim_permissions_and_eligibility() {
    let desk = TestDesk::new().await;
    let created = desk.engine.create_ticket(fixtures::order("cust-1")).await.unwrap();
    let channel = created.ticket.channel_id;

    // No chef role.
    let result = desk.engine.claim_ticket(&channel, "cust-1").await;
    assert!(matches!(result, Err(EngineError::NotAuthorized)));

    // Chef role but never registered in the ledger.
    desk.access.grant_chef("chef-1").await;
    let result = desk.engine.claim_ticket(&channel, "chef-1").await;
    assert!(matches!(result, Err(EngineError::ChefUnavailable(_))));

    // Registered but CLOSED.
    desk.engine
        .set_chef_status("chef-1", "chef-1", Some("Chef One"), ChefStatus::Closed)
        .await
        .unwrap();
    let result = desk.engine.claim_ticket(&channel, "chef-1").await;
    assert!(matches!(result, Err(EngineError::ChefUnavailable(_))));

    assert!(!desk.engine.get_ticket(&channel).unwrap().claimed);
}

#[tokio::test]
async fn test_role_lookup_failure_denies() {
    let desk = TestDesk::new().await;
    desk.open_chef("chef-1").await;
    let created = desk.engine.create_ticket(fixtures::order("cust-1")).await.unwrap();

    desk.access.set_failing(true).await;
    let result = desk
        .engine
        .claim_ticket(&created.ticket.channel_id, "chef-1")
        .await;
    assert!(matches!(result, Err(EngineError::NotAuthorized)));
}

#[tokio::test]
async fn test_busy_until_last_claim_resolves() {
    let desk = TestDesk::new().await;
    desk.open_chef("chef-1").await;

    let first = claimed_ticket(&desk, "cust-1", "chef-1").await;
    assert_eq!(
        desk.ledger.get("chef-1").unwrap().unwrap().status,
        ChefStatus::Open
    );

    let second = claimed_ticket(&desk, "cust-2", "chef-1").await;
    assert_eq!(
        desk.ledger.get("chef-1").unwrap().unwrap().status,
        ChefStatus::Busy
    );

    desk.engine
        .complete_ticket(&first.channel_id, "chef-1", CompletionAmount::OrderTypeFee)
        .await
        .unwrap();
    assert_eq!(
        desk.ledger.get("chef-1").unwrap().unwrap().status,
        ChefStatus::Busy
    );

    desk.engine
        .close_ticket(&second.channel_id, "chef-1", Some("customer left".to_string()))
        .await
        .unwrap();
    assert_eq!(
        desk.ledger.get("chef-1").unwrap().unwrap().status,
        ChefStatus::Open
    );
}

#[tokio::test]
async fn test_closed_chef_reopens_after_last_claim() {
    let desk = TestDesk::new().await;
    desk.open_chef("chef-1").await;
    let ticket = claimed_ticket(&desk, "cust-1", "chef-1").await;

    desk.engine
        .set_chef_status("chef-1", "chef-1", None, ChefStatus::Closed)
        .await
        .unwrap();
    desk.engine
        .complete_ticket(&ticket.channel_id, "chef-1", CompletionAmount::OrderTypeFee)
        .await
        .unwrap();

    assert_eq!(
        desk.ledger.get("chef-1").unwrap().unwrap().status,
        ChefStatus::Open
    );
}

#[tokio::test]
async fn test_open_only_policy_rejects_busy_chef() {
    let tickets = TicketsConfig {
        claim_policy: quickeats_core::config::ClaimPolicy::OpenOnly,
        ..fixtures::immediate_tickets_config()
    };
    let desk = TestDesk::with_config(OrdersConfig::default(), tickets).await;
    desk.open_chef("chef-1").await;

    claimed_ticket(&desk, "cust-1", "chef-1").await;
    claimed_ticket(&desk, "cust-2", "chef-1").await;

    let third = desk.engine.create_ticket(fixtures::order("cust-3")).await.unwrap();
    let result = desk
        .engine
        .claim_ticket(&third.ticket.channel_id, "chef-1")
        .await;
    assert!(matches!(result, Err(EngineError::ChefUnavailable(_))));
}

#[tokio::test]
async fn test_completion_authority() {
    let desk = TestDesk::new().await;
    desk.open_chef("chef-1").await;
    desk.open_chef("chef-2").await;

    let ticket = claimed_ticket(&desk, "cust-1", "chef-1").await;

    let result = desk
        .engine
        .complete_ticket(&ticket.channel_id, "chef-2", CompletionAmount::OrderTypeFee)
        .await;
    assert!(matches!(result, Err(EngineError::NotAssignedChef(_))));

    let result = desk
        .engine
        .complete_ticket(&ticket.channel_id, "cust-1", CompletionAmount::OrderTypeFee)
        .await;
    assert!(matches!(result, Err(EngineError::NotAssignedChef(_))));

    // Admin may complete on the chef's behalf; the debt goes to the chef.
    let receipt = desk
        .engine
        .complete_ticket(
            &ticket.channel_id,
            "admin",
            CompletionAmount::Fixed(dollars(750)),
        )
        .await
        .unwrap();
    assert_eq!(receipt.chef.id, "chef-1");
    assert_eq!(receipt.chef.debt, dollars(750));
    assert_eq!(desk.ledger.get("chef-2").unwrap().unwrap().debt, Decimal::ZERO);
}

#[tokio::test]
async fn test_unclaimed_ticket_cannot_complete() {
    let desk = TestDesk::new().await;
    let created = desk.engine.create_ticket(fixtures::order("cust-1")).await.unwrap();

    let result = desk
        .engine
        .complete_ticket(
            &created.ticket.channel_id,
            "admin",
            CompletionAmount::OrderTypeFee,
        )
        .await;
    assert!(matches!(result, Err(EngineError::NotClaimed(_))));
    assert!(!desk.engine.get_ticket(&created.ticket.channel_id).unwrap().completed);
}

#[tokio::test]
async fn test_double_complete_charges_once() {
    let desk = TestDesk::with_config(OrdersConfig::default(), lingering_completions()).await;
    desk.open_chef("chef-1").await;
    let ticket = claimed_ticket(&desk, "cust-1", "chef-1").await;

    let (a, b) = tokio::join!(
        desk.engine
            .complete_ticket(&ticket.channel_id, "chef-1", CompletionAmount::OrderTypeFee),
        desk.engine
            .complete_ticket(&ticket.channel_id, "chef-1", CompletionAmount::OrderTypeFee)
    );
    assert_eq!([&a, &b].iter().filter(|r| r.is_ok()).count(), 1);
    let loser = if a.is_ok() { b } else { a };
    assert!(matches!(loser, Err(EngineError::AlreadyCompleted(_))));

    let chef = desk.ledger.get("chef-1").unwrap().unwrap();
    assert_eq!(chef.debt, dollars(500));
    assert_eq!(chef.completed_orders, 1);

    // Still lingering during the grace period, and closing it is refused.
    assert!(desk.engine.get_ticket(&ticket.channel_id).unwrap().completed);
    let result = desk
        .engine
        .close_ticket(&ticket.channel_id, "admin", None)
        .await;
    assert!(matches!(result, Err(EngineError::AlreadyCompleted(_))));
}

#[tokio::test]
async fn test_completion_failure_leaves_ticket_claimed() {
    let files = FileStores::new();
    let desk = files.desk(fixtures::immediate_tickets_config()).await;
    desk.open_chef("chef-1").await;
    let ticket = claimed_ticket(&desk, "cust-1", "chef-1").await;

    let saboteur = rusqlite::Connection::open(&files.db_path).unwrap();
    saboteur
        .execute_batch(
            "CREATE TRIGGER reject_orders BEFORE INSERT ON orders BEGIN SELECT RAISE(ABORT, 'forced'); END;",
        )
        .unwrap();

    let result = desk
        .engine
        .complete_ticket(&ticket.channel_id, "chef-1", CompletionAmount::OrderTypeFee)
        .await;
    assert!(matches!(result, Err(EngineError::PersistenceFailure(_))));

    let current = desk.engine.get_ticket(&ticket.channel_id).unwrap();
    assert!(current.claimed);
    assert!(!current.completed);
    assert!(!desk.store.get(&ticket.channel_id).unwrap().unwrap().completed);

    let chef = desk.ledger.get("chef-1").unwrap().unwrap();
    assert_eq!(chef.debt, Decimal::ZERO);
    assert_eq!(chef.completed_orders, 0);

    // Once storage recovers the same ticket completes normally.
    saboteur
        .execute_batch("DROP TRIGGER reject_orders;")
        .unwrap();
    let receipt = desk
        .engine
        .complete_ticket(&ticket.channel_id, "chef-1", CompletionAmount::OrderTypeFee)
        .await
        .unwrap();
    assert_eq!(receipt.chef.debt, dollars(500));
}

#[tokio::test]
async fn test_retry_after_ticket_write_failure_charges_once() {
    let files = FileStores::new();
    let desk = files.desk(fixtures::immediate_tickets_config()).await;
    desk.open_chef("chef-1").await;
    let ticket = claimed_ticket(&desk, "cust-1", "chef-1").await;

    // The ledger commits, then marking the ticket completed fails.
    let saboteur = rusqlite::Connection::open(&files.db_path).unwrap();
    saboteur
        .execute_batch(
            "CREATE TRIGGER reject_completion BEFORE UPDATE ON tickets WHEN NEW.completed = 1 \
             BEGIN SELECT RAISE(ABORT, 'forced'); END;",
        )
        .unwrap();

    let result = desk
        .engine
        .complete_ticket(&ticket.channel_id, "chef-1", CompletionAmount::OrderTypeFee)
        .await;
    assert!(matches!(result, Err(EngineError::PersistenceFailure(_))));
    assert!(!desk.engine.get_ticket(&ticket.channel_id).unwrap().completed);

    saboteur
        .execute_batch("DROP TRIGGER reject_completion;")
        .unwrap();
    let receipt = desk
        .engine
        .complete_ticket(&ticket.channel_id, "chef-1", CompletionAmount::OrderTypeFee)
        .await
        .unwrap();
    assert!(receipt.ticket.completed);
    assert_eq!(receipt.order.channel_id, ticket.channel_id);

    let chef = desk.ledger.get("chef-1").unwrap().unwrap();
    assert_eq!(chef.debt, dollars(500));
    assert_eq!(chef.completed_orders, 1);
    let orders = desk
        .ledger
        .order_history(&quickeats_core::ledger::OrderFilter::new())
        .unwrap();
    assert_eq!(orders.len(), 1);
}

#[tokio::test]
async fn test_invalid_amounts_rejected() {
    let desk = TestDesk::new().await;
    desk.open_chef("chef-1").await;
    let ticket = claimed_ticket(&desk, "cust-1", "chef-1").await;

    for amount in [Decimal::new(-1000, 2), Decimal::MAX, dollars(100_001)] {
        let result = desk
            .engine
            .complete_ticket(&ticket.channel_id, "chef-1", CompletionAmount::Fixed(amount))
            .await;
        assert!(
            matches!(result, Err(EngineError::InvalidAmount(_))),
            "{} accepted",
            amount
        );
    }

    let current = desk.engine.get_ticket(&ticket.channel_id).unwrap();
    assert!(current.claimed);
    assert!(!current.completed);
    let chef = desk.ledger.get("chef-1").unwrap().unwrap();
    assert_eq!(chef.debt, Decimal::ZERO);
    assert_eq!(chef.completed_orders, 0);

    // The boundary itself is fine, and the ledger is still usable.
    let receipt = desk
        .engine
        .complete_ticket(
            &ticket.channel_id,
            "chef-1",
            CompletionAmount::Fixed(dollars(100_000)),
        )
        .await
        .unwrap();
    assert_eq!(receipt.chef.debt, dollars(100_000));
}

#[tokio::test]
async fn test_parsed_total_above_limit_rejected() {
    let orders = OrdersConfig {
        max_amount: dollars(2000),
        ..OrdersConfig::default()
    };
    let desk = TestDesk::with_config(orders, fixtures::immediate_tickets_config()).await;
    desk.open_chef("chef-1").await;
    let ticket = claimed_ticket(&desk, "cust-1", "chef-1").await;

    // The fixture total is $24.50.
    let result = desk
        .engine
        .complete_ticket(&ticket.channel_id, "chef-1", CompletionAmount::FromTotal)
        .await;
    assert!(matches!(result, Err(EngineError::InvalidAmount(_))));
    assert!(desk.engine.get_ticket(&ticket.channel_id).unwrap().claimed);
}

#[tokio::test]
async fn test_failed_notifications_keep_completion() {
    let desk = TestDesk::new().await;
    desk.open_chef("chef-1").await;
    let ticket = claimed_ticket(&desk, "cust-1", "chef-1").await;

    desk.messenger.fail_operation("send_message").await;
    desk.messenger.fail_operation("notify_user").await;
    desk.messenger.fail_operation("delete_channel").await;

    let receipt = desk
        .engine
        .complete_ticket(&ticket.channel_id, "chef-1", CompletionAmount::OrderTypeFee)
        .await
        .unwrap();
    assert!(receipt.ticket.completed);
    assert_eq!(desk.ledger.get("chef-1").unwrap().unwrap().debt, dollars(500));
    assert!(desk.store.get(&ticket.channel_id).unwrap().is_none());
}

#[tokio::test]
async fn test_cancel_rules() {
    let desk = TestDesk::new().await;
    desk.open_chef("chef-1").await;

    let open = desk.engine.create_ticket(fixtures::order("cust-1")).await.unwrap();
    let channel = open.ticket.channel_id;

    let result = desk.engine.cancel_ticket(&channel, "cust-2").await;
    assert!(matches!(result, Err(EngineError::NotAuthorized)));

    let cancelled = desk.engine.cancel_ticket(&channel, "cust-1").await.unwrap();
    assert_eq!(cancelled.channel_id, channel);
    assert!(desk.store.get(&channel).unwrap().is_none());
    assert!(desk.messenger.deleted_channels().await.contains(&channel));

    let claimed = claimed_ticket(&desk, "cust-2", "chef-1").await;
    let result = desk.engine.cancel_ticket(&claimed.channel_id, "cust-2").await;
    assert!(matches!(result, Err(EngineError::AlreadyClaimed(_))));
    assert!(desk.engine.get_ticket(&claimed.channel_id).is_ok());

    let result = desk.engine.cancel_ticket("no-such-channel", "admin").await;
    assert!(matches!(result, Err(EngineError::NotFound(_))));
}

#[tokio::test]
async fn test_close_posts_reason() {
    let desk = TestDesk::new().await;
    desk.open_chef("chef-1").await;
    let ticket = claimed_ticket(&desk, "cust-1", "chef-1").await;

    let result = desk
        .engine
        .close_ticket(&ticket.channel_id, "stranger", None)
        .await;
    assert!(matches!(result, Err(EngineError::NotAuthorized)));

    desk.engine
        .close_ticket(
            &ticket.channel_id,
            "cust-1",
            Some("restaurant closed".to_string()),
        )
        .await
        .unwrap();

    let messages = desk.messenger.messages_in(&ticket.channel_id).await;
    assert!(messages.last().unwrap().contains("restaurant closed"));
    assert!(desk.engine.get_ticket(&ticket.channel_id).is_err());
    assert_eq!(desk.ledger.get("chef-1").unwrap().unwrap().debt, Decimal::ZERO);
}

#[tokio::test]
async fn test_external_channel_removal() {
    let desk = TestDesk::new().await;
    desk.open_chef("chef-1").await;
    let first = claimed_ticket(&desk, "cust-1", "chef-1").await;
    claimed_ticket(&desk, "cust-2", "chef-1").await;
    assert_eq!(
        desk.ledger.get("chef-1").unwrap().unwrap().status,
        ChefStatus::Busy
    );

    let removed = desk.engine.channel_removed(&first.channel_id).await.unwrap();
    assert_eq!(removed.unwrap().customer_id, "cust-1");
    assert!(desk.store.get(&first.channel_id).unwrap().is_none());
    assert!(desk.messenger.deleted_channels().await.is_empty());

    // One claim left: still busy.
    assert_eq!(
        desk.ledger.get("chef-1").unwrap().unwrap().status,
        ChefStatus::Busy
    );

    assert!(desk
        .engine
        .channel_removed("general-chat")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_chat_message_completes_with_parsed_total() {
    let desk = TestDesk::new().await;
    desk.open_chef("chef-1").await;
    let ticket = claimed_ticket(&desk, "cust-1", "chef-1").await;

    let ignored = desk
        .engine
        .handle_chat_message(&ticket.channel_id, "chef-1", "working on it")
        .await
        .unwrap();
    assert!(ignored.is_none());

    let ignored = desk
        .engine
        .handle_chat_message(&ticket.channel_id, "cust-1", "order placed")
        .await
        .unwrap();
    assert!(ignored.is_none());

    let ignored = desk
        .engine
        .handle_chat_message("general-chat", "chef-1", "order placed")
        .await
        .unwrap();
    assert!(ignored.is_none());

    let receipt = desk
        .engine
        .handle_chat_message(&ticket.channel_id, "chef-1", "Order Placed! eta 30 min")
        .await
        .unwrap()
        .expect("completion");
    assert_eq!(receipt.order.amount, dollars(2450));
    assert_eq!(desk.ledger.get("chef-1").unwrap().unwrap().debt, dollars(2450));
}

#[tokio::test]
async fn test_chat_completion_falls_back_when_total_unparseable() {
    let desk = TestDesk::new().await;
    desk.open_chef("chef-1").await;

    let mut request = fixtures::order("cust-1");
    request.total = "whatever the app says".to_string();
    let created = desk.engine.create_ticket(request).await.unwrap();
    desk.engine
        .claim_ticket(&created.ticket.channel_id, "chef-1")
        .await
        .unwrap();

    let receipt = desk
        .engine
        .handle_chat_message(&created.ticket.channel_id, "chef-1", "order complete")
        .await
        .unwrap()
        .expect("completion");
    assert_eq!(receipt.order.amount, dollars(500));
}

#[tokio::test]
async fn test_restart_rehydrates_and_finalizes_completed() {
    let files = FileStores::new();

    let (in_flight, finished) = {
        let desk = files.desk(lingering_completions()).await;
        desk.open_chef("chef-1").await;
        let in_flight = claimed_ticket(&desk, "cust-1", "chef-1").await;
        let finished = claimed_ticket(&desk, "cust-2", "chef-1").await;
        desk.engine
            .complete_ticket(&finished.channel_id, "chef-1", CompletionAmount::OrderTypeFee)
            .await
            .unwrap();
        (in_flight, finished)
    };

    let desk = files.desk(fixtures::immediate_tickets_config()).await;
    let restored = desk.engine.get_ticket(&in_flight.channel_id).unwrap();
    assert!(restored.claimed);
    assert_eq!(restored.chef_id.as_deref(), Some("chef-1"));
    assert!(desk.engine.get_ticket(&finished.channel_id).unwrap().completed);

    assert_eq!(desk.engine.recover().await.unwrap(), 1);
    assert!(desk.engine.get_ticket(&finished.channel_id).is_err());
    assert!(desk.store.get(&finished.channel_id).unwrap().is_none());
    assert_eq!(
        desk.messenger.deleted_channels().await,
        vec![finished.channel_id.clone()]
    );

    // Debt from the completed order survived the restart.
    assert_eq!(desk.ledger.get("chef-1").unwrap().unwrap().debt, dollars(500));
}

#[tokio::test]
async fn test_purge_resets_non_closed_chefs() {
    let desk = TestDesk::new().await;
    desk.open_chef("chef-1").await;
    desk.open_chef("chef-2").await;

    claimed_ticket(&desk, "cust-1", "chef-1").await;
    claimed_ticket(&desk, "cust-2", "chef-1").await;
    desk.engine.create_ticket(fixtures::order("cust-3")).await.unwrap();
    desk.engine
        .set_chef_status("chef-2", "chef-2", None, ChefStatus::Closed)
        .await
        .unwrap();

    let result = desk.engine.purge_tickets("chef-1").await;
    assert!(matches!(result, Err(EngineError::NotAuthorized)));

    let report = desk.engine.purge_tickets("admin").await.unwrap();
    assert_eq!(report.deleted, 3);
    assert_eq!(report.failed, 0);
    assert!(desk.store.list().unwrap().is_empty());
    assert_eq!(desk.messenger.deleted_channels().await.len(), 3);

    assert_eq!(
        desk.ledger.get("chef-1").unwrap().unwrap().status,
        ChefStatus::Open
    );
    assert_eq!(
        desk.ledger.get("chef-2").unwrap().unwrap().status,
        ChefStatus::Closed
    );
}

#[tokio::test]
async fn test_purge_counts_failed_deletions() {
    let desk = TestDesk::new().await;
    desk.engine.create_ticket(fixtures::order("cust-1")).await.unwrap();
    desk.engine.create_ticket(fixtures::order("cust-2")).await.unwrap();
    desk.messenger.fail_operation("delete_channel").await;

    let report = desk.engine.purge_tickets("admin").await.unwrap();
    assert_eq!(report.deleted, 0);
    assert_eq!(report.failed, 2);
    assert!(desk.store.list().unwrap().is_empty());
}

#[tokio::test]
async fn test_active_tickets_listing() {
    let desk = TestDesk::with_config(OrdersConfig::default(), lingering_completions()).await;
    desk.open_chef("chef-1").await;

    let done = claimed_ticket(&desk, "cust-1", "chef-1").await;
    desk.engine
        .complete_ticket(&done.channel_id, "chef-1", CompletionAmount::OrderTypeFee)
        .await
        .unwrap();
    desk.engine.create_ticket(fixtures::order("cust-2")).await.unwrap();

    let result = desk.engine.active_tickets("chef-1").await;
    assert!(matches!(result, Err(EngineError::NotAuthorized)));

    let active = desk.engine.active_tickets("admin").await.unwrap();
    assert_eq!(active.tickets.len(), 1);
    assert_eq!(active.tickets[0].customer_id, "cust-2");
    assert!(!active.high_demand);
}
