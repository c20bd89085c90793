//! Prometheus metrics for the order desk.
//!
//! Statics are registered into the server's registry via [`all_metrics`].

use once_cell::sync::Lazy;
use prometheus::{Counter, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

// =============================================================================
// Tickets
// =============================================================================

/// Tickets opened by customers.
pub static TICKETS_CREATED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("quickeats_tickets_created_total", "Total tickets created").unwrap()
});

/// Lifecycle transitions by kind.
pub static TICKET_TRANSITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "quickeats_ticket_transitions_total",
            "Ticket lifecycle transitions",
        ),
        &["transition"], // "claimed", "completed", "cancelled", "closed", "channel_removed", "purged"
    )
    .unwrap()
});

/// Tickets currently held in the repository.
pub static ACTIVE_TICKETS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("quickeats_active_tickets", "Tickets currently in flight").unwrap()
});

// =============================================================================
// Ledger
// =============================================================================

/// Completed orders by platform.
pub static ORDERS_COMPLETED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("quickeats_orders_completed_total", "Total completed orders"),
        &["order_type"],
    )
    .unwrap()
});

/// Debt added by completions, in dollars.
pub static DEBT_ACCRUED: Lazy<Counter> = Lazy::new(|| {
    Counter::new(
        "quickeats_debt_accrued_total",
        "Total debt accrued by chefs in dollars",
    )
    .unwrap()
});

/// Amount charged per completed order.
pub static ORDER_AMOUNT: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new("quickeats_order_amount", "Debt charged per completed order")
            .buckets(vec![1.0, 2.5, 5.0, 10.0, 20.0, 50.0, 100.0]),
    )
    .unwrap()
});

/// Chefs currently OPEN.
pub static CHEFS_OPEN: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("quickeats_chefs_open", "Number of chefs in OPEN status").unwrap()
});

// =============================================================================
// Side effects
// =============================================================================

/// Best-effort messaging calls that failed.
pub static SIDE_EFFECT_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "quickeats_side_effect_failures_total",
            "Failed best-effort messaging side effects",
        ),
        &["operation"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Record the ledger effect of a completed order.
pub fn record_completion(order_type: &str, amount: Decimal) {
    ORDERS_COMPLETED.with_label_values(&[order_type]).inc();
    let dollars = amount.to_f64().unwrap_or(0.0);
    if dollars > 0.0 {
        DEBT_ACCRUED.inc_by(dollars);
    }
    ORDER_AMOUNT.observe(dollars);
}

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(TICKETS_CREATED.clone()),
        Box::new(TICKET_TRANSITIONS.clone()),
        Box::new(ACTIVE_TICKETS.clone()),
        Box::new(ORDERS_COMPLETED.clone()),
        Box::new(DEBT_ACCRUED.clone()),
        Box::new(ORDER_AMOUNT.clone()),
        Box::new(CHEFS_OPEN.clone()),
        Box::new(SIDE_EFFECT_FAILURES.clone()),
    ]
}
