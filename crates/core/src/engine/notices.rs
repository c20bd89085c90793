//! Chat texts posted by the engine.

use rust_decimal::Decimal;

use crate::ledger::Chef;
use crate::money::format_amount;
use crate::ticket::Ticket;

pub(crate) fn welcome(ticket: &Ticket, high_demand: bool) -> String {
    let mut text = format!(
        "New {} order from {}\nOrder link: {}\nTotal: {}",
        ticket.order_type.label(),
        ticket.customer_id,
        ticket.order_link,
        ticket.total
    );
    if let Some(instructions) = &ticket.special_instructions {
        text.push_str(&format!("\nSpecial instructions: {}", instructions));
    }
    text.push_str("\nA chef will claim this ticket shortly.");
    if high_demand {
        text.push_str("\nWe're experiencing high demand right now, so it may take a little longer.");
    }
    text
}

pub(crate) fn claimed(chef_id: &str) -> String {
    format!("{} claimed this ticket and is working on your order.", chef_id)
}

pub(crate) fn completed(amount: Decimal) -> String {
    format!(
        "Order completed. {} was added to the chef's balance. This channel will be removed shortly.",
        format_amount(amount)
    )
}

pub(crate) fn debt_summary(chef: &Chef, amount: Decimal) -> String {
    format!(
        "Order completed: {} added. You now owe {} across {} order(s).",
        format_amount(amount),
        format_amount(chef.debt),
        chef.completed_orders
    )
}

pub(crate) fn cancelled() -> String {
    "This ticket was cancelled. The channel will be removed shortly.".to_string()
}

pub(crate) fn closed(reason: Option<&str>) -> String {
    match reason {
        Some(reason) => format!(
            "This ticket was closed: {}. The channel will be removed shortly.",
            reason
        ),
        None => "This ticket was closed. The channel will be removed shortly.".to_string(),
    }
}

pub(crate) fn chef_went_offline() -> String {
    "Your chef has gone offline. Hang tight, this ticket stays open until they're back.".to_string()
}

pub(crate) fn chef_back_online() -> String {
    "Your chef is back online and will continue with your order.".to_string()
}

pub(crate) fn debt_cleared(amount: Decimal) -> String {
    format!(
        "Your balance of {} has been cleared.",
        format_amount(amount)
    )
}
