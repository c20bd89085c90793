//! HTTP command surface for the QuickEats order desk.

pub mod api;
pub mod metrics;
pub mod state;
