use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use super::{audit, chefs, events, handlers, middleware as mw, tickets};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Probes stay reachable without credentials
    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::get_metrics));

    let api_routes = Router::new()
        .route("/config", get(handlers::get_config))
        .route("/status", get(handlers::get_status))
        .route("/audit", get(audit::query_audit))
        // Tickets
        .route("/tickets", post(tickets::create_ticket))
        .route("/tickets", get(tickets::list_tickets))
        .route("/tickets/purge", post(tickets::purge_tickets))
        .route("/tickets/{channel_id}", get(tickets::get_ticket))
        .route("/tickets/{channel_id}/claim", post(tickets::claim_ticket))
        .route("/tickets/{channel_id}/complete", post(tickets::complete_ticket))
        .route("/tickets/{channel_id}/cancel", post(tickets::cancel_ticket))
        .route("/tickets/{channel_id}/close", post(tickets::close_ticket))
        // Chat platform events relayed by the bridge
        .route("/events/channel-deleted", post(events::channel_deleted))
        .route("/events/message", post(events::message_posted))
        // Chefs and the ledger
        .route("/chefs", get(chefs::list_chefs))
        .route("/chefs/{chef_id}", delete(chefs::remove_chef))
        .route("/chefs/{chef_id}/status", put(chefs::set_status))
        .route("/chefs/{chef_id}/debt", get(chefs::chef_debt))
        .route("/chefs/{chef_id}/debt/clear", post(chefs::clear_debt))
        .route("/debts", get(chefs::all_debts))
        .route("/orders", get(chefs::order_history))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            mw::auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .nest("/api/v1", public_routes.merge(api_routes))
        .layer(middleware::from_fn(mw::metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
