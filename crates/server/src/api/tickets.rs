//! Ticket API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use quickeats_core::engine::{ActiveTickets, CompletionReceipt, CreatedTicket, PurgeReport};
use quickeats_core::{CompletionAmount, CreateTicketRequest, Ticket};

use super::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Request Types
// ============================================================================

/// Identifies the chat user performing an action.
#[derive(Debug, Deserialize)]
pub struct ActorParams {
    pub actor_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ClaimTicketBody {
    pub chef_id: String,
}

/// Request body for completing a ticket.
///
/// Without `amount` the configured per-platform fee is charged; with
/// `use_total` the amount is parsed from the ticket's total.
#[derive(Debug, Deserialize)]
pub struct CompleteTicketBody {
    pub actor_id: String,
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub use_total: bool,
}

impl CompleteTicketBody {
    fn completion_amount(&self) -> CompletionAmount {
        match (self.amount, self.use_total) {
            (Some(amount), _) => CompletionAmount::Fixed(amount),
            (None, true) => CompletionAmount::FromTotal,
            (None, false) => CompletionAmount::OrderTypeFee,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CloseTicketBody {
    pub actor_id: String,
    pub reason: Option<String>,
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct TicketResponse {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub state: &'static str,
}

impl From<Ticket> for TicketResponse {
    fn from(ticket: Ticket) -> Self {
        Self {
            state: ticket.state().as_str(),
            ticket,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Open a new ticket for a customer order
pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateTicketRequest>,
) -> Result<(StatusCode, Json<CreatedTicket>), ApiError> {
    let created = state.engine().create_ticket(body).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// List active tickets (admin only)
pub async fn list_tickets(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ActorParams>,
) -> Result<Json<ActiveTickets>, ApiError> {
    Ok(Json(state.engine().active_tickets(&params.actor_id).await?))
}

pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    Path(channel_id): Path<String>,
) -> Result<Json<TicketResponse>, ApiError> {
    let ticket = state.engine().get_ticket(&channel_id)?;
    Ok(Json(TicketResponse::from(ticket)))
}

pub async fn claim_ticket(
    State(state): State<Arc<AppState>>,
    Path(channel_id): Path<String>,
    Json(body): Json<ClaimTicketBody>,
) -> Result<Json<TicketResponse>, ApiError> {
    let ticket = state
        .engine()
        .claim_ticket(&channel_id, &body.chef_id)
        .await?;
    Ok(Json(TicketResponse::from(ticket)))
}

pub async fn complete_ticket(
    State(state): State<Arc<AppState>>,
    Path(channel_id): Path<String>,
    Json(body): Json<CompleteTicketBody>,
) -> Result<Json<CompletionReceipt>, ApiError> {
    let receipt = state
        .engine()
        .complete_ticket(&channel_id, &body.actor_id, body.completion_amount())
        .await?;
    Ok(Json(receipt))
}

pub async fn cancel_ticket(
    State(state): State<Arc<AppState>>,
    Path(channel_id): Path<String>,
    Json(body): Json<ActorParams>,
) -> Result<Json<TicketResponse>, ApiError> {
    let ticket = state
        .engine()
        .cancel_ticket(&channel_id, &body.actor_id)
        .await?;
    Ok(Json(TicketResponse::from(ticket)))
}

pub async fn close_ticket(
    State(state): State<Arc<AppState>>,
    Path(channel_id): Path<String>,
    Json(body): Json<CloseTicketBody>,
) -> Result<Json<TicketResponse>, ApiError> {
    let ticket = state
        .engine()
        .close_ticket(&channel_id, &body.actor_id, body.reason)
        .await?;
    Ok(Json(TicketResponse::from(ticket)))
}

/// Drop every ticket and its channel (admin only)
pub async fn purge_tickets(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ActorParams>,
) -> Result<Json<PurgeReport>, ApiError> {
    Ok(Json(state.engine().purge_tickets(&body.actor_id).await?))
}
