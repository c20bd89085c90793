//! Chat platform events forwarded by the bridge.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use quickeats_core::CompletionReceipt;

use super::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChannelDeletedEvent {
    pub channel_id: String,
}

#[derive(Debug, Serialize)]
pub struct ChannelDeletedResponse {
    /// Whether the channel belonged to a ticket.
    pub ticket_removed: bool,
}

#[derive(Debug, Deserialize)]
pub struct MessageEvent {
    pub channel_id: String,
    pub author_id: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<CompletionReceipt>,
}

/// A channel was deleted on the chat platform.
pub async fn channel_deleted(
    State(state): State<Arc<AppState>>,
    Json(event): Json<ChannelDeletedEvent>,
) -> Result<Json<ChannelDeletedResponse>, ApiError> {
    let removed = state.engine().channel_removed(&event.channel_id).await?;
    Ok(Json(ChannelDeletedResponse {
        ticket_removed: removed.is_some(),
    }))
}

/// A message was posted; may complete the ticket it was posted in.
pub async fn message_posted(
    State(state): State<Arc<AppState>>,
    Json(event): Json<MessageEvent>,
) -> Result<Json<MessageResponse>, ApiError> {
    let receipt = state
        .engine()
        .handle_chat_message(&event.channel_id, &event.author_id, &event.content)
        .await?;
    Ok(Json(MessageResponse {
        completed: receipt.is_some(),
        receipt,
    }))
}
