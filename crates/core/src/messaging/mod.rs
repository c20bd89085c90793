//! Chat platform side effects.
//!
//! The engine never talks to the chat platform directly. Channel management
//! and message delivery go through the `Messenger` trait so the platform
//! bridge can be swapped (or mocked in tests).

mod logging;
mod webhook;

pub use logging::LogMessenger;
pub use webhook::{BridgeCommand, WebhookMessenger};

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{MessagingBackend, MessagingConfig};

#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    #[error("Bridge request failed: {0}")]
    Request(String),

    #[error("Bridge timed out")]
    Timeout,

    #[error("Bridge rejected command: HTTP {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Messaging configuration error: {0}")]
    Configuration(String),
}

/// Chat platform operations the order desk relies on.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Create a private channel for `customer_id` that `eligible_chefs` can see.
    /// Returns the new channel handle.
    async fn create_ticket_channel(
        &self,
        customer_id: &str,
        eligible_chefs: &[String],
    ) -> Result<String, MessagingError>;

    async fn send_message(&self, channel_id: &str, content: &str) -> Result<(), MessagingError>;

    async fn delete_channel(&self, channel_id: &str) -> Result<(), MessagingError>;

    /// Grant or revoke `user_id`'s view of a channel.
    async fn set_channel_visibility(
        &self,
        channel_id: &str,
        user_id: &str,
        visible: bool,
    ) -> Result<(), MessagingError>;

    /// Direct message to a user.
    async fn notify_user(&self, user_id: &str, content: &str) -> Result<(), MessagingError>;

    /// Backend name for logs.
    fn name(&self) -> &'static str;
}

/// Build the configured messenger backend.
pub fn create_messenger(config: &MessagingConfig) -> Result<Arc<dyn Messenger>, MessagingError> {
    match config.backend {
        MessagingBackend::Log => Ok(Arc::new(LogMessenger::new())),
        MessagingBackend::Webhook => {
            let webhook = config.webhook.clone().ok_or_else(|| {
                MessagingError::Configuration(
                    "messaging.webhook must be set when backend = \"webhook\"".to_string(),
                )
            })?;
            Ok(Arc::new(WebhookMessenger::new(webhook)?))
        }
    }
}
