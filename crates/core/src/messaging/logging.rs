use async_trait::async_trait;
use tracing::info;

use super::{Messenger, MessagingError};

/// Messenger that only logs. Useful when running without a chat bridge.
pub struct LogMessenger;

impl LogMessenger {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogMessenger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Messenger for LogMessenger {
    async fn create_ticket_channel(
        &self,
        customer_id: &str,
        eligible_chefs: &[String],
    ) -> Result<String, MessagingError> {
        let channel_id = format!("ticket-{}", uuid::Uuid::new_v4().simple());
        info!(
            channel_id = %channel_id,
            customer_id = %customer_id,
            chefs = eligible_chefs.len(),
            "Created ticket channel"
        );
        Ok(channel_id)
    }

    async fn send_message(&self, channel_id: &str, content: &str) -> Result<(), MessagingError> {
        info!(channel_id = %channel_id, "{}", content);
        Ok(())
    }

    async fn delete_channel(&self, channel_id: &str) -> Result<(), MessagingError> {
        info!(channel_id = %channel_id, "Deleted channel");
        Ok(())
    }

    async fn set_channel_visibility(
        &self,
        channel_id: &str,
        user_id: &str,
        visible: bool,
    ) -> Result<(), MessagingError> {
        info!(channel_id = %channel_id, user_id = %user_id, visible, "Changed channel visibility");
        Ok(())
    }

    async fn notify_user(&self, user_id: &str, content: &str) -> Result<(), MessagingError> {
        info!(user_id = %user_id, "{}", content);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
