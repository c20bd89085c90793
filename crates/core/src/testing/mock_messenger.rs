//! Mock messenger for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::messaging::{Messenger, MessagingError};

/// A recorded messenger call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessengerCall {
    CreateChannel {
        customer_id: String,
        eligible_chefs: Vec<String>,
        channel_id: String,
    },
    SendMessage {
        channel_id: String,
        content: String,
    },
    DeleteChannel {
        channel_id: String,
    },
    SetVisibility {
        channel_id: String,
        user_id: String,
        visible: bool,
    },
    NotifyUser {
        user_id: String,
        content: String,
    },
}

/// Mock implementation of the Messenger trait.
///
/// Records every call (failed ones included) and hands out sequential
/// channel ids `chan-1`, `chan-2`, ... Individual operations can be made to
/// fail by name, e.g. `"send_message"` or `"create_ticket_channel"`.
///
/// # Example
///
/// ```rust,ignore
/// use quickeats_core::testing::MockMessenger;
///
/// let messenger = MockMessenger::new();
/// messenger.fail_operation("notify_user").await;
///
/// // ... drive the engine ...
///
/// assert_eq!(messenger.deleted_channels().await, vec!["chan-1"]);
/// ```
#[derive(Debug, Default)]
pub struct MockMessenger {
    calls: Arc<RwLock<Vec<MessengerCall>>>,
    failing: Arc<RwLock<HashSet<&'static str>>>,
    next_channel: AtomicU64,
}

impl MockMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call of `operation` fail.
    pub async fn fail_operation(&self, operation: &'static str) {
        self.failing.write().await.insert(operation);
    }

    /// Let `operation` succeed again.
    pub async fn recover_operation(&self, operation: &'static str) {
        self.failing.write().await.remove(operation);
    }

    pub async fn calls(&self) -> Vec<MessengerCall> {
        self.calls.read().await.clone()
    }

    pub async fn clear_calls(&self) {
        self.calls.write().await.clear();
    }

    /// Messages sent to `channel_id`, in order.
    pub async fn messages_in(&self, channel_id: &str) -> Vec<String> {
        self.calls
            .read()
            .await
            .iter()
            .filter_map(|call| match call {
                MessengerCall::SendMessage {
                    channel_id: c,
                    content,
                } if c == channel_id => Some(content.clone()),
                _ => None,
            })
            .collect()
    }

    /// Direct messages sent to `user_id`, in order.
    pub async fn notifications_for(&self, user_id: &str) -> Vec<String> {
        self.calls
            .read()
            .await
            .iter()
            .filter_map(|call| match call {
                MessengerCall::NotifyUser {
                    user_id: u,
                    content,
                } if u == user_id => Some(content.clone()),
                _ => None,
            })
            .collect()
    }

    pub async fn deleted_channels(&self) -> Vec<String> {
        self.calls
            .read()
            .await
            .iter()
            .filter_map(|call| match call {
                MessengerCall::DeleteChannel { channel_id } => Some(channel_id.clone()),
                _ => None,
            })
            .collect()
    }

    /// Visibility changes as `(channel_id, user_id, visible)`.
    pub async fn visibility_changes(&self) -> Vec<(String, String, bool)> {
        self.calls
            .read()
            .await
            .iter()
            .filter_map(|call| match call {
                MessengerCall::SetVisibility {
                    channel_id,
                    user_id,
                    visible,
                } => Some((channel_id.clone(), user_id.clone(), *visible)),
                _ => None,
            })
            .collect()
    }

    async fn record(&self, operation: &'static str, call: MessengerCall) -> Result<(), MessagingError> {
        self.calls.write().await.push(call);
        if self.failing.read().await.contains(operation) {
            return Err(MessagingError::Request(format!("mock {} failure", operation)));
        }
        Ok(())
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn create_ticket_channel(
        &self,
        customer_id: &str,
        eligible_chefs: &[String],
    ) -> Result<String, MessagingError> {
        let channel_id = format!("chan-{}", self.next_channel.fetch_add(1, Ordering::SeqCst) + 1);
        self.record(
            "create_ticket_channel",
            MessengerCall::CreateChannel {
                customer_id: customer_id.to_string(),
                eligible_chefs: eligible_chefs.to_vec(),
                channel_id: channel_id.clone(),
            },
        )
        .await?;
        Ok(channel_id)
    }

    async fn send_message(&self, channel_id: &str, content: &str) -> Result<(), MessagingError> {
        self.record(
            "send_message",
            MessengerCall::SendMessage {
                channel_id: channel_id.to_string(),
                content: content.to_string(),
            },
        )
        .await
    }

    async fn delete_channel(&self, channel_id: &str) -> Result<(), MessagingError> {
        self.record(
            "delete_channel",
            MessengerCall::DeleteChannel {
                channel_id: channel_id.to_string(),
            },
        )
        .await
    }

    async fn set_channel_visibility(
        &self,
        channel_id: &str,
        user_id: &str,
        visible: bool,
    ) -> Result<(), MessagingError> {
        self.record(
            "set_channel_visibility",
            MessengerCall::SetVisibility {
                channel_id: channel_id.to_string(),
                user_id: user_id.to_string(),
                visible,
            },
        )
        .await
    }

    async fn notify_user(&self, user_id: &str, content: &str) -> Result<(), MessagingError> {
        self.record(
            "notify_user",
            MessengerCall::NotifyUser {
                user_id: user_id.to_string(),
                content: content.to_string(),
            },
        )
        .await
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
