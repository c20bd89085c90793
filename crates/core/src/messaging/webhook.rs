//! Messenger that forwards commands to a chat bridge over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::WebhookConfig;

use super::{Messenger, MessagingError};

/// Command posted to `{url}/commands`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum BridgeCommand {
    CreateTicketChannel {
        customer_id: String,
        eligible_chefs: Vec<String>,
    },
    SendMessage {
        channel_id: String,
        content: String,
    },
    DeleteChannel {
        channel_id: String,
    },
    SetChannelVisibility {
        channel_id: String,
        user_id: String,
        visible: bool,
    },
    NotifyUser {
        user_id: String,
        content: String,
    },
}

#[derive(Debug, Deserialize)]
struct CreatedChannel {
    channel_id: String,
}

pub struct WebhookMessenger {
    client: Client,
    config: WebhookConfig,
}

impl WebhookMessenger {
    pub fn new(config: WebhookConfig) -> Result<Self, MessagingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MessagingError::Configuration(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn commands_url(&self) -> String {
        format!("{}/commands", self.config.url.trim_end_matches('/'))
    }

    async fn post(&self, command: &BridgeCommand) -> Result<reqwest::Response, MessagingError> {
        debug!(?command, "Posting bridge command");

        let mut request = self.client.post(self.commands_url()).json(command);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                MessagingError::Timeout
            } else {
                MessagingError::Request(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        if status == StatusCode::NOT_FOUND {
            if let BridgeCommand::SendMessage { channel_id, .. }
            | BridgeCommand::DeleteChannel { channel_id }
            | BridgeCommand::SetChannelVisibility { channel_id, .. } = command
            {
                return Err(MessagingError::ChannelNotFound(channel_id.clone()));
            }
        }
        Err(MessagingError::Rejected {
            status: status.as_u16(),
            message: message.chars().take(200).collect(),
        })
    }
}

#[async_trait]
impl Messenger for WebhookMessenger {
    async fn create_ticket_channel(
        &self,
        customer_id: &str,
        eligible_chefs: &[String],
    ) -> Result<String, MessagingError> {
        let response = self
            .post(&BridgeCommand::CreateTicketChannel {
                customer_id: customer_id.to_string(),
                eligible_chefs: eligible_chefs.to_vec(),
            })
            .await?;

        let created: CreatedChannel = response
            .json()
            .await
            .map_err(|e| MessagingError::Request(format!("invalid bridge response: {}", e)))?;
        Ok(created.channel_id)
    }

    async fn send_message(&self, channel_id: &str, content: &str) -> Result<(), MessagingError> {
        self.post(&BridgeCommand::SendMessage {
            channel_id: channel_id.to_string(),
            content: content.to_string(),
        })
        .await
        .map(|_| ())
    }

    async fn delete_channel(&self, channel_id: &str) -> Result<(), MessagingError> {
        self.post(&BridgeCommand::DeleteChannel {
            channel_id: channel_id.to_string(),
        })
        .await
        .map(|_| ())
    }

    async fn set_channel_visibility(
        &self,
        channel_id: &str,
        user_id: &str,
        visible: bool,
    ) -> Result<(), MessagingError> {
        self.post(&BridgeCommand::SetChannelVisibility {
            channel_id: channel_id.to_string(),
            user_id: user_id.to_string(),
            visible,
        })
        .await
        .map(|_| ())
    }

    async fn notify_user(&self, user_id: &str, content: &str) -> Result<(), MessagingError> {
        self.post(&BridgeCommand::NotifyUser {
            user_id: user_id.to_string(),
            content: content.to_string(),
        })
        .await
        .map(|_| ())
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> WebhookConfig {
        WebhookConfig {
            url: url.to_string(),
            token: None,
            timeout_secs: 1,
        }
    }

    #[test]
    fn test_commands_url_trims_slash() {
        let messenger = WebhookMessenger::new(config("http://bridge:3001/")).unwrap();
        assert_eq!(messenger.commands_url(), "http://bridge:3001/commands");
    }

    #[test]
    fn test_command_wire_format() {
        let json = serde_json::to_value(BridgeCommand::SetChannelVisibility {
            channel_id: "c1".to_string(),
            user_id: "u1".to_string(),
            visible: false,
        })
        .unwrap();
        assert_eq!(json["command"], "set_channel_visibility");
        assert_eq!(json["channel_id"], "c1");
        assert_eq!(json["visible"], false);
    }

    #[tokio::test]
    async fn test_unreachable_bridge_fails() {
        // Port 9 (discard) is closed on test hosts.
        let messenger = WebhookMessenger::new(config("http://127.0.0.1:9")).unwrap();
        let result = messenger.send_message("c1", "hello").await;
        assert!(matches!(
            result,
            Err(MessagingError::Request(_)) | Err(MessagingError::Timeout)
        ));
    }
}
