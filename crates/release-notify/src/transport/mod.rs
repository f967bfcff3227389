//! Delivery transports.
//!
//! This module provides the two ways a payload reaches Slack:
//! - Bot token (`chat.postMessage` Web API call)
//! - Incoming webhook (HTTP POST of the whole payload)

mod bot;
mod webhook;

pub use bot::{BotTransport, SLACK_API_URL};
pub use webhook::WebhookTransport;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::Result;
use crate::config::{Credentials, NotificationConfig};
use crate::payload::Payload;

/// Outcome of a successful delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryResult {
    pub success: bool,
    /// Message timestamp assigned by Slack. Only the bot transport gets one.
    pub server_message_id: Option<String>,
}

/// Something that can hand a payload to Slack.
#[async_trait]
pub trait Deliver: Send + Sync {
    /// Get the transport type name.
    fn transport_type(&self) -> &'static str;

    /// Deliver the payload. Any failure is final.
    async fn deliver(&self, payload: &Payload) -> Result<DeliveryResult>;
}

/// Transport selected by [`NotificationConfig`].
pub enum Transport {
    Bot(BotTransport),
    Webhook(WebhookTransport),
}

impl Transport {
    pub fn from_config(config: &NotificationConfig, client: Client) -> Self {
        match config.credentials() {
            Credentials::Bot {
                channel_id,
                bot_token,
            } => Self::Bot(BotTransport::new(
                client,
                channel_id.clone(),
                bot_token.clone(),
            )),
            Credentials::Webhook { url } => {
                Self::Webhook(WebhookTransport::new(client, url.clone()))
            }
        }
    }
}

#[async_trait]
impl Deliver for Transport {
    fn transport_type(&self) -> &'static str {
        match self {
            Self::Bot(t) => t.transport_type(),
            Self::Webhook(t) => t.transport_type(),
        }
    }

    async fn deliver(&self, payload: &Payload) -> Result<DeliveryResult> {
        match self {
            Self::Bot(t) => t.deliver(payload).await,
            Self::Webhook(t) => t.deliver(payload).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::config::{BOT_TOKEN, CHANNEL_ID, WEBHOOK_URL};
    use crate::utils::http_client::test_client;

    #[test]
    fn test_transport_follows_config() {
        let mut values = HashMap::new();
        values.insert(CHANNEL_ID.to_string(), "C123".to_string());
        values.insert(BOT_TOKEN.to_string(), "xoxb-1".to_string());
        values.insert(WEBHOOK_URL.to_string(), "https://example.com/hook".to_string());

        let bot = NotificationConfig::from_values("bot", &values).unwrap();
        assert_eq!(
            Transport::from_config(&bot, test_client()).transport_type(),
            "bot"
        );

        let webhook = NotificationConfig::from_values("webhook", &values).unwrap();
        assert_eq!(
            Transport::from_config(&webhook, test_client()).transport_type(),
            "webhook"
        );
    }
}
