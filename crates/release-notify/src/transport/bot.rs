//! Slack Web API transport authenticated with a bot token.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::{Deliver, DeliveryResult};
use crate::payload::Payload;
use crate::{Error, Result};

/// Base URL of the Slack Web API.
pub const SLACK_API_URL: &str = "https://slack.com/api";

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    #[serde(default)]
    ok: bool,
    ts: Option<String>,
    error: Option<String>,
    warning: Option<String>,
}

/// Posts the payload blocks with `chat.postMessage`.
pub struct BotTransport {
    client: Client,
    channel_id: String,
    bot_token: String,
    api_url: String,
}

impl BotTransport {
    pub fn new(client: Client, channel_id: String, bot_token: String) -> Self {
        Self {
            client,
            channel_id,
            bot_token,
            api_url: SLACK_API_URL.to_string(),
        }
    }

    /// Point the transport at another Web API base URL.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Request body: the payload's blocks only, unfurling disabled.
    fn build_body(&self, payload: &Payload) -> Value {
        json!({
            "channel": self.channel_id,
            "blocks": payload.blocks,
            "unfurl_links": false,
            "unfurl_media": false
        })
    }
}

#[async_trait]
impl Deliver for BotTransport {
    fn transport_type(&self) -> &'static str {
        "bot"
    }

    async fn deliver(&self, payload: &Payload) -> Result<DeliveryResult> {
        let url = format!("{}/chat.postMessage", self.api_url.trim_end_matches('/'));
        let body = self.build_body(payload);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.bot_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let raw = response.text().await?;
        debug!(status = %status, "chat.postMessage responded");

        let parsed: PostMessageResponse = match serde_json::from_str(&raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(status = %status, error = %e, "Unparseable chat.postMessage response");
                return Err(Error::DeliveryRejected(raw));
            }
        };

        if !parsed.ok {
            warn!(
                channel = %self.channel_id,
                error = parsed.error.as_deref().unwrap_or("unknown"),
                "Slack rejected the message"
            );
            return Err(Error::DeliveryRejected(raw));
        }

        if let Some(warning) = parsed.warning.as_deref() {
            warn!(warning, "Slack accepted the message with a warning");
        }

        info!(
            channel = %self.channel_id,
            ts = parsed.ts.as_deref().unwrap_or_default(),
            "Release notification posted"
        );

        Ok(DeliveryResult {
            success: true,
            server_message_id: parsed.ts,
        })
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;

    use super::*;
    use crate::utils::http_client::test_client;

    fn payload() -> Payload {
        Payload {
            text: "BCU v1 released by octocat".to_string(),
            blocks: vec![json!({"type": "divider"})],
        }
    }

    fn transport(api_url: String) -> BotTransport {
        BotTransport::new(test_client(), "C123".to_string(), "xoxb-test".to_string())
            .with_api_url(api_url)
    }

    #[test]
    fn test_body_carries_blocks_only() {
        let body = transport(SLACK_API_URL.to_string()).build_body(&payload());

        assert_eq!(body["channel"], "C123");
        assert_eq!(body["blocks"], json!([{"type": "divider"}]));
        assert_eq!(body["unfurl_links"], false);
        assert_eq!(body["unfurl_media"], false);
        assert!(body.get("text").is_none());
    }

    #[tokio::test]
    async fn test_deliver_returns_message_ts() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat.postMessage")
            .match_header("authorization", "Bearer xoxb-test")
            .match_body(Matcher::PartialJson(json!({
                "channel": "C123",
                "unfurl_links": false
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok": true, "channel": "C123", "ts": "1700000000.000100"}"#)
            .create_async()
            .await;

        let result = transport(server.url()).deliver(&payload()).await.unwrap();

        assert!(result.success);
        assert_eq!(
            result.server_message_id.as_deref(),
            Some("1700000000.000100")
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_deliver_rejected_carries_raw_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat.postMessage")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok": false, "error": "channel_not_found"}"#)
            .create_async()
            .await;

        let err = transport(server.url())
            .deliver(&payload())
            .await
            .unwrap_err();

        match err {
            Error::DeliveryRejected(body) => assert!(body.contains("channel_not_found")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_deliver_non_json_response_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat.postMessage")
            .with_status(502)
            .with_body("Bad Gateway")
            .create_async()
            .await;

        let err = transport(server.url())
            .deliver(&payload())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DeliveryRejected(ref body) if body == "Bad Gateway"));
    }
}
