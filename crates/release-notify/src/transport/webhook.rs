//! Slack incoming webhook transport.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use super::{Deliver, DeliveryResult};
use crate::payload::Payload;
use crate::{Error, Result};

/// Posts the whole payload to a pre-registered webhook URL.
pub struct WebhookTransport {
    client: Client,
    url: String,
}

impl WebhookTransport {
    pub fn new(client: Client, url: String) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl Deliver for WebhookTransport {
    fn transport_type(&self) -> &'static str {
        "webhook"
    }

    async fn deliver(&self, payload: &Payload) -> Result<DeliveryResult> {
        let response = self.client.post(&self.url).json(payload).send().await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        debug!(status = %status, body = %body, "Webhook responded");

        // Webhooks answer with plain text; the status code is the only signal.
        if !status.is_success() {
            warn!("Webhook failed: {} - {}", status, body);
            return Err(Error::DeliveryRejected(format!("{} - {}", status, body)));
        }

        info!("Release notification posted via webhook");
        Ok(DeliveryResult {
            success: true,
            server_message_id: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use serde_json::json;

    use super::*;
    use crate::utils::http_client::test_client;

    fn payload() -> Payload {
        Payload {
            text: "BCU v1 released by octocat".to_string(),
            blocks: vec![json!({"type": "divider"})],
        }
    }

    #[tokio::test]
    async fn test_deliver_posts_entire_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/services/T/B/x")
            .match_body(Matcher::Json(json!({
                "text": "BCU v1 released by octocat",
                "blocks": [{"type": "divider"}]
            })))
            .with_status(200)
            .with_body("ok")
            .create_async()
            .await;

        let transport =
            WebhookTransport::new(test_client(), format!("{}/services/T/B/x", server.url()));
        let result = transport.deliver(&payload()).await.unwrap();

        assert!(result.success);
        assert!(result.server_message_id.is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_deliver_error_status_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/services/T/B/x")
            .with_status(400)
            .with_body("invalid_payload")
            .create_async()
            .await;

        let transport =
            WebhookTransport::new(test_client(), format!("{}/services/T/B/x", server.url()));
        let err = transport.deliver(&payload()).await.unwrap_err();

        assert!(
            matches!(err, Error::DeliveryRejected(ref body) if body.contains("invalid_payload"))
        );
    }
}
