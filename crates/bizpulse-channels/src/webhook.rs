//! Generic HTTP webhook transport — POST with JSON body.

use async_trait::async_trait;

use bizpulse_core::error::{BizPulseError, Result};
use bizpulse_core::traits::Transport;
use bizpulse_core::types::{EventCategory, Message};

const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// Posts each notification as JSON to a fixed URL. The receiving side is
/// expected to route on `recipient`.
pub struct WebhookTransport {
    url: String,
    headers: Vec<(String, String)>,
    client: reqwest::Client,
}

impl WebhookTransport {
    pub fn new(url: String, headers: Vec<(String, String)>) -> Self {
        Self {
            url,
            headers,
            client: reqwest::Client::new(),
        }
    }

    /// Wire format: `{recipient, text, category, timestamp}`.
    fn payload_body(
        recipient_id: &str,
        message: &Message,
        category: EventCategory,
    ) -> serde_json::Value {
        serde_json::json!({
            "recipient": recipient_id,
            "text": message.text,
            "category": category,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })
    }

    fn request(&self, body: &serde_json::Value) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .post(&self.url)
            .json(body)
            .timeout(REQUEST_TIMEOUT);
        for (key, value) in &self.headers {
            req = req.header(key.as_str(), value.as_str());
        }
        req
    }
}

#[async_trait]
impl Transport for WebhookTransport {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn deliver(
        &self,
        recipient_id: &str,
        message: &Message,
        category: EventCategory,
    ) -> Result<()> {
        let body = Self::payload_body(recipient_id, message, category);

        let resp = self
            .request(&body)
            .send()
            .await
            .map_err(|e| BizPulseError::Channel(format!("Webhook send failed: {e}")))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(BizPulseError::Channel(format!(
                "Webhook error {}",
                resp.status()
            )))
        }
    }

    async fn healthcheck(&self) -> Result<()> {
        // HEAD keeps the probe side-effect free on the receiving end.
        let resp = self
            .client
            .head(&self.url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| BizPulseError::Channel(format!("Webhook unreachable: {e}")))?;
        if resp.status().is_server_error() {
            return Err(BizPulseError::Channel(format!(
                "Webhook unhealthy: {}",
                resp.status()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_body_shape() {
        let body = WebhookTransport::payload_body(
            "grp-1",
            &Message::new("+100 CNY"),
            EventCategory::Recharge,
        );
        assert_eq!(body["recipient"], "grp-1");
        assert_eq!(body["text"], "+100 CNY");
        assert_eq!(body["category"], "recharge");
        assert!(body["timestamp"].is_string());
    }

    #[test]
    fn test_payload_body_category_naming() {
        let body = WebhookTransport::payload_body(
            "m1",
            &Message::new("lucky!"),
            EventCategory::RedPacket,
        );
        assert_eq!(body["category"], "redpacket");
    }
}
