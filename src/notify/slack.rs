// src/notify/slack.rs
use std::time::Duration;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use metrics::counter;
use reqwest::Client;

use super::Delivery;

/// Posts the draft as `{"text": ...}` to a Slack-compatible webhook. A
/// missing URL means delivery is disabled, not broken.
pub struct SlackWebhook {
    webhook_url: Option<String>,
    client: Client,
}

impl SlackWebhook {
    pub fn new(webhook_url: Option<String>) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client");
        Self {
            webhook_url,
            client,
        }
    }

    pub fn from_env() -> Self {
        Self::new(std::env::var("SLACK_WEBHOOK_URL").ok())
    }
}

#[async_trait]
impl Delivery for SlackWebhook {
    async fn deliver(&self, text: &str) -> String {
        let Some(url) = &self.webhook_url else {
            tracing::debug!("webhook delivery disabled (no SLACK_WEBHOOK_URL)");
            return "Delivery skipped: no webhook configured".to_string();
        };

        let body = serde_json::json!({ "text": text });
        match self.client.post(url).json(&body).send().await {
            Ok(resp) if resp.status().is_success() => {
                format!(
                    "Success sending draft to webhook at {}",
                    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
                )
            }
            Ok(resp) => {
                tracing::warn!(status = %resp.status(), "webhook rejected draft");
                counter!("deliveries_failed_total").increment(1);
                format!("Failed to send draft to webhook: HTTP {}", resp.status())
            }
            Err(e) => {
                tracing::warn!(error = ?e, "webhook request failed");
                counter!("deliveries_failed_total").increment(1);
                format!("Failed to send draft to webhook: {e}")
            }
        }
    }
}
