use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use super::Notifier;
use crate::config::WebhookConfig;

/// Custom webhook alert channel
pub struct WebhookNotifier {
    url: String,
    headers: std::collections::HashMap<String, String>,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(config: &WebhookConfig) -> Self {
        Self {
            url: config.url.clone(),
            headers: config.headers.clone(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str { "webhook" }

    async fn deliver(&self, report: &str) -> Result<()> {
        let payload = json!({
            "report": report,
            "timestamp": Utc::now().to_rfc3339(),
        });

        let mut req = self.client.post(&self.url).json(&payload);
        for (k, v) in &self.headers {
            req = req.header(k, v);
        }

        req.send().await?.error_for_status()?;
        Ok(())
    }
}
