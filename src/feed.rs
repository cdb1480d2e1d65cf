use anyhow::{Context, Result};
use serde::Deserialize;

use crate::config::FeedConfig;

/// Inbound message source: Telegram long-polling via getUpdates.
///
/// Tracks the update offset so each message is seen once. Feed errors belong
/// to the transport; they never touch engine state.
pub struct TelegramFeed {
    bot_token: String,
    source_chat_id: String,
    poll_timeout_secs: u64,
    offset: i64,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct UpdatesResponse {
    ok: bool,
    #[serde(default)]
    result: Vec<Update>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: Chat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

impl TelegramFeed {
    pub fn new(config: &FeedConfig) -> Self {
        Self {
            bot_token: config.bot_token.clone(),
            source_chat_id: config.source_chat_id.clone(),
            poll_timeout_secs: config.poll_timeout_secs,
            offset: 0,
            client: reqwest::Client::new(),
        }
    }

    /// Long-poll for new messages; returns the raw text of each message from
    /// the configured source chat, in arrival order.
    pub async fn next_batch(&mut self) -> Result<Vec<String>> {
        let url = format!("https://api.telegram.org/bot{}/getUpdates", self.bot_token);
        let response: UpdatesResponse = self
            .client
            .get(&url)
            .query(&[
                ("offset", self.offset.to_string()),
                ("timeout", self.poll_timeout_secs.to_string()),
                ("allowed_updates", "[\"message\"]".to_string()),
            ])
            .send()
            .await
            .context("getUpdates request failed")?
            .error_for_status()?
            .json()
            .await
            .context("getUpdates response was not valid JSON")?;

        if !response.ok {
            anyhow::bail!("getUpdates returned ok=false");
        }

        let mut texts = Vec::new();
        for update in response.result {
            self.offset = self.offset.max(update.update_id + 1);
            let Some(message) = update.message else { continue };
            let Some(text) = message.text else { continue };
            if !self.source_chat_id.is_empty()
                && message.chat.id.to_string() != self.source_chat_id
            {
                tracing::debug!(chat_id = message.chat.id, "Message from unexpected chat, skipped");
                continue;
            }
            texts.push(text);
        }
        Ok(texts)
    }
}
