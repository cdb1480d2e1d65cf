pub mod telegram;
pub mod webhook;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::NotifyConfig;

/// Trait for alert delivery channels
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Channel name
    fn name(&self) -> &str;

    /// Deliver one rendered report
    async fn deliver(&self, report: &str) -> Result<()>;
}

/// Create all enabled notifiers based on configuration
pub fn create_notifiers(config: &NotifyConfig) -> Result<Vec<Box<dyn Notifier>>> {
    let mut notifiers: Vec<Box<dyn Notifier>> = Vec::new();

    if let Some(ref tc) = config.telegram {
        if tc.enabled {
            notifiers.push(Box::new(telegram::TelegramNotifier::new(tc)));
        }
    }

    if let Some(ref wc) = config.webhook {
        if wc.enabled {
            notifiers.push(Box::new(webhook::WebhookNotifier::new(wc)));
        }
    }

    tracing::info!(count = notifiers.len(), "Initialized notifiers");
    Ok(notifiers)
}

/// Push one report to every channel. Per-channel failures are logged and
/// swallowed; the engine never retries and history is already committed.
pub async fn deliver_all(notifiers: &[Box<dyn Notifier>], report: &str) {
    for notifier in notifiers {
        if let Err(e) = notifier.deliver(report).await {
            tracing::error!(
                channel = notifier.name(),
                error = %e,
                "Failed to deliver report"
            );
        }
    }
}
