use anyhow::{Context, Result};
use serde::Deserialize;

use crate::types::{ComparisonMode, MetricId};

/// Top-level configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    /// Evaluation runs in declaration order of this table.
    #[serde(default = "default_metric_rules")]
    pub metrics: Vec<MetricRule>,
    #[serde(default)]
    pub notify: NotifyConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AgentConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self { log_level: default_log_level() }
    }
}

/// Inbound message source (Telegram long-poll)
#[derive(Debug, Deserialize, Clone, Default)]
pub struct FeedConfig {
    pub bot_token: String,
    /// Only messages from this chat are ingested; empty accepts all.
    #[serde(default)]
    pub source_chat_id: String,
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
}

/// Per-metric series retention
#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum RetentionPolicy {
    /// Keep at most `max_samples` most-recent samples (ring-buffer semantics)
    Count { max_samples: usize },
    /// Keep samples no older than `max_hours` at insertion time
    Age { max_hours: u32 },
}

#[derive(Debug, Deserialize, Clone)]
pub struct HistoryConfig {
    #[serde(default = "default_retention")]
    pub retention: RetentionPolicy,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { retention: default_retention() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DetectorConfig {
    /// Snapshots that must be recorded before any evaluation runs
    #[serde(default = "default_warmup_floor")]
    pub warmup_floor: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self { warmup_floor: default_warmup_floor() }
    }
}

/// Reference value policy for one metric
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BaselineMode {
    /// The sample immediately preceding the current one
    PreviousSample,
    /// Mean of up to the last `window` retained samples (current included)
    FixedCountAverage { window: usize },
    /// Mean over each lookback horizon, evaluated smallest-first
    TimeWindowAverage { horizons_hours: Vec<u32> },
}

/// Threshold rule for one metric
#[derive(Debug, Deserialize, Clone)]
pub struct MetricRule {
    pub metric: MetricId,
    pub label: String,
    pub comparison: ComparisonMode,
    pub threshold: f64,
    pub baseline: BaselineMode,
    /// Minimum qualifying samples before a horizon is eligible
    #[serde(default)]
    pub min_samples: Option<usize>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct NotifyConfig {
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,
    #[serde(default)]
    pub webhook: Option<WebhookConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    #[serde(default)]
    pub enabled: bool,
    pub bot_token: String,
    pub chat_id: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebhookConfig {
    #[serde(default)]
    pub enabled: bool,
    pub url: String,
    #[serde(default)]
    pub headers: std::collections::HashMap<String, String>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        // Expand environment variables
        let expanded = expand_env_vars(&content);

        let config: Config = toml::from_str(&expanded)
            .with_context(|| "Failed to parse configuration")?;

        Ok(config)
    }
}

/// Expand ${ENV_VAR} references in config string
fn expand_env_vars(input: &str) -> String {
    let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();
    re.replace_all(input, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_default()
    })
    .to_string()
}

/// Default rule set: percent deviation against the trailing average over the
/// retention window.
fn default_metric_rules() -> Vec<MetricRule> {
    let avg = BaselineMode::FixedCountAverage { window: 12 };
    vec![
        MetricRule {
            metric: MetricId::Price,
            label: "Price".into(),
            comparison: ComparisonMode::Percent,
            threshold: 2.0,
            baseline: avg.clone(),
            min_samples: None,
        },
        MetricRule {
            metric: MetricId::OpenInterest,
            label: "Open Interest".into(),
            comparison: ComparisonMode::Percent,
            threshold: 5.0,
            baseline: avg.clone(),
            min_samples: None,
        },
        MetricRule {
            metric: MetricId::FundingRate,
            label: "Funding Rate".into(),
            comparison: ComparisonMode::Percent,
            threshold: 50.0,
            baseline: avg.clone(),
            min_samples: None,
        },
        MetricRule {
            metric: MetricId::LongRatio,
            label: "Long Ratio".into(),
            comparison: ComparisonMode::Percent,
            threshold: 3.0,
            baseline: avg.clone(),
            min_samples: None,
        },
        MetricRule {
            metric: MetricId::TakerBuy,
            label: "Taker Buy Volume".into(),
            comparison: ComparisonMode::Percent,
            threshold: 30.0,
            baseline: avg,
            min_samples: None,
        },
    ]
}

// Default value functions
fn default_log_level() -> String { "info".to_string() }
fn default_poll_timeout() -> u64 { 30 }
fn default_warmup_floor() -> usize { 3 }
fn default_retention() -> RetentionPolicy {
    RetentionPolicy::Count { max_samples: 12 }
}
