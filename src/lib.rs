pub mod baseline;
pub mod config;
pub mod detector;
pub mod engine;
pub mod extractor;
pub mod feed;
pub mod history;
pub mod notifier;
pub mod report;

/// Common types used across modules
pub mod types {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use smallvec::SmallVec;

    /// Metric identifier
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum MetricId {
        Price,
        OpenInterest,
        FundingRate,
        LongRatio,
        ShortRatio,
        TakerBuy,
        TakerSell,
    }

    /// One parsed observation: zero or more metric values at a point in time.
    /// Fields absent from the source text are simply absent, never zeroed.
    #[derive(Debug, Clone)]
    pub struct MetricSnapshot {
        pub timestamp: DateTime<Utc>,
        pub values: SmallVec<[(MetricId, f64); 8]>,
    }

    impl MetricSnapshot {
        pub fn new(timestamp: DateTime<Utc>) -> Self {
            Self { timestamp, values: SmallVec::new() }
        }

        pub fn is_empty(&self) -> bool {
            self.values.is_empty()
        }

        pub fn get(&self, metric: MetricId) -> Option<f64> {
            self.values.iter().find(|(m, _)| *m == metric).map(|(_, v)| *v)
        }

        pub fn set(&mut self, metric: MetricId, value: f64) {
            self.values.push((metric, value));
        }
    }

    /// A single retained measurement in a metric's series
    #[derive(Debug, Clone, Copy, Serialize)]
    pub struct MetricSample {
        pub timestamp: DateTime<Utc>,
        pub value: f64,
    }

    /// How a current value is compared against its baseline
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ComparisonMode {
        /// Relative deviation in percent of the baseline
        Percent,
        /// Absolute delta in points (for ratio-type metrics)
        Points,
    }

    /// One detected deviation for one metric in one processing pass.
    /// Created and consumed within a single pass, never persisted.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Finding {
        pub metric: MetricId,
        pub label: String,
        /// Lookback horizon (hours) that fired, for time-windowed baselines
        pub horizon_hours: Option<u32>,
        pub current: f64,
        pub baseline: f64,
        /// Signed deviation: percent or points, per `mode`
        pub deviation: f64,
        pub mode: ComparisonMode,
    }

    impl std::fmt::Display for MetricId {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            let s = match self {
                MetricId::Price => "price",
                MetricId::OpenInterest => "open_interest",
                MetricId::FundingRate => "funding_rate",
                MetricId::LongRatio => "long_ratio",
                MetricId::ShortRatio => "short_ratio",
                MetricId::TakerBuy => "taker_buy",
                MetricId::TakerSell => "taker_sell",
            };
            write!(f, "{}", s)
        }
    }
}
