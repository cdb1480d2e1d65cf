use anyhow::Result;
use chrono::{DateTime, Utc};
use regex::Regex;

use crate::types::{MetricId, MetricSnapshot};

/// Pulls metric values out of raw snapshot text.
///
/// Each metric has its own pattern; a field that fails to parse is simply
/// omitted from the snapshot, never an error and never a silent 0.0.
pub struct Extractor {
    patterns: Vec<MetricPattern>,
}

struct MetricPattern {
    metric: MetricId,
    regex: Regex,
}

impl Extractor {
    pub fn new() -> Result<Self> {
        let patterns = vec![
            MetricPattern {
                metric: MetricId::Price,
                regex: Regex::new(r"\$\s*([\d,]+(?:\.\d+)?)")?,
            },
            MetricPattern {
                metric: MetricId::OpenInterest,
                regex: Regex::new(r"(?i)Open Interest\s+([\d.,]+[KMB]?)")?,
            },
            MetricPattern {
                metric: MetricId::FundingRate,
                regex: Regex::new(r"(?i)Funding Rate\s+(-?[\d.]+)\s*%")?,
            },
            MetricPattern {
                metric: MetricId::LongRatio,
                regex: Regex::new(r"(?i)LONG\s*:\s*([\d.]+)\s*%")?,
            },
            MetricPattern {
                metric: MetricId::ShortRatio,
                regex: Regex::new(r"(?i)SHORT\s*:\s*([\d.]+)\s*%")?,
            },
            MetricPattern {
                metric: MetricId::TakerBuy,
                regex: Regex::new(r"(?i)Buy\s*\+\s*([\d.,]+[KMB]?)")?,
            },
            MetricPattern {
                metric: MetricId::TakerSell,
                regex: Regex::new(r"(?i)Sell\s*\+\s*([\d.,]+[KMB]?)")?,
            },
        ];

        Ok(Self { patterns })
    }

    /// Extract whatever fields are present. Never fails the caller; an empty
    /// snapshot means nothing usable was found and must not reach history.
    pub fn extract(&self, text: &str, timestamp: DateTime<Utc>) -> MetricSnapshot {
        let mut snapshot = MetricSnapshot::new(timestamp);

        for pattern in &self.patterns {
            let Some(caps) = pattern.regex.captures(text) else { continue };
            let Some(token) = caps.get(1) else { continue };
            match parse_value(token.as_str()) {
                Some(value) => snapshot.set(pattern.metric, value),
                None => {
                    tracing::debug!(
                        metric = %pattern.metric,
                        token = token.as_str(),
                        "Unparseable value token, field omitted"
                    );
                }
            }
        }

        snapshot
    }
}

/// Parse a numeric token: thousands separators stripped, case-insensitive
/// K/M/B magnitude suffix honored. A token with no recognizable numeral is
/// absent, not zero.
fn parse_value(token: &str) -> Option<f64> {
    let cleaned = token.trim().replace(',', "");
    let (numeral, multiplier) = match cleaned.chars().last() {
        Some(c) if c.eq_ignore_ascii_case(&'k') => (&cleaned[..cleaned.len() - 1], 1e3),
        Some(c) if c.eq_ignore_ascii_case(&'m') => (&cleaned[..cleaned.len() - 1], 1e6),
        Some(c) if c.eq_ignore_ascii_case(&'b') => (&cleaned[..cleaned.len() - 1], 1e9),
        _ => (cleaned.as_str(), 1.0),
    };
    let value: f64 = numeral.trim().parse().ok()?;
    Some(value * multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
BTC Perpetual
$ 42,150.25
Open Interest 85,420.50 BTC
Funding Rate 0.0125 %
LONG : 52.30%
SHORT : 47.70%
Taker Volume Buy +1,250.75 Sell +980.20";

    fn extractor() -> Extractor {
        Extractor::new().unwrap()
    }

    #[test]
    fn extracts_all_fields_from_full_message() {
        let snap = extractor().extract(SAMPLE, Utc::now());
        assert_eq!(snap.get(MetricId::Price), Some(42150.25));
        assert_eq!(snap.get(MetricId::OpenInterest), Some(85420.50));
        assert_eq!(snap.get(MetricId::FundingRate), Some(0.0125));
        assert_eq!(snap.get(MetricId::LongRatio), Some(52.30));
        assert_eq!(snap.get(MetricId::ShortRatio), Some(47.70));
        assert_eq!(snap.get(MetricId::TakerBuy), Some(1250.75));
        assert_eq!(snap.get(MetricId::TakerSell), Some(980.20));
    }

    #[test]
    fn partial_message_yields_sparse_snapshot() {
        let snap = extractor().extract("$ 100.00 and nothing else", Utc::now());
        assert_eq!(snap.get(MetricId::Price), Some(100.0));
        assert_eq!(snap.get(MetricId::OpenInterest), None);
        assert_eq!(snap.values.len(), 1);
    }

    #[test]
    fn unrelated_text_yields_empty_snapshot() {
        let snap = extractor().extract("good morning traders", Utc::now());
        assert!(snap.is_empty());
    }

    #[test]
    fn magnitude_suffixes_normalize() {
        assert_eq!(parse_value("12.5K"), Some(12_500.0));
        assert_eq!(parse_value("3M"), Some(3_000_000.0));
        assert_eq!(parse_value("1.2b"), Some(1_200_000_000.0));
        assert_eq!(parse_value("7k"), Some(7_000.0));
    }

    #[test]
    fn thousands_separators_stripped() {
        assert_eq!(parse_value("1,234,567.89"), Some(1_234_567.89));
    }

    #[test]
    fn bare_suffix_is_absent_not_zero() {
        // A suffix with no numeral must read as absent; a spurious 0.0 sample
        // would poison percent-deviation baselines.
        assert_eq!(parse_value("K"), None);
        assert_eq!(parse_value(""), None);
        let snap = extractor().extract("Open Interest ,, BTC", Utc::now());
        assert_eq!(snap.get(MetricId::OpenInterest), None);
    }
}
