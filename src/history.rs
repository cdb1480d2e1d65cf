use std::collections::HashMap;

use chrono::Duration;

use crate::config::{HistoryConfig, RetentionPolicy};
use crate::types::{MetricId, MetricSample, MetricSnapshot};

/// Per-metric bounded time series. Owned exclusively by the store; detection
/// code only ever sees read-only slices.
#[derive(Default)]
struct MetricSeries {
    samples: Vec<MetricSample>,
}

impl MetricSeries {
    fn push(&mut self, sample: MetricSample) {
        self.samples.push(sample);
    }

    fn evict(&mut self, policy: &RetentionPolicy, now: chrono::DateTime<chrono::Utc>) {
        match policy {
            RetentionPolicy::Count { max_samples } => {
                if self.samples.len() > *max_samples {
                    let excess = self.samples.len() - max_samples;
                    self.samples.drain(..excess);
                }
            }
            RetentionPolicy::Age { max_hours } => {
                let cutoff = now - Duration::hours(*max_hours as i64);
                let stale = self
                    .samples
                    .iter()
                    .take_while(|s| s.timestamp < cutoff)
                    .count();
                if stale > 0 {
                    self.samples.drain(..stale);
                }
            }
        }
    }
}

/// Bounded in-memory history for every observed metric.
///
/// Series are created lazily on first observation and live for the process
/// lifetime. Single-writer: `record` commits before any detection pass reads,
/// so no internal locking is needed.
pub struct HistoryStore {
    retention: RetentionPolicy,
    series: HashMap<MetricId, MetricSeries>,
    snapshots_recorded: usize,
}

impl HistoryStore {
    pub fn new(config: &HistoryConfig) -> Self {
        Self {
            retention: config.retention.clone(),
            series: HashMap::new(),
            snapshots_recorded: 0,
        }
    }

    /// Append every metric present in the snapshot, then enforce retention.
    pub fn record(&mut self, snapshot: &MetricSnapshot) {
        for (metric, value) in &snapshot.values {
            let series = self.series.entry(*metric).or_default();
            series.push(MetricSample { timestamp: snapshot.timestamp, value: *value });
            series.evict(&self.retention, snapshot.timestamp);
        }
        self.snapshots_recorded += 1;
    }

    /// Retained samples for a metric, oldest first. Empty if never observed.
    pub fn series_for(&self, metric: MetricId) -> &[MetricSample] {
        self.series.get(&metric).map(|s| s.samples.as_slice()).unwrap_or(&[])
    }

    /// Total snapshots recorded since startup (warm-up floor input)
    pub fn snapshots_recorded(&self) -> usize {
        self.snapshots_recorded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn snap_at(secs: i64, value: f64) -> MetricSnapshot {
        let mut snap = MetricSnapshot::new(Utc.timestamp_opt(secs, 0).unwrap());
        snap.set(MetricId::Price, value);
        snap
    }

    #[test]
    fn count_bound_drops_oldest_beyond_capacity() {
        let config = HistoryConfig {
            retention: RetentionPolicy::Count { max_samples: 3 },
        };
        let mut store = HistoryStore::new(&config);
        for i in 0..5 {
            store.record(&snap_at(i * 300, i as f64));
        }
        let series = store.series_for(MetricId::Price);
        assert_eq!(series.len(), 3);
        let values: Vec<f64> = series.iter().map(|s| s.value).collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn age_bound_evicts_stale_entries_from_front() {
        let config = HistoryConfig {
            retention: RetentionPolicy::Age { max_hours: 1 },
        };
        let mut store = HistoryStore::new(&config);
        store.record(&snap_at(0, 1.0));
        store.record(&snap_at(1800, 2.0));
        // 2h later: both earlier samples fall outside the window
        store.record(&snap_at(7200, 3.0));
        let series = store.series_for(MetricId::Price);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].value, 3.0);
    }

    #[test]
    fn series_created_lazily_and_reads_are_ordered() {
        let config = HistoryConfig::default();
        let mut store = HistoryStore::new(&config);
        assert!(store.series_for(MetricId::FundingRate).is_empty());

        store.record(&snap_at(0, 10.0));
        store.record(&snap_at(300, 20.0));
        let series = store.series_for(MetricId::Price);
        assert!(series.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert!(store.series_for(MetricId::FundingRate).is_empty());
    }

    #[test]
    fn counts_snapshots_not_samples() {
        let config = HistoryConfig::default();
        let mut store = HistoryStore::new(&config);
        let mut snap = MetricSnapshot::new(Utc.timestamp_opt(0, 0).unwrap());
        snap.set(MetricId::Price, 1.0);
        snap.set(MetricId::OpenInterest, 2.0);
        store.record(&snap);
        assert_eq!(store.snapshots_recorded(), 1);
    }
}
