use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::detector::Detector;
use crate::extractor::Extractor;
use crate::history::HistoryStore;
use crate::report;

/// The snapshot-processing pipeline: extract, record, detect, render.
///
/// Constructor-injected and owned by the caller; holds no global state, so
/// isolated instances can coexist (tests run one per case). Processing is
/// run-to-completion per snapshot, and history is committed before detection
/// runs, so a failed delivery downstream can never corrupt or roll back the
/// recorded series.
pub struct Engine {
    extractor: Extractor,
    history: HistoryStore,
    detector: Detector,
}

impl Engine {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            extractor: Extractor::new()?,
            history: HistoryStore::new(&config.history),
            detector: Detector::new(&config.detector, &config.metrics),
        })
    }

    /// Process one raw message. Returns the rendered alert report when any
    /// finding fired, `None` otherwise (including for unparseable input).
    pub fn ingest(&mut self, raw: &str) -> Option<String> {
        self.ingest_at(raw, Utc::now())
    }

    /// Timestamp-injecting variant; window math keys off sample timestamps.
    pub fn ingest_at(&mut self, raw: &str, now: DateTime<Utc>) -> Option<String> {
        let snapshot = self.extractor.extract(raw, now);
        if snapshot.is_empty() {
            tracing::debug!("No metric fields extracted, snapshot dropped");
            return None;
        }

        self.history.record(&snapshot);
        tracing::debug!(
            fields = snapshot.values.len(),
            total = self.history.snapshots_recorded(),
            "Snapshot recorded"
        );

        let findings = self.detector.detect(&snapshot, &self.history);
        if !findings.is_empty() {
            tracing::info!(count = findings.len(), "Anomalies detected");
        }
        report::render(&findings, snapshot.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn empty_snapshot_is_a_no_op() {
        let config: Config = toml::from_str("").unwrap();
        let mut engine = Engine::new(&config).unwrap();
        let ts = Utc.timestamp_opt(0, 0).unwrap();
        assert_eq!(engine.ingest_at("nothing numeric here", ts), None);
        // warm-up floor untouched: three real snapshots still needed
        for i in 1..=3 {
            let ts = Utc.timestamp_opt(i * 300, 0).unwrap();
            let _ = engine.ingest_at("$ 100.00", ts);
        }
        let ts = Utc.timestamp_opt(1500, 0).unwrap();
        let report = engine.ingest_at("$ 200.00", ts);
        assert!(report.is_some());
    }
}
