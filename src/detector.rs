use chrono::{DateTime, Utc};

use crate::baseline;
use crate::config::{BaselineMode, DetectorConfig, MetricRule};
use crate::history::HistoryStore;
use crate::types::{ComparisonMode, Finding, MetricSample, MetricSnapshot};

/// Compares each metric in the current snapshot against its baseline and
/// collects findings for every rule whose threshold is met.
pub struct Detector {
    rules: Vec<MetricRule>,
    warmup_floor: usize,
}

impl Detector {
    pub fn new(config: &DetectorConfig, rules: &[MetricRule]) -> Self {
        Self {
            rules: rules.to_vec(),
            warmup_floor: config.warmup_floor,
        }
    }

    /// One detection pass over an already-recorded snapshot.
    ///
    /// Rules run in declaration order. A metric absent from the snapshot is
    /// never evaluated this round, regardless of its history.
    pub fn detect(&self, snapshot: &MetricSnapshot, history: &HistoryStore) -> Vec<Finding> {
        if history.snapshots_recorded() < self.warmup_floor {
            return Vec::new();
        }

        let mut findings = Vec::new();
        for rule in &self.rules {
            let Some(current) = snapshot.get(rule.metric) else { continue };
            let series = history.series_for(rule.metric);
            if let Some(finding) = evaluate_rule(rule, current, series, snapshot.timestamp) {
                findings.push(finding);
            }
        }
        findings
    }
}

fn evaluate_rule(
    rule: &MetricRule,
    current: f64,
    series: &[MetricSample],
    now: DateTime<Utc>,
) -> Option<Finding> {
    match &rule.baseline {
        BaselineMode::TimeWindowAverage { horizons_hours } => {
            let mut horizons = horizons_hours.clone();
            horizons.sort_unstable();
            // Smallest qualifying horizon wins; larger ones are not consulted.
            for horizon in horizons {
                let reference =
                    baseline::time_window_average(series, horizon, now, rule.min_samples);
                let Some(reference) = reference else { continue };
                let Some(deviation) = deviation(rule.comparison, current, reference) else {
                    continue;
                };
                if deviation.abs() >= rule.threshold {
                    return Some(make_finding(rule, Some(horizon), current, reference, deviation));
                }
            }
            None
        }
        BaselineMode::FixedCountAverage { window } => {
            let reference = baseline::fixed_count_average(series, *window)?;
            let deviation = deviation(rule.comparison, current, reference)?;
            (deviation.abs() >= rule.threshold)
                .then(|| make_finding(rule, None, current, reference, deviation))
        }
        BaselineMode::PreviousSample => {
            let reference = baseline::previous_sample(series)?;
            let deviation = deviation(rule.comparison, current, reference)?;
            (deviation.abs() >= rule.threshold)
                .then(|| make_finding(rule, None, current, reference, deviation))
        }
    }
}

/// Signed deviation under the rule's comparison mode. A zero baseline under
/// percent comparison yields `None`: skip, never a division fault.
fn deviation(mode: ComparisonMode, current: f64, reference: f64) -> Option<f64> {
    match mode {
        ComparisonMode::Percent => {
            if reference == 0.0 {
                return None;
            }
            Some((current - reference) / reference * 100.0)
        }
        ComparisonMode::Points => Some(current - reference),
    }
}

fn make_finding(
    rule: &MetricRule,
    horizon_hours: Option<u32>,
    current: f64,
    reference: f64,
    deviation: f64,
) -> Finding {
    Finding {
        metric: rule.metric,
        label: rule.label.clone(),
        horizon_hours,
        current,
        baseline: reference,
        deviation,
        mode: rule.comparison,
    }
}
