//! Reference-value computations over a retained series.
//!
//! Baselines are recomputed on demand, never stored. `None` means the
//! baseline is unavailable this round and the metric is silently skipped.

use chrono::{DateTime, Duration, Utc};

use crate::types::MetricSample;

/// Value of the sample immediately preceding the just-recorded current one.
pub fn previous_sample(series: &[MetricSample]) -> Option<f64> {
    if series.len() < 2 {
        return None;
    }
    Some(series[series.len() - 2].value)
}

/// Mean of up to the last `window` retained samples.
///
/// The just-recorded current sample is part of the series at this point and
/// is included in the mean, biasing the baseline slightly toward the current
/// reading. Callers rely on that behavior; do not exclude it here.
pub fn fixed_count_average(series: &[MetricSample], window: usize) -> Option<f64> {
    if series.len() < 2 || window == 0 {
        return None;
    }
    let start = series.len().saturating_sub(window);
    let tail = &series[start..];
    Some(tail.iter().map(|s| s.value).sum::<f64>() / tail.len() as f64)
}

/// Mean of all samples within `horizon_hours` of `now`. Unavailable when
/// fewer than 2 samples qualify, or when a min-sample gate is configured and
/// the qualifying count falls below it.
pub fn time_window_average(
    series: &[MetricSample],
    horizon_hours: u32,
    now: DateTime<Utc>,
    min_samples: Option<usize>,
) -> Option<f64> {
    let cutoff = now - Duration::hours(horizon_hours as i64);
    let skip = series.iter().take_while(|s| s.timestamp < cutoff).count();
    let window = &series[skip..];

    let floor = min_samples.unwrap_or(0).max(2);
    if window.len() < floor {
        return None;
    }
    Some(window.iter().map(|s| s.value).sum::<f64>() / window.len() as f64)
}
