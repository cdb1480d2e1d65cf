use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::types::{ComparisonMode, Finding};

/// Render one pass's findings into a single alert report.
///
/// Returns `None` for an empty finding set, which suppresses delivery.
/// Output is byte-identical for identical input.
pub fn render(findings: &[Finding], timestamp: DateTime<Utc>) -> Option<String> {
    if findings.is_empty() {
        return None;
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "ANOMALY DETECTED {}",
        timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    );

    for finding in findings {
        let _ = writeln!(out);
        match finding.horizon_hours {
            Some(hours) => {
                let _ = writeln!(out, "{} ({}h window)", finding.label, hours);
            }
            None => {
                let _ = writeln!(out, "{}", finding.label);
            }
        }
        let _ = writeln!(out, "  current:   {:.4}", finding.current);
        let _ = writeln!(out, "  baseline:  {:.4}", finding.baseline);
        match finding.mode {
            ComparisonMode::Percent => {
                let _ = writeln!(out, "  deviation: {:+.2}%", finding.deviation);
            }
            ComparisonMode::Points => {
                let _ = writeln!(out, "  deviation: {:+.2} pts", finding.deviation);
            }
        }
    }

    Some(out)
}
