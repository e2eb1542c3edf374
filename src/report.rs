//! Human-readable rendering of a validation report.

use crate::types::ValidationReport;
use std::fmt::Write;

pub const DEFAULT_SHOWN_VIOLATIONS: usize = 3;

/// `label` is the plural noun for the dataset's regions ("countries", "wards").
/// Only the first `limit` violations are listed.
pub fn summary(report: &ValidationReport, label: &str, limit: usize) -> String {
    let mut out = String::new();

    if report.unpainted_count > 0 {
        let _ = writeln!(out, "Unpainted: {} {}", report.unpainted_count, label);
    }

    if report.violations.is_empty() {
        let _ = write!(out, "✓ No adjacent {} share a color", label);
        return out;
    }

    let _ = write!(out, "✗ Adjacent {} share a color:", label);
    for v in report.violations.iter().take(limit) {
        let _ = write!(out, "\n{} and {}", v.first, v.second);
    }
    if report.violations.len() > limit {
        let _ = write!(out, "\n...and {} more", report.violations.len() - limit);
    }
    out
}
