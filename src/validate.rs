//! The coloring validator: checks a partial color assignment against the
//! adjacency relation.

use crate::adjacency::Adjacency;
use crate::index::RegionIndex;
use crate::types::{ColorAssignment, Region, ValidationReport, Violation};
use tracing::{debug, warn};

/// Canonical enumeration of unordered index pairs `(i, j)` with `i < j`.
pub fn unordered_pairs(n: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..n).flat_map(move |i| (i + 1..n).map(move |j| (i, j)))
}

pub fn validate<A>(regions: &[Region], coloring: &ColorAssignment, oracle: &A) -> ValidationReport
where
    A: Adjacency + ?Sized,
{
    check_pairs(regions, coloring, oracle, unordered_pairs(regions.len()))
}

/// Same report as [`validate`], visiting only pairs whose boxes the index
/// says are within the tolerance.
pub fn validate_indexed<A>(
    regions: &[Region],
    coloring: &ColorAssignment,
    oracle: &A,
    index: &RegionIndex,
    tolerance: f64,
) -> ValidationReport
where
    A: Adjacency + ?Sized,
{
    check_pairs(regions, coloring, oracle, index.candidate_pairs(tolerance).into_iter())
}

fn check_pairs<A, I>(
    regions: &[Region],
    coloring: &ColorAssignment,
    oracle: &A,
    pairs: I,
) -> ValidationReport
where
    A: Adjacency + ?Sized,
    I: Iterator<Item = (usize, usize)>,
{
    let colors: Vec<_> = regions.iter().map(|r| coloring.color_of(&r.id)).collect();
    let unpainted_count = colors.iter().filter(|c| c.is_none()).count();

    let mut violations = Vec::new();
    for (i, j) in pairs {
        let (Some(ci), Some(cj)) = (colors[i], colors[j]) else {
            continue;
        };
        if ci != cj {
            continue;
        }

        let (a, b) = (&regions[i], &regions[j]);
        match oracle.adjacent(a, b) {
            Ok(true) => violations.push(Violation {
                first: a.id.clone(),
                second: b.id.clone(),
            }),
            Ok(false) => {}
            Err(e) => warn!(a = %a.id, b = %b.id, error = %e, "adjacency check failed, pair skipped"),
        }
    }

    debug!(
        regions = regions.len(),
        unpainted = unpainted_count,
        violations = violations.len(),
        "validation pass complete"
    );

    ValidationReport {
        unpainted_count,
        violations,
    }
}
