//! The adjacency oracle: decides whether two regions are geographic neighbours.
//!
//! Each stage is a cheap reject before the next one:
//! 1. bounding boxes further apart than the tolerance are never adjacent;
//! 2. otherwise the inclusive exact test decides (shared boundary *or* overlap,
//!    since source borders are imprecise and often overlap by a sliver);
//! 3. if the exact test cannot be evaluated, box proximity counts as adjacency.

use crate::geometry::{self, BoundingBox, GeometryError};
use crate::types::Region;
use anyhow::Result;
use serde::Serialize;
use tracing::{debug, warn};

/// Degrees of latitude/longitude.
pub const DEFAULT_TOLERANCE: f64 = 0.01;

/// Anything that can answer "are these two regions neighbours".
pub trait Adjacency {
    fn adjacent(&self, a: &Region, b: &Region) -> Result<bool>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Assessment {
    /// One of the regions has no coordinates at all.
    NoExtent,
    SeparatedBoxes,
    Intersecting,
    Disjoint,
    /// Exact test unavailable; boxes were within tolerance.
    Fallback { reason: String },
}

impl Assessment {
    pub fn is_adjacent(&self) -> bool {
        matches!(self, Assessment::Intersecting | Assessment::Fallback { .. })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GeometricOracle {
    tolerance: f64,
}

impl Default for GeometricOracle {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

impl GeometricOracle {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn assess(&self, a: &Region, b: &Region) -> Assessment {
        let (Some(box_a), Some(box_b)) = (
            BoundingBox::of(&a.geometry),
            BoundingBox::of(&b.geometry),
        ) else {
            return Assessment::NoExtent;
        };

        if box_a.separated_from(&box_b, self.tolerance) {
            return Assessment::SeparatedBoxes;
        }

        match geometry::shares_any_point(&a.geometry, &b.geometry) {
            Ok(true) => Assessment::Intersecting,
            Ok(false) => Assessment::Disjoint,
            Err(e) => {
                warn!(a = %a.id, b = %b.id, error = %e, "exact adjacency test failed, using bounding boxes");
                e.into()
            }
        }
    }

    /// Total and symmetric; never panics for any pair of geometries.
    pub fn is_adjacent(&self, a: &Region, b: &Region) -> bool {
        let assessment = self.assess(a, b);
        debug!(a = %a.id, b = %b.id, ?assessment, "adjacency");
        assessment.is_adjacent()
    }
}

impl Adjacency for GeometricOracle {
    fn adjacent(&self, a: &Region, b: &Region) -> Result<bool> {
        Ok(self.is_adjacent(a, b))
    }
}

/// Convenience for the default tolerance.
pub fn is_adjacent(a: &Region, b: &Region) -> bool {
    GeometricOracle::default().is_adjacent(a, b)
}

impl From<GeometryError> for Assessment {
    fn from(e: GeometryError) -> Self {
        Assessment::Fallback {
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::tests::square;
    use geo::{Geometry, GeometryCollection, LineString, MultiPolygon, Point};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn region(id: &str, geometry: impl Into<Geometry<f64>>) -> Region {
        Region::new(id, geometry)
    }

    #[test]
    fn test_shared_edge_is_adjacent() {
        let a = region("A", square(0.0, 0.0, 1.0));
        let b = region("B", square(1.0, 0.0, 1.0));
        assert_eq!(GeometricOracle::default().assess(&a, &b), Assessment::Intersecting);
        assert!(is_adjacent(&a, &b));
    }

    #[test]
    fn test_one_degree_gap_is_rejected_by_boxes() {
        let a = region("A", square(0.0, 0.0, 1.0));
        let b = region("B", square(2.0, 0.0, 1.0));
        assert_eq!(GeometricOracle::default().assess(&a, &b), Assessment::SeparatedBoxes);
        assert!(!is_adjacent(&a, &b));
    }

    #[test]
    fn test_gap_within_tolerance_still_needs_exact_contact() {
        let a = region("A", square(0.0, 0.0, 1.0));
        let b = region("B", square(1.005, 0.0, 1.0));
        assert_eq!(GeometricOracle::default().assess(&a, &b), Assessment::Disjoint);
    }

    #[test]
    fn test_multipolygon_part_touching_neighbour() {
        let islands = MultiPolygon::new(vec![square(10.0, 10.0, 1.0), square(0.0, 0.0, 1.0)]);
        let a = region("Islands", islands);
        let b = region("Mainland", square(0.0, 1.0, 1.0));
        assert!(is_adjacent(&a, &b));
        assert!(is_adjacent(&b, &a));
    }

    #[test]
    fn test_unsupported_geometry_falls_back_to_boxes() {
        let line = LineString::from(vec![(1.0, 0.0), (1.0, 1.0)]);
        let a = region("A", square(0.0, 0.0, 1.0));
        let b = region("Line", line);

        let assessment = GeometricOracle::default().assess(&a, &b);
        assert!(matches!(assessment, Assessment::Fallback { .. }));
        assert!(assessment.is_adjacent());
    }

    #[test]
    fn test_far_unsupported_geometry_never_reaches_exact_test() {
        // Would fall back to "adjacent" if the exact stage were consulted.
        let a = region("A", square(0.0, 0.0, 1.0));
        let b = region("Point", Point::new(50.0, 50.0));
        assert_eq!(GeometricOracle::default().assess(&a, &b), Assessment::SeparatedBoxes);
    }

    #[test]
    fn test_region_without_coordinates_is_never_adjacent() {
        let a = region("A", square(0.0, 0.0, 1.0));
        let empty = region(
            "Nowhere",
            Geometry::GeometryCollection(GeometryCollection::default()),
        );
        assert_eq!(GeometricOracle::default().assess(&a, &empty), Assessment::NoExtent);
        assert!(!is_adjacent(&empty, &a));
    }

    #[test]
    fn test_non_finite_coordinates_do_not_panic() {
        let a = region("A", square(0.0, 0.0, 1.0));
        let b = region("B", square(0.5, f64::NAN, 1.0));
        let _ = GeometricOracle::default().is_adjacent(&a, &b);
        let _ = GeometricOracle::default().is_adjacent(&b, &a);
    }

    #[test]
    fn test_adjacency_is_symmetric_on_random_squares() {
        let mut rng = StdRng::seed_from_u64(7);
        let oracle = GeometricOracle::default();
        let regions: Vec<Region> = (0..40)
            .map(|i| {
                // Snap to a coarse grid so exact edge contact actually happens.
                let x = rng.gen_range(0..20) as f64 * 0.5;
                let y = rng.gen_range(0..20) as f64 * 0.5;
                let size = rng.gen_range(1..4) as f64 * 0.5;
                region(&format!("R{i}"), square(x, y, size))
            })
            .collect();

        for (i, a) in regions.iter().enumerate() {
            for b in &regions[i + 1..] {
                assert_eq!(
                    oracle.is_adjacent(a, b),
                    oracle.is_adjacent(b, a),
                    "{} / {}",
                    a.id,
                    b.id
                );
            }
        }
    }
}
