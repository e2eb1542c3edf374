//! Bounding boxes and the exact "do these shapes share a point" predicate.

use geo::bounding_rect::BoundingRect;
use geo::coordinate_position::CoordPos;
use geo::dimensions::Dimensions;
use geo::intersects::Intersects;
use geo::relate::Relate;
use geo::{Coord, Geometry, LineString, MultiPolygon, Polygon};
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("unsupported geometry type: {0}")]
    Unsupported(&'static str),
    #[error("geometry contains non-finite coordinates")]
    NonFinite,
    #[error("geometry has no polygon parts")]
    Empty,
    #[error("geometric predicate failed: {0}")]
    Engine(String),
}

/// Axis-aligned extent in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_lng: f64,
    pub max_lng: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    fn at(c: Coord<f64>) -> Self {
        Self {
            min_lng: c.x,
            max_lng: c.x,
            min_lat: c.y,
            max_lat: c.y,
        }
    }

    fn extend(&mut self, c: Coord<f64>) {
        self.min_lng = self.min_lng.min(c.x);
        self.max_lng = self.max_lng.max(c.x);
        self.min_lat = self.min_lat.min(c.y);
        self.max_lat = self.max_lat.max(c.y);
    }

    /// Scans every coordinate of the geometry. `None` if there are none.
    pub fn of(geometry: &Geometry<f64>) -> Option<Self> {
        let mut bbox: Option<BoundingBox> = None;
        for_each_coord(geometry, &mut |c| match bbox.as_mut() {
            Some(b) => b.extend(c),
            None => bbox = Some(BoundingBox::at(c)),
        });
        bbox
    }

    /// True when the boxes are more than `tolerance` apart along either axis.
    pub fn separated_from(&self, other: &BoundingBox, tolerance: f64) -> bool {
        self.max_lng + tolerance < other.min_lng
            || other.max_lng + tolerance < self.min_lng
            || self.max_lat + tolerance < other.min_lat
            || other.max_lat + tolerance < self.min_lat
    }
}

/// Visits every coordinate of the tagged geometry tree, recursing through
/// polygons, multipolygons and collections.
pub fn for_each_coord<F: FnMut(Coord<f64>)>(geometry: &Geometry<f64>, f: &mut F) {
    match geometry {
        Geometry::Point(p) => f(p.0),
        Geometry::MultiPoint(mp) => mp.iter().for_each(|p| f(p.0)),
        Geometry::Line(l) => {
            f(l.start);
            f(l.end);
        }
        Geometry::LineString(ring) => ring_coords(ring, f),
        Geometry::MultiLineString(mls) => mls.iter().for_each(|ring| ring_coords(ring, f)),
        Geometry::Polygon(p) => polygon_coords(p, f),
        Geometry::MultiPolygon(mp) => mp.iter().for_each(|p| polygon_coords(p, f)),
        Geometry::Rect(r) => polygon_coords(&r.to_polygon(), f),
        Geometry::Triangle(t) => t.to_array().into_iter().for_each(|c| f(c)),
        Geometry::GeometryCollection(gc) => gc.iter().for_each(|g| for_each_coord(g, f)),
    }
}

fn ring_coords<F: FnMut(Coord<f64>)>(ring: &LineString<f64>, f: &mut F) {
    ring.0.iter().for_each(|c| f(*c));
}

fn polygon_coords<F: FnMut(Coord<f64>)>(polygon: &Polygon<f64>, f: &mut F) {
    ring_coords(polygon.exterior(), f);
    polygon.interiors().iter().for_each(|ring| ring_coords(ring, f));
}

pub fn kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

/// The constituent polygons of an areal geometry.
fn parts(geometry: &Geometry<f64>) -> Result<&[Polygon<f64>], GeometryError> {
    let parts = match geometry {
        Geometry::Polygon(p) => std::slice::from_ref(p),
        Geometry::MultiPolygon(mp) => mp.0.as_slice(),
        other => return Err(GeometryError::Unsupported(kind(other))),
    };
    if parts.is_empty() {
        return Err(GeometryError::Empty);
    }
    let mut finite = true;
    for p in parts {
        polygon_coords(p, &mut |c: Coord<f64>| finite &= c.x.is_finite() && c.y.is_finite());
    }
    if !finite {
        return Err(GeometryError::NonFinite);
    }
    Ok(parts)
}

fn guarded<T>(f: impl FnOnce() -> T) -> Result<T, GeometryError> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        GeometryError::Engine(message)
    })
}

/// Inclusive intersection test: true if the two geometries share any point,
/// on the boundary or in the interior. Multipolygons count as the union of
/// their parts.
pub fn shares_any_point(a: &Geometry<f64>, b: &Geometry<f64>) -> Result<bool, GeometryError> {
    let a_parts = parts(a)?;
    let b_parts = parts(b)?;

    guarded(|| {
        a_parts.iter().any(|pa| {
            let Some(ra) = pa.bounding_rect() else {
                return false;
            };
            b_parts.iter().any(|pb| match pb.bounding_rect() {
                Some(rb) => ra.intersects(&rb) && pa.intersects(pb),
                None => false,
            })
        })
    })
}

/// DE-9IM based classification of how two areal geometries meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Relation {
    /// Boundaries meet but interiors do not.
    pub touches: bool,
    /// Interiors overlap and neither contains the other.
    pub overlaps: bool,
    pub intersects: bool,
}

pub fn relation(a: &Geometry<f64>, b: &Geometry<f64>) -> Result<Relation, GeometryError> {
    let a = MultiPolygon::new(parts(a)?.to_vec());
    let b = MultiPolygon::new(parts(b)?.to_vec());

    guarded(|| {
        let matrix = a.relate(&b);
        let interiors = matrix.get(CoordPos::Inside, CoordPos::Inside);
        let intersects = matrix.is_intersects();
        Relation {
            touches: intersects && interiors == Dimensions::Empty,
            overlaps: interiors == Dimensions::TwoDimensional
                && matrix.get(CoordPos::Inside, CoordPos::Outside) != Dimensions::Empty
                && matrix.get(CoordPos::Outside, CoordPos::Inside) != Dimensions::Empty,
            intersects,
        }
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use geo::{polygon, GeometryCollection, Point};

    pub(crate) fn square(x: f64, y: f64, size: f64) -> Polygon<f64> {
        polygon![
            (x: x, y: y),
            (x: x + size, y: y),
            (x: x + size, y: y + size),
            (x: x, y: y + size),
            (x: x, y: y),
        ]
    }

    #[test]
    fn test_bbox_walks_every_multipolygon_part() {
        let mp = MultiPolygon::new(vec![square(0.0, 0.0, 1.0), square(5.0, -3.0, 2.0)]);
        let bbox = BoundingBox::of(&Geometry::MultiPolygon(mp)).unwrap();
        assert_eq!(bbox.min_lng, 0.0);
        assert_eq!(bbox.max_lng, 7.0);
        assert_eq!(bbox.min_lat, -3.0);
        assert_eq!(bbox.max_lat, 1.0);
    }

    #[test]
    fn test_bbox_of_empty_geometry_is_none() {
        let empty = Geometry::GeometryCollection(GeometryCollection::default());
        assert!(BoundingBox::of(&empty).is_none());
        assert!(BoundingBox::of(&Geometry::MultiPolygon(MultiPolygon::new(vec![]))).is_none());
    }

    #[test]
    fn test_separation_respects_tolerance() {
        let a = BoundingBox::of(&square(0.0, 0.0, 1.0).into()).unwrap();
        let near = BoundingBox::of(&square(1.005, 0.0, 1.0).into()).unwrap();
        let far = BoundingBox::of(&square(1.5, 0.0, 1.0).into()).unwrap();

        assert!(!a.separated_from(&near, 0.01));
        assert!(a.separated_from(&near, 0.001));
        assert!(a.separated_from(&far, 0.01));
        assert!(far.separated_from(&a, 0.01));
    }

    #[test]
    fn test_shared_edge_counts_as_shared_point() {
        let a = square(0.0, 0.0, 1.0).into();
        let b = square(1.0, 0.0, 1.0).into();
        assert_eq!(shares_any_point(&a, &b), Ok(true));
    }

    #[test]
    fn test_overlap_counts_as_shared_point() {
        let a = square(0.0, 0.0, 1.0).into();
        let b = square(0.9, 0.0, 1.0).into();
        assert_eq!(shares_any_point(&a, &b), Ok(true));
    }

    #[test]
    fn test_micro_gap_is_disjoint() {
        let a = square(0.0, 0.0, 1.0).into();
        let b = square(1.001, 0.0, 1.0).into();
        assert_eq!(shares_any_point(&a, &b), Ok(false));
    }

    #[test]
    fn test_unsupported_and_non_finite_geometry_are_errors() {
        let point: Geometry<f64> = Point::new(0.0, 0.0).into();
        let sq: Geometry<f64> = square(0.0, 0.0, 1.0).into();
        assert_eq!(
            shares_any_point(&point, &sq),
            Err(GeometryError::Unsupported("Point"))
        );

        let broken: Geometry<f64> = square(f64::NAN, 0.0, 1.0).into();
        assert_eq!(shares_any_point(&sq, &broken), Err(GeometryError::NonFinite));

        let empty = Geometry::MultiPolygon(MultiPolygon::new(vec![]));
        assert_eq!(shares_any_point(&empty, &sq), Err(GeometryError::Empty));
    }

    #[test]
    fn test_engine_panic_becomes_error() {
        assert_eq!(
            guarded(|| -> bool { panic!("boom") }),
            Err(GeometryError::Engine("boom".to_string()))
        );
        let code = 7;
        assert_eq!(
            guarded(|| -> bool { panic!("ring {} is invalid", code) }),
            Err(GeometryError::Engine("ring 7 is invalid".to_string()))
        );
        assert_eq!(guarded(|| 42), Ok(42));
    }

    #[test]
    fn test_relation_distinguishes_touch_from_overlap() {
        let a: Geometry<f64> = square(0.0, 0.0, 1.0).into();
        let touching: Geometry<f64> = square(1.0, 0.0, 1.0).into();
        let overlapping: Geometry<f64> = square(0.5, 0.5, 1.0).into();

        let r = relation(&a, &touching).unwrap();
        assert!(r.touches && r.intersects && !r.overlaps);

        let r = relation(&a, &overlapping).unwrap();
        assert!(!r.touches && r.intersects && r.overlaps);
    }
}
