use crate::geometry::BoundingBox;
use crate::types::Region;
use geo::algorithm::contains::Contains;
use geo::Point;
use rstar::{RTree, RTreeObject, AABB};

// Wrapper so the R-tree holds region positions rather than geometry clones.
pub struct RegionEnvelope {
    index: usize,
    bbox: BoundingBox,
}

impl RTreeObject for RegionEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bbox.min_lng, self.bbox.min_lat],
            [self.bbox.max_lng, self.bbox.max_lat],
        )
    }
}

/// Spatial index over the bounding boxes of a region slice. Regions without
/// coordinates are left out. Positions refer to the slice it was built from.
pub struct RegionIndex {
    tree: RTree<RegionEnvelope>,
    boxes: Vec<Option<BoundingBox>>,
}

impl RegionIndex {
    pub fn build(regions: &[Region]) -> Self {
        let boxes: Vec<Option<BoundingBox>> =
            regions.iter().map(|r| BoundingBox::of(&r.geometry)).collect();

        let items: Vec<RegionEnvelope> = boxes
            .iter()
            .enumerate()
            .filter_map(|(index, bbox)| bbox.map(|bbox| RegionEnvelope { index, bbox }))
            .collect();

        Self {
            tree: RTree::bulk_load(items),
            boxes,
        }
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn bbox(&self, index: usize) -> Option<BoundingBox> {
        self.boxes.get(index).copied().flatten()
    }

    /// Every `(i, j)`, `i < j`, whose boxes are not separated by more than
    /// `tolerance`, in canonical order.
    pub fn candidate_pairs(&self, tolerance: f64) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for (i, bbox) in self.boxes.iter().enumerate() {
            let Some(bbox) = bbox else { continue };
            let grown = AABB::from_corners(
                [bbox.min_lng - tolerance, bbox.min_lat - tolerance],
                [bbox.max_lng + tolerance, bbox.max_lat + tolerance],
            );
            let mut neighbours: Vec<usize> = self
                .tree
                .locate_in_envelope_intersecting(&grown)
                .map(|item| item.index)
                .filter(|&j| j > i)
                .collect();
            neighbours.sort_unstable();
            pairs.extend(neighbours.into_iter().map(|j| (i, j)));
        }
        pairs
    }

    /// Position of the first region containing the point. `regions` must be
    /// the slice the index was built from.
    pub fn locate(&self, regions: &[Region], lng: f64, lat: f64) -> Option<usize> {
        let point = Point::new(lng, lat);
        let mut hits: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&AABB::from_point([lng, lat]))
            .map(|item| item.index)
            .filter(|&i| regions.get(i).is_some_and(|r| r.geometry.contains(&point)))
            .collect();
        hits.sort_unstable();
        hits.first().copied()
    }
}
