//! R-tree over stored coordinates.
//!
//! The tree holds `[lng, lat]` points tagged with the entity id. A radius query
//! walks the conservative envelope boxes, then keeps only candidates whose
//! haversine distance is within the radius.

use rstar::primitives::GeomWithData;
use rstar::{RTree, AABB};

use super::entity::EntityId;
use crate::geometry::{envelope, haversine, Coordinate};

type IndexedPoint = GeomWithData<[f64; 2], EntityId>;

pub struct SpatialIndex {
    tree: RTree<IndexedPoint>,
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    pub fn bulk_load(points: impl IntoIterator<Item = (EntityId, Coordinate)>) -> Self {
        let points = points
            .into_iter()
            .map(|(id, c)| IndexedPoint::new(c.into(), id))
            .collect();
        Self {
            tree: RTree::bulk_load(points),
        }
    }

    pub fn insert(&mut self, id: EntityId, location: Coordinate) {
        self.tree.insert(IndexedPoint::new(location.into(), id));
    }

    /// Returns false if no entry with this id sits at `location`.
    pub fn remove(&mut self, id: EntityId, location: Coordinate) -> bool {
        self.tree
            .remove(&IndexedPoint::new(location.into(), id))
            .is_some()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids within `radius_m` of `center` with their distances, nearest first.
    /// Equal distances are ordered by ascending id.
    pub fn within(&self, center: Coordinate, radius_m: f64) -> Vec<(EntityId, f64)> {
        let mut hits: Vec<(EntityId, f64)> = envelope(center, radius_m)
            .into_iter()
            .flat_map(|b| {
                let aabb = AABB::from_corners([b.min_lng, b.min_lat], [b.max_lng, b.max_lat]);
                self.tree.locate_in_envelope(&aabb).collect::<Vec<_>>()
            })
            .filter_map(|p| {
                let [lng, lat] = *p.geom();
                let location = Coordinate::new(lng, lat).ok()?;
                let distance = haversine(center, location);
                (distance <= radius_m).then_some((p.data, distance))
            })
            .collect();

        // Boxes from a wrapped envelope share the antimeridian edge.
        hits.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        hits.dedup_by_key(|h| h.0);
        hits
    }
}
