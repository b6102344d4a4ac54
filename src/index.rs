use crate::{Feature, FeatureId};
use geo::{BoundingRect, GeoFloat};
use geo_types::Rect;
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{RTree, AABB};

type Entry<T> = GeomWithData<Rectangle<[T; 2]>, FeatureId>;

/// Bounding-box index over a feature set.
///
/// Built once per run and never mutated afterwards; queries are a broad
/// phase only and may return false positives, so callers must re-test every
/// candidate with an exact predicate.
pub struct SpatialIndex<T: GeoFloat> {
    tree: RTree<Entry<T>>,
}

impl<T: GeoFloat> SpatialIndex<T> {
    pub fn build(features: &[Feature<T>]) -> Self {
        let entries = features
            .iter()
            .filter_map(|feature| {
                let bounds = feature.geometry.bounding_rect()?;
                Some(GeomWithData::new(to_rectangle(&bounds), feature.id))
            })
            .collect();
        SpatialIndex {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Ids of every feature whose bounding box intersects `bounds`, in no
    /// particular order.
    pub fn query<'a>(&'a self, bounds: &Rect<T>) -> impl Iterator<Item = FeatureId> + 'a {
        let envelope = AABB::from_corners(
            [bounds.min().x, bounds.min().y],
            [bounds.max().x, bounds.max().y],
        );
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| entry.data)
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

fn to_rectangle<T: GeoFloat>(bounds: &Rect<T>) -> Rectangle<[T; 2]> {
    Rectangle::from_corners(
        [bounds.min().x, bounds.min().y],
        [bounds.max().x, bounds.max().y],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{coord, polygon, Area};
    use geo_types::MultiPolygon;
    use itertools::Itertools;

    fn feature(id: FeatureId, min_x: f64, min_y: f64) -> Feature<f64> {
        let geometry = MultiPolygon::new(vec![polygon![
            (x: min_x, y: min_y),
            (x: min_x + 1., y: min_y),
            (x: min_x + 1., y: min_y + 1.),
            (x: min_x, y: min_y + 1.),
            (x: min_x, y: min_y),
        ]]);
        let area = geometry.unsigned_area();
        Feature { id, geometry, area }
    }

    #[test]
    fn query_returns_box_intersecting_ids() {
        let features = vec![feature(0, 0., 0.), feature(1, 0.5, 0.), feature(7, 10., 10.)];
        let index = SpatialIndex::build(&features);
        let hits = index
            .query(&Rect::new(
                coord! { x: 0., y: 0. },
                coord! { x: 1., y: 1. },
            ))
            .sorted()
            .collect_vec();
        assert_eq!(hits, vec![0, 1]);
    }

    #[test]
    fn query_misses_disjoint_boxes() {
        let features = vec![feature(0, 0., 0.), feature(1, 10., 10.)];
        let index = SpatialIndex::build(&features);
        let hits = index
            .query(&Rect::new(
                coord! { x: 4., y: 4. },
                coord! { x: 5., y: 5. },
            ))
            .collect_vec();
        assert!(hits.is_empty());
    }

    #[test]
    fn holds_one_entry_per_feature() {
        let features = vec![feature(0, 0., 0.), feature(1, 2., 2.)];
        assert_eq!(SpatialIndex::build(&features).len(), 2);
    }
}
