use crate::{Feature, FeatureId};
use geo::{Area, BooleanOps, GeoFloat, HasDimensions};
use geo_types::MultiPolygon;
use rayon::prelude::*;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Outcome of the sanitation pass over a raw geometry set.
#[derive(Debug)]
pub struct Sanitized<T: GeoFloat> {
    /// Surviving features in record order, areas precomputed.
    pub features: Vec<Feature<T>>,
    /// Records that arrived without any geometry to speak of.
    pub dropped_empty: usize,
    /// Records the repair step could not salvage.
    pub dropped_unrepairable: usize,
}

impl<T: GeoFloat> Sanitized<T> {
    pub fn dropped(&self) -> usize {
        self.dropped_empty + self.dropped_unrepairable
    }

    /// Look a feature up by its record position.
    pub fn feature(&self, id: FeatureId) -> Option<&Feature<T>> {
        self.features
            .binary_search_by_key(&id, |feature| feature.id)
            .ok()
            .map(|at| &self.features[at])
    }
}

enum Outcome<T: GeoFloat> {
    Kept(Feature<T>),
    Empty,
    Unrepairable,
}

/// Drop empty geometries, repair the rest and precompute their areas.
///
/// Feature ids are the positions in the input vector, so dropped records
/// leave gaps rather than shifting everything after them.
pub fn sanitize<T>(geometries: Vec<MultiPolygon<T>>) -> Sanitized<T>
where
    T: GeoFloat + Send + Sync,
{
    let outcomes: Vec<Outcome<T>> = geometries
        .into_par_iter()
        .enumerate()
        .map(|(id, geometry)| {
            if geometry.is_empty() {
                return Outcome::Empty;
            }
            match repair(geometry) {
                Some(geometry) => {
                    let area = geometry.unsigned_area();
                    Outcome::Kept(Feature { id, geometry, area })
                }
                None => Outcome::Unrepairable,
            }
        })
        .collect();

    let mut sanitized = Sanitized {
        features: Vec::new(),
        dropped_empty: 0,
        dropped_unrepairable: 0,
    };
    for outcome in outcomes {
        match outcome {
            Outcome::Kept(feature) => sanitized.features.push(feature),
            Outcome::Empty => sanitized.dropped_empty += 1,
            Outcome::Unrepairable => sanitized.dropped_unrepairable += 1,
        }
    }
    sanitized
}

/// Re-node a geometry through a union with the empty multipolygon. This
/// rebuilds ring orientation and dissolves self-intersection artifacts
/// without moving any coordinates, the same job `buffer(0)` does in other
/// geometry stacks.
///
/// The boolean pipeline panics on rings it cannot interpret; a panic here is
/// an unrepairable geometry, not the end of the run.
fn repair<T: GeoFloat>(geometry: MultiPolygon<T>) -> Option<MultiPolygon<T>> {
    let repaired = catch_unwind(AssertUnwindSafe(|| {
        geometry.union(&MultiPolygon::new(Vec::new()))
    }))
    .ok()?;
    (!repaired.is_empty()).then_some(repaired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn unit_square() -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: 0., y: 0.),
            (x: 1., y: 0.),
            (x: 1., y: 1.),
            (x: 0., y: 1.),
            (x: 0., y: 0.),
        ]])
    }

    #[test]
    fn drops_empty_geometries_and_keeps_ids() {
        let input = vec![MultiPolygon::new(Vec::new()), unit_square()];
        let sanitized = sanitize(input);
        assert_eq!(sanitized.dropped_empty, 1);
        assert_eq!(sanitized.dropped_unrepairable, 0);
        assert_eq!(sanitized.features.len(), 1);
        // The survivor keeps its original record position.
        assert_eq!(sanitized.features[0].id, 1);
    }

    #[test]
    fn precomputes_areas() {
        let sanitized = sanitize(vec![unit_square()]);
        assert_eq!(sanitized.features[0].area, 1.0);
    }

    #[test]
    fn repair_preserves_valid_geometry() {
        let sanitized = sanitize(vec![unit_square()]);
        assert_eq!(sanitized.features[0].geometry.unsigned_area(), 1.0);
    }

    #[test]
    fn self_intersecting_ring_does_not_crash_the_pass() {
        // A bow-tie ring crossing itself at (1, 1); every record is either
        // repaired or counted as dropped, and the valid square survives.
        let bow_tie = MultiPolygon::new(vec![polygon![
            (x: 0., y: 0.),
            (x: 2., y: 2.),
            (x: 2., y: 0.),
            (x: 0., y: 2.),
            (x: 0., y: 0.),
        ]]);
        let sanitized = sanitize(vec![bow_tie, unit_square()]);
        assert_eq!(sanitized.features.len() + sanitized.dropped(), 2);
        assert!(sanitized.feature(1).is_some());
    }

    #[test]
    fn feature_lookup_skips_gaps() {
        let input = vec![MultiPolygon::new(Vec::new()), unit_square()];
        let sanitized = sanitize(input);
        assert!(sanitized.feature(0).is_none());
        assert_eq!(sanitized.feature(1).map(|feature| feature.id), Some(1));
    }
}
