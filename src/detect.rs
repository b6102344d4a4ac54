use crate::index::SpatialIndex;
use crate::progress::Progress;
use crate::util::polygonal_area;
use crate::{Feature, FeatureId};
use anyhow::{ensure, Result};
use geo::{BooleanOps, BoundingRect, GeoFloat, Intersects};
use itertools::Itertools;
use rayon::prelude::*;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Overlap share above which a pair qualifies.
///
/// Callers supply a percentage; the comparison uses the fraction. The
/// comparison is strict, so a pair sitting exactly on the threshold does
/// not qualify.
#[derive(Clone, Copy, Debug)]
pub struct Threshold<T: GeoFloat = f64> {
    percent: T,
    fraction: T,
}

impl<T: GeoFloat> Threshold<T> {
    /// Percent must be a finite number in `[0, 100]`.
    pub fn from_percent(percent: T) -> Result<Self> {
        let hundred = T::from(100).expect("100 fits in any float");
        ensure!(
            percent.is_finite() && percent >= T::zero() && percent <= hundred,
            "overlap percentage must be a number between 0 and 100"
        );
        Ok(Threshold {
            percent,
            fraction: percent / hundred,
        })
    }

    pub fn percent(&self) -> T {
        self.percent
    }

    pub fn fraction(&self) -> T {
        self.fraction
    }
}

/// One qualifying directed pair: `subject` overlaps `other` by more than
/// the threshold share of `subject`'s own area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct OverlapPair {
    pub subject: FeatureId,
    pub other: FeatureId,
}

/// What a run produces: the flagged feature ids, deduplicated and in record
/// order, and every qualifying pair behind them.
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct OverlapReport {
    pub flagged: Vec<FeatureId>,
    pub pairs: Vec<OverlapPair>,
}

/// One run's worth of state: the sanitized features, the bounding-box index
/// built over them, and the configured threshold.
pub struct OverlapDetector<'a, T: GeoFloat = f64> {
    features: &'a [Feature<T>],
    index: SpatialIndex<T>,
    threshold: Threshold<T>,
}

impl<'a, T: GeoFloat + Send + Sync> OverlapDetector<'a, T> {
    /// Builds the index over `features`, which must be in ascending id
    /// order (as [`sanitize`](crate::sanitize::sanitize) returns them).
    pub fn new(features: &'a [Feature<T>], threshold: Threshold<T>) -> Self {
        let index = SpatialIndex::build(features);
        OverlapDetector {
            features,
            index,
            threshold,
        }
    }

    fn feature(&self, id: FeatureId) -> Option<&'a Feature<T>> {
        self.features
            .binary_search_by_key(&id, |feature| feature.id)
            .ok()
            .map(|at| &self.features[at])
    }

    /// Features that could overlap `subject`: bounding boxes intersect and
    /// the exact predicate agrees. The subject itself is never a candidate.
    fn candidates(&self, subject: &Feature<T>) -> Vec<&'a Feature<T>> {
        let Some(bounds) = subject.geometry.bounding_rect() else {
            return Vec::new();
        };
        self.index
            .query(&bounds)
            .filter(|&id| id != subject.id)
            .filter_map(|id| self.feature(id))
            .filter(|other| subject.geometry.intersects(&other.geometry))
            .collect()
    }

    /// Evaluate every candidate against `subject` and keep the qualifying
    /// pairs. The test is directional: the intersection area is measured
    /// against `subject`'s area alone, so the reverse pair stands or falls
    /// on its own when `other` takes its turn as subject.
    fn evaluate(&self, subject: &Feature<T>) -> Vec<OverlapPair> {
        if subject.area <= T::zero() {
            // No well defined overlap share; never a match, never a fault.
            return Vec::new();
        }
        self.candidates(subject)
            .into_iter()
            .filter_map(|other| {
                let intersection = subject.geometry.intersection(&other.geometry);
                // Sums every polygonal part; point or line contact surfaces
                // as an empty result and contributes nothing.
                let area = polygonal_area(&intersection);
                (area / subject.area > self.threshold.fraction()).then_some(OverlapPair {
                    subject: subject.id,
                    other: other.id,
                })
            })
            .collect()
    }

    /// Run the full pass: every feature takes a turn as subject, with a
    /// progress bump after each one, and the merged results come back as a
    /// deterministic report.
    ///
    /// Subjects are evaluated in parallel; the index is read-only and the
    /// reporter sits behind a mutex, so reported percentages never regress.
    /// The cancel flag is checked at the loop boundary, and a cancelled run
    /// yields an error rather than a partial report.
    pub fn run<F>(&self, on_progress: F, cancel: Option<&AtomicBool>) -> Result<OverlapReport>
    where
        F: FnMut(u8) + Send,
    {
        let progress = Mutex::new(Progress::new(self.features.len(), on_progress));
        let mut pairs: Vec<OverlapPair> = self
            .features
            .par_iter()
            .flat_map_iter(|subject| {
                if cancelled(cancel) {
                    return Vec::new().into_iter();
                }
                let qualifying = self.evaluate(subject);
                progress.lock().expect("progress reporter poisoned").bump();
                qualifying.into_iter()
            })
            .collect();
        ensure!(!cancelled(cancel), "overlap detection was cancelled");

        pairs.sort_unstable_by_key(|pair| (pair.subject, pair.other));
        // Ascending id order is record order, and a subject flagged by
        // several neighbors appears once.
        let flagged = pairs.iter().map(|pair| pair.subject).dedup().collect_vec();
        Ok(OverlapReport { flagged, pairs })
    }

    /// The features a report flags, in record order.
    pub fn flagged_features(&self, report: &OverlapReport) -> Vec<&'a Feature<T>> {
        report
            .flagged
            .iter()
            .filter_map(|&id| self.feature(id))
            .collect()
    }
}

fn cancelled(flag: Option<&AtomicBool>) -> bool {
    flag.map_or(false, |flag| flag.load(Ordering::Relaxed))
}
