//! Distance-annotated facility views.
//!
//! Every observer fix produces a fresh, fully sorted view; nothing here caches
//! distances across fixes. The free functions are pure. [`FacilityIndex`]
//! bundles them with the current facility set and the last observer.

use crate::{distance_km, AnnotatedFacility, Coordinate, Facility};
use std::cmp::Ordering;
use std::sync::Arc;

/// Annotate facilities with their distance from `observer`.
///
/// The result is sorted ascending by distance; equal distances are ordered
/// by facility id so the same input always yields the same output.
///
/// # Example
/// ```
/// use pulsepoint_geo::{annotate, Coordinate, Facility};
///
/// let facilities = vec![
///     Facility::new("far", "Far Clinic", Coordinate::new(10.0, 78.2)),
///     Facility::new("near", "Near Clinic", Coordinate::new(9.93, 78.125)),
/// ];
///
/// let view = annotate(&facilities, &Coordinate::new(9.9252, 78.1198));
/// assert_eq!(view[0].facility.id.as_str(), "near");
/// ```
pub fn annotate(facilities: &[Facility], observer: &Coordinate) -> Vec<AnnotatedFacility> {
    let mut annotated = distances(facilities, observer);
    annotated.sort_by(compare);
    annotated
}

#[cfg(feature = "parallel")]
fn distances(facilities: &[Facility], observer: &Coordinate) -> Vec<AnnotatedFacility> {
    use rayon::prelude::*;
    facilities
        .par_iter()
        .map(|facility| annotate_one(facility, observer))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn distances(facilities: &[Facility], observer: &Coordinate) -> Vec<AnnotatedFacility> {
    facilities
        .iter()
        .map(|facility| annotate_one(facility, observer))
        .collect()
}

#[inline]
fn annotate_one(facility: &Facility, observer: &Coordinate) -> AnnotatedFacility {
    AnnotatedFacility {
        facility: facility.clone(),
        distance_km: distance_km(observer, &facility.coordinate),
    }
}

fn compare(a: &AnnotatedFacility, b: &AnnotatedFacility) -> Ordering {
    a.distance_km
        .total_cmp(&b.distance_km)
        .then_with(|| a.facility.id.cmp(&b.facility.id))
}

/// Keep the facilities within `radius_km` (inclusive), preserving order.
pub fn filter_by_radius(annotated: &[AnnotatedFacility], radius_km: f64) -> Vec<AnnotatedFacility> {
    annotated
        .iter()
        .filter(|a| a.distance_km <= radius_km)
        .cloned()
        .collect()
}

/// Number of facilities within `radius_km` (inclusive).
pub fn count_within(annotated: &[AnnotatedFacility], radius_km: f64) -> usize {
    annotated.iter().filter(|a| a.distance_km <= radius_km).count()
}

/// First facility whose name contains `query`, ignoring case.
///
/// On a sorted view this is the nearest match. A blank query or no match
/// gives `None`.
pub fn find_by_name_substring<'a>(
    annotated: &'a [AnnotatedFacility],
    query: &str,
) -> Option<&'a AnnotatedFacility> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    annotated
        .iter()
        .find(|a| a.facility.name.to_lowercase().contains(&needle))
}

/// The known facility set plus its view against the latest observer fix.
///
/// The view is rebuilt into a new `Arc` on every refresh, so readers holding
/// an older view keep a consistent snapshot.
#[derive(Debug, Clone)]
pub struct FacilityIndex {
    facilities: Vec<Facility>,
    observer: Option<Coordinate>,
    view: Arc<[AnnotatedFacility]>,
}

impl Default for FacilityIndex {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl FacilityIndex {
    /// Creates an index with no observer fix yet.
    pub fn new(facilities: Vec<Facility>) -> Self {
        Self {
            facilities,
            observer: None,
            view: Arc::from(Vec::new()),
        }
    }

    /// Re-annotate every facility against a new observer fix.
    pub fn refresh(&mut self, observer: Coordinate) -> Arc<[AnnotatedFacility]> {
        self.observer = Some(observer);
        self.view = Arc::from(annotate(&self.facilities, &observer));
        Arc::clone(&self.view)
    }

    /// Swap the facility set, re-annotating against the last fix if any.
    pub fn replace_facilities(&mut self, facilities: Vec<Facility>) -> Arc<[AnnotatedFacility]> {
        self.facilities = facilities;
        match self.observer {
            Some(observer) => self.refresh(observer),
            None => Arc::clone(&self.view),
        }
    }

    /// The current sorted view.
    pub fn view(&self) -> Arc<[AnnotatedFacility]> {
        Arc::clone(&self.view)
    }

    /// The fix the current view was computed against.
    pub fn observer(&self) -> Option<Coordinate> {
        self.observer
    }

    /// The unannotated facility set.
    pub fn facilities(&self) -> &[Facility] {
        &self.facilities
    }

    /// Nearest facility whose name contains `query`.
    pub fn find(&self, query: &str) -> Option<AnnotatedFacility> {
        find_by_name_substring(&self.view, query).cloned()
    }

    /// Number of known facilities.
    pub fn len(&self) -> usize {
        self.facilities.len()
    }

    /// Whether the facility set is empty.
    pub fn is_empty(&self) -> bool {
        self.facilities.is_empty()
    }
}
