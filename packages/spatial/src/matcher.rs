//! Building-to-parcel matching.
//!
//! A parcel that fully encloses the building footprint is authoritative
//! and wins immediately. Parcel layers are rarely clean, though, so when
//! no parcel encloses the building the parcel whose centroid lies nearest
//! the building's centroid among the overlapping ones is taken instead.

use building_address_models::Feature;
use geo::{Centroid, Distance, Euclidean, Polygon, Relate};

/// Relation of a building polygon to a candidate parcel polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Building lies entirely inside the parcel (shared edges allowed).
    Contained,
    /// Interiors overlap without the parcel enclosing the building.
    Crossing,
    /// No interior overlap; touching along an edge counts as disjoint.
    Disjoint,
}

/// Classifies `building` against `parcel`.
#[must_use]
pub fn classify(building: &Polygon<f64>, parcel: &Polygon<f64>) -> Relation {
    let matrix = building.relate(parcel);
    if matrix.is_within() {
        Relation::Contained
    } else if matrix.is_overlaps() || matrix.is_contains() {
        Relation::Crossing
    } else {
        Relation::Disjoint
    }
}

/// Result of matching one building against its candidate parcels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchOutcome<'a> {
    /// First candidate that encloses the building.
    Contained(&'a Feature),
    /// Overlapping candidate with the nearest centroid.
    Nearest {
        /// Selected parcel.
        parcel: &'a Feature,
        /// Centroid-to-centroid distance in coordinate units.
        distance: f64,
    },
    /// No candidate encloses or overlaps the building.
    Unmatched,
}

impl<'a> MatchOutcome<'a> {
    /// The matched parcel, if any.
    #[must_use]
    pub const fn parcel(&self) -> Option<&'a Feature> {
        match *self {
            Self::Contained(parcel) | Self::Nearest { parcel, .. } => Some(parcel),
            Self::Unmatched => None,
        }
    }
}

/// Selects the parcel for `building` among `candidates`.
///
/// Candidates are evaluated in the given order: the first enclosing
/// parcel short-circuits, and among overlapping parcels an exact distance
/// tie keeps the earlier one. Candidates without a usable polygon are
/// skipped.
#[must_use]
pub fn match_parcel<'a>(building: &Feature, candidates: &[&'a Feature]) -> MatchOutcome<'a> {
    let Some(footprint) = building.polygon() else {
        log::debug!("Building {} has an open ring, nothing to match", building.id);
        return MatchOutcome::Unmatched;
    };
    let Some(center) = footprint.centroid() else {
        return MatchOutcome::Unmatched;
    };

    let mut nearest: Option<(&'a Feature, f64)> = None;

    for &candidate in candidates {
        let Some(area) = candidate.polygon() else {
            continue;
        };

        match classify(&footprint, &area) {
            Relation::Contained => return MatchOutcome::Contained(candidate),
            Relation::Crossing => {
                let Some(candidate_center) = area.centroid() else {
                    continue;
                };
                let distance = Euclidean.distance(center, candidate_center);
                match nearest {
                    Some((_, best)) if distance >= best => {}
                    _ => nearest = Some((candidate, distance)),
                }
            }
            Relation::Disjoint => {}
        }
    }

    nearest.map_or(MatchOutcome::Unmatched, |(parcel, distance)| {
        log::debug!(
            "Building {} is not enclosed by any parcel, using overlapping parcel {} ({distance:.6} away)",
            building.id,
            parcel.id
        );
        MatchOutcome::Nearest { parcel, distance }
    })
}
