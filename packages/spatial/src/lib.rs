#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geometry side of building address enrichment.
//!
//! Accumulates the working envelope of a batch of buildings, matches each
//! building to the parcel that encloses (or best overlaps) it, and finds
//! the municipal boundary a building sits in. Envelopes are
//! [`rstar::AABB`]s so they can be fed straight into an R-tree search.

pub mod envelope;
pub mod matcher;
pub mod municipality;

use building_address_models::Feature;
use geo::BoundingRect;
use rstar::AABB;

pub use envelope::{EnvelopeAccumulator, working_envelope};
pub use matcher::{MatchOutcome, Relation, classify, match_parcel};
pub use municipality::MunicipalityResolver;

/// Two-dimensional axis-aligned envelope.
pub type Envelope = AABB<[f64; 2]>;

/// Compute the bounding box envelope of a feature's ring.
///
/// Returns `None` for a feature without vertices.
#[must_use]
pub fn feature_envelope(feature: &Feature) -> Option<Envelope> {
    feature
        .ring
        .bounding_rect()
        .map(|rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]))
}

/// Grow an envelope by `margin` on every side.
#[must_use]
pub fn pad(envelope: &Envelope, margin: f64) -> Envelope {
    let lower = envelope.lower();
    let upper = envelope.upper();
    AABB::from_corners(
        [lower[0] - margin, lower[1] - margin],
        [upper[0] + margin, upper[1] + margin],
    )
}
