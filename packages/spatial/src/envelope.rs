//! Working envelope over a batch of buildings.
//!
//! The envelope bounds the parcel prefetch. Padding is applied once when
//! the envelope is finished, never per building, so large batches do not
//! grow the search area by `n * margin`.

use building_address_models::Feature;
use rstar::Envelope as _;

use crate::{Envelope, feature_envelope, pad};

/// Accumulates the union of feature envelopes.
#[derive(Debug, Clone)]
pub struct EnvelopeAccumulator {
    padding: f64,
    envelope: Option<Envelope>,
}

impl EnvelopeAccumulator {
    /// Creates an empty accumulator. Negative or non-finite padding is
    /// treated as zero.
    #[must_use]
    pub fn new(padding: f64) -> Self {
        let padding = if padding.is_finite() && padding > 0.0 {
            padding
        } else {
            0.0
        };
        Self {
            padding,
            envelope: None,
        }
    }

    /// Extends the envelope to cover `feature`. Features without
    /// vertices are ignored.
    pub fn add(&mut self, feature: &Feature) {
        let Some(env) = feature_envelope(feature) else {
            log::debug!("Feature {} has no vertices, not extending envelope", feature.id);
            return;
        };
        self.envelope = Some(match self.envelope {
            Some(current) => current.merged(&env),
            None => env,
        });
    }

    /// The padded envelope, or `None` if nothing was added.
    #[must_use]
    pub fn finish(&self) -> Option<Envelope> {
        self.envelope.map(|env| pad(&env, self.padding))
    }
}

/// Padded envelope of all `features`.
#[must_use]
pub fn working_envelope<'a>(
    features: impl IntoIterator<Item = &'a Feature>,
    padding: f64,
) -> Option<Envelope> {
    let mut acc = EnvelopeAccumulator::new(padding);
    for feature in features {
        acc.add(feature);
    }
    acc.finish()
}

/// Returns `true` if `outer` fully contains `inner`.
#[must_use]
pub fn contains(outer: &Envelope, inner: &Envelope) -> bool {
    outer.contains_envelope(inner)
}
