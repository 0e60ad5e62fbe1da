#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Feature datasets the enrichment pipeline reads from.
//!
//! [`FeatureSource`] is the query surface the pipeline depends on: a
//! predicate query (see [`predicate`]) and a bounding-box search.
//! [`FeatureStore`] is the in-memory implementation, holding features in
//! insertion order next to an R-tree of their envelopes.

pub mod predicate;

use building_address_models::{Feature, FeatureKind};
use building_address_spatial::{Envelope, feature_envelope};
use rstar::{RTree, RTreeObject};

pub use predicate::{CompiledPredicate, Predicate};

/// Errors from parsing or evaluating a predicate.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// Predicate text was empty.
    #[error("Empty predicate")]
    Empty,

    /// Predicate text is malformed.
    #[error("Syntax error at offset {offset}: {message}")]
    Syntax {
        /// Byte offset into the predicate text.
        offset: usize,
        /// What was expected.
        message: String,
    },

    /// `type:` named an unknown feature kind.
    #[error("Unknown feature type: {0}")]
    UnknownType(String),

    /// A `~` pattern is not a valid regex.
    #[error("Invalid pattern for '{key}': {source}")]
    Pattern {
        /// Tag key the pattern applies to.
        key: String,
        /// Regex compilation error.
        source: regex::Error,
    },
}

/// A dataset that can be queried by predicate and by area.
///
/// Both methods return features in a stable order: repeated calls with
/// the same arguments return the same sequence.
pub trait FeatureSource {
    /// Features matching `predicate`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] if the predicate cannot be compiled.
    fn query(&self, predicate: &Predicate) -> Result<Vec<&Feature>, QueryError>;

    /// Features whose bounding box intersects `envelope`.
    fn search(&self, envelope: &Envelope) -> Vec<&Feature>;
}

/// A feature's envelope stored in the R-tree, pointing back at its
/// position in the store.
struct EnvelopeEntry {
    index: usize,
    envelope: Envelope,
}

impl RTreeObject for EnvelopeEntry {
    type Envelope = Envelope;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// In-memory [`FeatureSource`].
pub struct FeatureStore {
    features: Vec<Feature>,
    tree: RTree<EnvelopeEntry>,
}

impl FeatureStore {
    /// Indexes `features`, keeping their order for query results.
    #[must_use]
    pub fn new(features: Vec<Feature>) -> Self {
        let entries: Vec<EnvelopeEntry> = features
            .iter()
            .enumerate()
            .filter_map(|(index, feature)| {
                let Some(envelope) = feature_envelope(feature) else {
                    log::warn!("Feature {} has no vertices, not spatially indexed", feature.id);
                    return None;
                };
                Some(EnvelopeEntry { index, envelope })
            })
            .collect();

        log::debug!(
            "Indexed {} of {} features into feature store",
            entries.len(),
            features.len()
        );

        Self {
            features,
            tree: RTree::bulk_load(entries),
        }
    }

    /// Number of features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns `true` if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Count of features per kind, for logging.
    #[must_use]
    pub fn count_kind(&self, kind: FeatureKind) -> usize {
        self.features.iter().filter(|f| f.kind == kind).count()
    }
}

impl FeatureSource for FeatureStore {
    fn query(&self, predicate: &Predicate) -> Result<Vec<&Feature>, QueryError> {
        let compiled = predicate.compile()?;
        let matches: Vec<&Feature> = self
            .features
            .iter()
            .filter(|f| compiled.matches(f))
            .collect();
        log::trace!("Query `{predicate}` matched {} features", matches.len());
        Ok(matches)
    }

    fn search(&self, envelope: &Envelope) -> Vec<&Feature> {
        let mut indices: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(envelope)
            .map(|entry| entry.index)
            .collect();
        indices.sort_unstable();
        indices.into_iter().map(|i| &self.features[i]).collect()
    }
}
