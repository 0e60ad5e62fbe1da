//! Interfaces to the host that owns the building data.
//!
//! The pipeline never mutates features itself. It hands one [`TagChange`]
//! per building to a [`ChangeSink`] and replaces the host's
//! [`Selection`] with the touched buildings at the end of a run.
//! [`ChangeLog`] and [`SelectionSet`] are in-memory implementations.

use building_address_models::{Feature, FeatureId};

use crate::merge::TagChange;

/// Errors from recording a change.
#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    /// The change names a feature the host does not hold.
    #[error("Unknown feature {0}")]
    UnknownFeature(FeatureId),

    /// The host refused the change.
    #[error("Change to {id} rejected: {message}")]
    Rejected {
        /// Feature the change targeted.
        id: FeatureId,
        /// Reason given by the host.
        message: String,
    },
}

/// Records tag changes in the host's history.
pub trait ChangeSink {
    /// Records `change` as one logical edit.
    ///
    /// # Errors
    ///
    /// Returns [`CommitError`] if the host cannot record the change.
    fn commit(&mut self, change: TagChange) -> Result<(), CommitError>;
}

/// The host's active selection.
pub trait Selection {
    /// Currently selected features.
    fn selected(&self) -> Vec<FeatureId>;

    /// Deselects everything.
    fn clear(&mut self);

    /// Replaces the selection with `ids`.
    fn set(&mut self, ids: Vec<FeatureId>);
}

/// Ordered log of committed changes.
#[derive(Debug, Default, Clone)]
pub struct ChangeLog {
    changes: Vec<TagChange>,
}

impl ChangeLog {
    /// Creates an empty log.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            changes: Vec::new(),
        }
    }

    /// Number of committed changes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Returns `true` if nothing was committed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Applies every change to the matching feature in `features`.
    ///
    /// # Errors
    ///
    /// Returns [`CommitError::UnknownFeature`] if a change names a feature
    /// not in `features`. Changes before it have already been applied.
    pub fn apply_all(&self, features: &mut [Feature]) -> Result<(), CommitError> {
        for change in &self.changes {
            let feature = features
                .iter_mut()
                .find(|f| f.id == change.id)
                .ok_or_else(|| CommitError::UnknownFeature(change.id.clone()))?;
            change.apply_to(&mut feature.tags);
        }
        Ok(())
    }
}

impl ChangeSink for ChangeLog {
    fn commit(&mut self, change: TagChange) -> Result<(), CommitError> {
        log::trace!(
            "Commit {}: set {:?}, remove {:?}",
            change.id,
            change.set,
            change.remove
        );
        self.changes.push(change);
        Ok(())
    }
}

/// In-memory selection.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SelectionSet {
    ids: Vec<FeatureId>,
}

impl SelectionSet {
    /// Creates a selection of `ids`.
    #[must_use]
    pub const fn new(ids: Vec<FeatureId>) -> Self {
        Self { ids }
    }

    /// Selected ids in selection order.
    #[must_use]
    pub fn ids(&self) -> &[FeatureId] {
        &self.ids
    }

    /// Returns `true` if `id` is selected.
    #[must_use]
    pub fn contains(&self, id: &FeatureId) -> bool {
        self.ids.contains(id)
    }
}

impl Selection for SelectionSet {
    fn selected(&self) -> Vec<FeatureId> {
        self.ids.clone()
    }

    fn clear(&mut self) {
        self.ids.clear();
    }

    fn set(&mut self, ids: Vec<FeatureId>) {
        self.ids = ids;
    }
}
