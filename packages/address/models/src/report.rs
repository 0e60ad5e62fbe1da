//! Per-building skip reasons and the end-of-run report.

use std::fmt;

use crate::FeatureId;

/// Why a building was left unenriched.
///
/// These never abort a run; they are collected into the [`RunReport`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    /// No candidate parcel contains or crosses the building.
    #[error("no parcel contains or crosses the building")]
    UnmatchedParcel,

    /// The matched parcel lacks the house number or street name an
    /// address is built from.
    #[error("parcel {parcel} has no site address")]
    MissingParcelAddress {
        /// Matched parcel.
        parcel: FeatureId,
    },

    /// The street-name cascade found no unique road.
    #[error("could not resolve street \"{street}\" of parcel {parcel} to a single road")]
    UnresolvedStreet {
        /// Matched parcel.
        parcel: FeatureId,
        /// Raw street components as recorded on the parcel.
        street: String,
    },

    /// No municipal boundary contains the building.
    #[error("no municipality boundary contains the building")]
    MunicipalityNotFound,
}

/// A skipped building and the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Skipped building.
    pub building: FeatureId,
    /// Why it was skipped.
    pub reason: SkipReason,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.building, self.reason)
    }
}

/// Outcome of a whole enrichment run.
///
/// `touched` and `untouched` are disjoint and both in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Number of selected buildings that were candidates for enrichment.
    pub eligible: usize,
    /// Buildings that received address tags.
    pub touched: Vec<FeatureId>,
    /// Eligible buildings that were skipped.
    pub untouched: Vec<FeatureId>,
    /// One entry per skipped building, in processing order.
    pub diagnostics: Vec<Diagnostic>,
}

impl RunReport {
    /// Creates an empty report for `eligible` candidate buildings.
    #[must_use]
    pub const fn new(eligible: usize) -> Self {
        Self {
            eligible,
            touched: Vec::new(),
            untouched: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Records a successfully enriched building.
    pub fn record_touched(&mut self, building: FeatureId) {
        self.touched.push(building);
    }

    /// Records a skipped building and its diagnostic.
    pub fn record_skipped(&mut self, building: FeatureId, reason: SkipReason) {
        self.untouched.push(building.clone());
        self.diagnostics.push(Diagnostic { building, reason });
    }

    /// Returns `true` when every eligible building was enriched.
    #[must_use]
    pub fn is_full_success(&self) -> bool {
        self.touched.len() == self.eligible
    }

    /// Builds the user-facing summary.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        if self.is_full_success() {
            RunSummary::FullSuccess {
                touched: self.touched.len(),
            }
        } else {
            RunSummary::PartialSuccess {
                touched: self.touched.len(),
                eligible: self.eligible,
                causes: self.diagnostics.iter().map(ToString::to_string).collect(),
            }
        }
    }
}

/// Single end-of-run notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunSummary {
    /// Every eligible building was enriched.
    FullSuccess {
        /// Number of enriched buildings.
        touched: usize,
    },
    /// Some buildings were skipped.
    PartialSuccess {
        /// Number of enriched buildings.
        touched: usize,
        /// Number of candidate buildings.
        eligible: usize,
        /// One line per skipped building.
        causes: Vec<String>,
    },
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FullSuccess { touched } => write!(f, "Updated all {touched} buildings"),
            Self::PartialSuccess {
                touched,
                eligible,
                causes,
            } => {
                write!(f, "Updated {touched} of {eligible} buildings")?;
                for cause in causes {
                    write!(f, "\n  - {cause}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_success_when_all_touched() {
        let mut report = RunReport::new(2);
        report.record_touched(FeatureId::from("w1"));
        report.record_touched(FeatureId::from("w2"));
        assert_eq!(report.summary(), RunSummary::FullSuccess { touched: 2 });
        assert_eq!(report.summary().to_string(), "Updated all 2 buildings");
    }

    #[test]
    fn partial_success_lists_every_cause() {
        let mut report = RunReport::new(3);
        report.record_touched(FeatureId::from("w1"));
        report.record_skipped(FeatureId::from("w2"), SkipReason::UnmatchedParcel);
        report.record_skipped(
            FeatureId::from("w3"),
            SkipReason::MissingParcelAddress {
                parcel: FeatureId::from("p9"),
            },
        );

        assert_eq!(report.untouched.len(), 2);
        assert_eq!(
            report.summary().to_string(),
            "Updated 1 of 3 buildings\n  \
             - w2: no parcel contains or crosses the building\n  \
             - w3: parcel p9 has no site address"
        );
    }
}
