//! Municipality lookup by bounding-box containment.
//!
//! Boundaries are compared by their bounding boxes only: a boundary
//! qualifies when its box contains the building's (or the whole working
//! area's) box. This misattributes buildings near a municipal line, where
//! neighbouring boxes overlap and the first listed boundary wins.

use building_address_models::{BoundaryView, Feature};

use crate::envelope::contains;
use crate::{Envelope, feature_envelope};

struct BoundaryEntry<'a> {
    name: &'a str,
    envelope: Envelope,
}

/// Resolves city names from municipal boundary features.
pub struct MunicipalityResolver<'a> {
    boundaries: Vec<BoundaryEntry<'a>>,
}

impl<'a> MunicipalityResolver<'a> {
    /// Builds a resolver from boundary features, keeping input order.
    ///
    /// Features that are not boundaries, have no `name`, or have no
    /// vertices are skipped.
    #[must_use]
    pub fn new(boundaries: impl IntoIterator<Item = &'a Feature>) -> Self {
        let boundaries: Vec<BoundaryEntry<'a>> = boundaries
            .into_iter()
            .filter_map(|feature| {
                let view = BoundaryView::try_from(feature).ok()?;
                let Some(name) = view.name() else {
                    log::warn!("Boundary {} has no name, ignoring", feature.id);
                    return None;
                };
                let envelope = feature_envelope(feature)?;
                Some(BoundaryEntry { name, envelope })
            })
            .collect();

        log::debug!("Loaded {} municipal boundaries", boundaries.len());

        Self { boundaries }
    }

    /// Returns `true` if no usable boundary was loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    /// Name of the first boundary whose box contains `envelope`.
    #[must_use]
    pub fn resolve_envelope(&self, envelope: &Envelope) -> Option<&'a str> {
        self.boundaries
            .iter()
            .find(|b| contains(&b.envelope, envelope))
            .map(|b| b.name)
    }

    /// Name of the first boundary whose box contains the building's box.
    #[must_use]
    pub fn resolve(&self, building: &Feature) -> Option<&'a str> {
        let envelope = feature_envelope(building)?;
        self.resolve_envelope(&envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::rect;
    use building_address_models::FeatureKind;

    fn boundary(id: &str, name: Option<&str>, bounds: (f64, f64, f64, f64)) -> Feature {
        let mut f = rect(id, FeatureKind::AdminBoundary, bounds);
        f.tags.insert("admin_level".to_string(), "8".to_string());
        if let Some(name) = name {
            f.tags.insert("name".to_string(), name.to_string());
        }
        f
    }

    #[test]
    fn resolves_first_containing_boundary() {
        let boundaries = [
            boundary("r1", Some("Thiensville"), (0.0, 0.0, 1.0, 1.0)),
            boundary("r2", Some("Mequon"), (0.0, 0.0, 10.0, 10.0)),
            boundary("r3", Some("Cedarburg"), (0.0, 0.0, 20.0, 20.0)),
        ];
        let resolver = MunicipalityResolver::new(&boundaries);

        let building = rect("w1", FeatureKind::Building, (5.0, 5.0, 6.0, 6.0));
        assert_eq!(resolver.resolve(&building), Some("Mequon"));
    }

    #[test]
    fn straddling_building_is_unresolved() {
        let boundaries = [boundary("r1", Some("Mequon"), (0.0, 0.0, 10.0, 10.0))];
        let resolver = MunicipalityResolver::new(&boundaries);

        let building = rect("w1", FeatureKind::Building, (9.5, 9.5, 10.5, 10.5));
        assert_eq!(resolver.resolve(&building), None);
    }

    #[test]
    fn skips_unnamed_and_non_boundary_features() {
        let features = [
            boundary("r1", None, (0.0, 0.0, 10.0, 10.0)),
            rect("p1", FeatureKind::Parcel, (0.0, 0.0, 10.0, 10.0)),
        ];
        let resolver = MunicipalityResolver::new(&features);
        assert!(resolver.is_empty());
    }
}
