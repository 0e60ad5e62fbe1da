//! Which selected features the pipeline enriches.

use building_address_models::Feature;

/// Why a selected feature is left out of a run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Ineligible {
    /// The ring is not closed, so there is no footprint.
    #[error("ring is not closed")]
    OpenRing,

    /// The feature carries a tag that marks it as something other than a
    /// building.
    #[error("has disqualifying tag '{0}'")]
    Disqualified(String),

    /// All address tags are already present.
    #[error("already has a complete address")]
    AlreadyAddressed,
}

/// Checks whether `feature` should be enriched.
///
/// # Errors
///
/// Returns the first [`Ineligible`] reason that applies.
pub fn check(feature: &Feature, disqualifying_tags: &[String]) -> Result<(), Ineligible> {
    if !feature.is_closed() {
        return Err(Ineligible::OpenRing);
    }
    if let Some(tag) = disqualifying_tags.iter().find(|t| feature.has_tag(t)) {
        return Err(Ineligible::Disqualified(tag.clone()));
    }
    if feature.has_complete_address() {
        return Err(Ineligible::AlreadyAddressed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use building_address_models::{FeatureKind, PipelineConfig, Tags};
    use geo::LineString;

    fn feature(closed: bool, tags: &[(&str, &str)]) -> Feature {
        let mut ring = vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        if closed {
            ring.push((0.0, 0.0));
        }
        Feature::new(
            "w1",
            FeatureKind::Building,
            LineString::from(ring),
            tags.iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect::<Tags>(),
        )
    }

    #[test]
    fn plain_footprint_is_eligible() {
        let config = PipelineConfig::default();
        assert_eq!(check(&feature(true, &[]), &config.disqualifying_tags), Ok(()));
        assert_eq!(
            check(&feature(true, &[("addr:street", "Oak")]), &config.disqualifying_tags),
            Ok(())
        );
    }

    #[test]
    fn rejects_open_disqualified_and_addressed() {
        let config = PipelineConfig::default();
        let tags = &config.disqualifying_tags;

        assert_eq!(check(&feature(false, &[]), tags), Err(Ineligible::OpenRing));
        assert_eq!(
            check(&feature(true, &[("landuse", "residential")]), tags),
            Err(Ineligible::Disqualified("landuse".to_string()))
        );
        assert_eq!(
            check(
                &feature(
                    true,
                    &[
                        ("addr:housenumber", "1"),
                        ("addr:street", "Oak Street"),
                        ("addr:postcode", "53092"),
                        ("addr:city", "Mequon"),
                    ]
                ),
                tags
            ),
            Err(Ineligible::AlreadyAddressed)
        );
    }
}
