//! Deriving the tag change for a building.
//!
//! The merge never writes: it compares the building's current tags with
//! what they should be and lists only the differences, so merging an
//! already enriched building yields an empty [`TagChange`].

use std::collections::BTreeSet;

use building_address_models::{FeatureId, PipelineConfig, Tags, addr};

/// Tag mutations for one building, committed as a single change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagChange {
    /// Building the change applies to.
    pub id: FeatureId,
    /// Keys to set, with their new values.
    pub set: Tags,
    /// Keys to remove.
    pub remove: BTreeSet<String>,
}

impl TagChange {
    /// Creates an empty change for `id`.
    #[must_use]
    pub const fn new(id: FeatureId) -> Self {
        Self {
            id,
            set: Tags::new(),
            remove: BTreeSet::new(),
        }
    }

    /// Returns `true` if the change would not alter any tag.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.remove.is_empty()
    }

    /// Applies the change: removals first, then assignments.
    pub fn apply_to(&self, tags: &mut Tags) {
        for key in &self.remove {
            tags.remove(key);
        }
        for (key, value) in &self.set {
            tags.insert(key.clone(), value.clone());
        }
    }

    fn set_if_changed(&mut self, existing: &Tags, key: &str, value: &str) {
        if existing.get(key).map(String::as_str) != Some(value) {
            self.set.insert(key.to_string(), value.to_string());
        }
    }

    fn remove_if_present(&mut self, existing: &Tags, key: &str) {
        if existing.contains_key(key) {
            self.remove.insert(key.to_string());
        }
    }
}

/// Everything resolved for one building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Building being enriched.
    pub building: FeatureId,
    /// Matched parcel.
    pub parcel: FeatureId,
    /// Value for `addr:city`.
    pub city: String,
    /// Value for `addr:street`: the mapped road name.
    pub street: String,
    /// Value for `addr:housenumber` (parcel `ADDNUM`).
    pub housenumber: String,
    /// Value for `addr:postcode` (parcel `ZIPCODE`).
    pub postcode: Option<String>,
}

/// Which extra tags the merge clears.
#[derive(Debug, Clone, Copy)]
pub struct MergePolicy<'a> {
    /// Provenance tags removed from enriched buildings.
    pub foreign_tags: &'a [String],
    /// Review marker cleared on success.
    pub marker_tag: &'a str,
}

impl<'a> MergePolicy<'a> {
    /// Policy described by `config`.
    #[must_use]
    pub fn from_config(config: &'a PipelineConfig) -> Self {
        Self {
            foreign_tags: &config.foreign_tags,
            marker_tag: &config.marker_tag,
        }
    }
}

/// Computes the change that gives a building its resolved address.
///
/// `building=yes` is only added when the building has no `building` tag
/// at all.
#[must_use]
pub fn merge_tags(existing: &Tags, resolution: &Resolution, policy: &MergePolicy<'_>) -> TagChange {
    let mut change = TagChange::new(resolution.building.clone());

    change.set_if_changed(existing, addr::CITY, &resolution.city);
    change.set_if_changed(existing, addr::STREET, &resolution.street);
    change.set_if_changed(existing, addr::HOUSENUMBER, &resolution.housenumber);
    if let Some(postcode) = &resolution.postcode {
        change.set_if_changed(existing, addr::POSTCODE, postcode);
    }
    if !existing.contains_key("building") {
        change.set.insert("building".to_string(), "yes".to_string());
    }

    for key in policy.foreign_tags {
        change.remove_if_present(existing, key);
    }
    change.remove_if_present(existing, policy.marker_tag);

    change
}

/// Change that flags a building for manual review. Empty if the marker
/// is already set.
#[must_use]
pub fn marker_change(id: &FeatureId, existing: &Tags, marker_tag: &str) -> TagChange {
    let mut change = TagChange::new(id.clone());
    change.set_if_changed(existing, marker_tag, "yes");
    change
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn resolution() -> Resolution {
        Resolution {
            building: FeatureId::from("w1"),
            parcel: FeatureId::from("p1"),
            city: "Mequon".to_string(),
            street: "West Oak Street".to_string(),
            housenumber: "123".to_string(),
            postcode: Some("53092".to_string()),
        }
    }

    #[test]
    fn merges_address_and_clears_foreign_tags() {
        let config = PipelineConfig::default();
        let policy = MergePolicy::from_config(&config);
        let mut building = tags(&[
            ("capture_dates_range", "1/1/2019-2/1/2019"),
            ("release", "1"),
            ("checkme", "yes"),
        ]);

        let change = merge_tags(&building, &resolution(), &policy);
        change.apply_to(&mut building);

        assert_eq!(
            building,
            tags(&[
                ("addr:city", "Mequon"),
                ("addr:housenumber", "123"),
                ("addr:postcode", "53092"),
                ("addr:street", "West Oak Street"),
                ("building", "yes"),
            ])
        );
    }

    #[test]
    fn keeps_specific_building_value() {
        let config = PipelineConfig::default();
        let policy = MergePolicy::from_config(&config);
        let mut building = tags(&[("building", "garage")]);

        merge_tags(&building, &resolution(), &policy).apply_to(&mut building);
        assert_eq!(building.get("building").map(String::as_str), Some("garage"));
    }

    #[test]
    fn second_merge_is_empty() {
        let config = PipelineConfig::default();
        let policy = MergePolicy::from_config(&config);
        let mut building = tags(&[("release", "2"), ("addr:street", "W Oak St")]);

        let first = merge_tags(&building, &resolution(), &policy);
        assert!(!first.is_empty());
        first.apply_to(&mut building);

        let second = merge_tags(&building, &resolution(), &policy);
        assert!(second.is_empty(), "unexpected change: {second:?}");
    }

    #[test]
    fn lists_only_changed_keys() {
        let config = PipelineConfig::default();
        let policy = MergePolicy::from_config(&config);
        let building = tags(&[
            ("addr:city", "Mequon"),
            ("addr:street", "West Oak Street"),
            ("building", "house"),
        ]);

        let change = merge_tags(&building, &resolution(), &policy);
        assert_eq!(
            change.set,
            tags(&[("addr:housenumber", "123"), ("addr:postcode", "53092")])
        );
        assert!(change.remove.is_empty());
    }

    #[test]
    fn marker_is_set_once() {
        let id = FeatureId::from("w1");
        let mut building = tags(&[("building", "yes")]);

        let change = marker_change(&id, &building, "checkme");
        assert_eq!(change.set, tags(&[("checkme", "yes")]));
        change.apply_to(&mut building);

        assert!(marker_change(&id, &building, "checkme").is_empty());
    }
}
