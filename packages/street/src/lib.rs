#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Maps abbreviated parcel street components to mapped road names.
//!
//! A [`StreetResolver`] walks the pattern cascade in [`cascade`] against a
//! road dataset and accepts the first step that names exactly one road.
//! When a step finds several roads and the parcel carries a known
//! directional prefix, roads whose name starts with that direction are
//! preferred. Results are memoized in a [`StreetCache`] for the run.

pub mod cache;
pub mod cascade;
pub mod normalize;

use building_address_models::{Feature, RoadView, StreetTables};
use building_address_store::{FeatureSource, QueryError};

pub use cache::StreetCache;
pub use cascade::{MatchMode, NamePattern, build_patterns};
pub use normalize::{StreetAddress, StreetKey};

/// How a road name was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedBy {
    /// Taken from the run cache without querying.
    Cache,
    /// Found by a cascade step.
    Pattern {
        /// Cascade step (1-based).
        step: usize,
        /// Whether the directional prefix was needed to pick one road.
        narrowed: bool,
    },
}

/// A resolved road name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreetResolution {
    /// Road name exactly as mapped.
    pub name: String,
    /// How it was found.
    pub resolved_by: ResolvedBy,
}

/// Resolves parcel streets against a road dataset.
pub struct StreetResolver<'a> {
    tables: &'a StreetTables,
}

impl<'a> StreetResolver<'a> {
    /// Creates a resolver using `tables` for abbreviation expansion.
    #[must_use]
    pub const fn new(tables: &'a StreetTables) -> Self {
        Self { tables }
    }

    /// Resolves `address` to a single road name.
    ///
    /// Returns `Ok(None)` when no cascade step names exactly one road.
    /// A cached street issues no query at all.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] if the road dataset rejects a query.
    pub fn resolve(
        &self,
        address: &StreetAddress,
        roads: &dyn FeatureSource,
        cache: &mut StreetCache,
    ) -> Result<Option<StreetResolution>, QueryError> {
        let key = address.key();
        if let Some(name) = cache.get(&key) {
            log::trace!("Street \"{address}\" cached as \"{name}\"");
            return Ok(Some(StreetResolution {
                name: name.to_string(),
                resolved_by: ResolvedBy::Cache,
            }));
        }

        let direction = address
            .prefix
            .as_deref()
            .and_then(|p| self.tables.direction(p));

        for pattern in build_patterns(address, self.tables) {
            let names = distinct_names(&roads.query(&pattern.predicate())?);

            let (name, narrowed) = match names.as_slice() {
                [] => {
                    log::trace!("Street \"{address}\": no roads for {pattern}");
                    continue;
                }
                [only] => (only.clone(), false),
                _ => {
                    if let Some(name) = direction.and_then(|d| narrow(&names, d)) {
                        (name.to_string(), true)
                    } else {
                        log::warn!(
                            "Street \"{address}\": {pattern} is ambiguous between {names:?}"
                        );
                        continue;
                    }
                }
            };

            log::debug!("Street \"{address}\" resolved to \"{name}\" by {pattern}");
            cache.insert(key, name.clone());
            return Ok(Some(StreetResolution {
                name,
                resolved_by: ResolvedBy::Pattern {
                    step: pattern.step,
                    narrowed,
                },
            }));
        }

        Ok(None)
    }
}

/// Distinct road names in first-appearance order. Several segments of
/// one street count once.
fn distinct_names(features: &[&Feature]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for feature in features {
        let Some(name) = RoadView::try_from(*feature).ok().and_then(|r| r.name()) else {
            continue;
        };
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// The one name that starts with `direction` followed by a space,
/// ignoring case.
fn narrow<'n>(names: &'n [String], direction: &str) -> Option<&'n str> {
    let prefix = format!("{} ", direction.to_lowercase());
    let mut matching = names
        .iter()
        .filter(|n| n.to_lowercase().starts_with(&prefix));
    let first = matching.next()?;
    if matching.next().is_some() {
        return None;
    }
    Some(first)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use building_address_models::{FeatureKind, Tags};
    use building_address_spatial::Envelope;
    use building_address_store::{FeatureStore, Predicate};
    use geo::LineString;

    fn road(id: &str, name: &str) -> Feature {
        let tags: Tags = [
            ("highway".to_string(), "residential".to_string()),
            ("name".to_string(), name.to_string()),
        ]
        .into_iter()
        .collect();
        Feature::new(
            id,
            FeatureKind::RoadSegment,
            LineString::from(vec![(0.0, 0.0), (1.0, 0.0)]),
            tags,
        )
    }

    struct CountingSource {
        store: FeatureStore,
        queries: Cell<usize>,
    }

    impl CountingSource {
        fn new(roads: Vec<Feature>) -> Self {
            Self {
                store: FeatureStore::new(roads),
                queries: Cell::new(0),
            }
        }
    }

    impl FeatureSource for CountingSource {
        fn query(&self, predicate: &Predicate) -> Result<Vec<&Feature>, QueryError> {
            self.queries.set(self.queries.get() + 1);
            self.store.query(predicate)
        }

        fn search(&self, envelope: &Envelope) -> Vec<&Feature> {
            self.store.search(envelope)
        }
    }

    fn w_oak_st() -> StreetAddress {
        StreetAddress::new(Some("W"), "OAK", Some("ST"), None)
    }

    #[test]
    fn resolves_expanded_name_case_insensitively() {
        let tables = StreetTables::default();
        let roads = CountingSource::new(vec![road("w1", "West Oak Street")]);
        let mut cache = StreetCache::new();

        let found = StreetResolver::new(&tables)
            .resolve(&w_oak_st(), &roads, &mut cache)
            .unwrap()
            .unwrap();

        assert_eq!(found.name, "West Oak Street");
        assert_eq!(
            found.resolved_by,
            ResolvedBy::Pattern {
                step: 1,
                narrowed: false
            }
        );
        assert_eq!(cache.get(&StreetKey::new("W", "OAK", "ST")), Some("West Oak Street"));
    }

    #[test]
    fn cached_street_issues_no_queries() {
        let tables = StreetTables::default();
        let roads = CountingSource::new(vec![road("w1", "West Oak Street")]);
        let mut cache = StreetCache::new();
        cache.insert(StreetKey::new("W", "OAK", "ST"), "West Oak Street".to_string());

        let found = StreetResolver::new(&tables)
            .resolve(&w_oak_st(), &roads, &mut cache)
            .unwrap()
            .unwrap();

        assert_eq!(found.resolved_by, ResolvedBy::Cache);
        assert_eq!(roads.queries.get(), 0);
    }

    #[test]
    fn segments_of_one_street_count_once() {
        let tables = StreetTables::default();
        let roads = CountingSource::new(vec![
            road("w1", "Oak Street"),
            road("w2", "Oak Street"),
        ]);
        let mut cache = StreetCache::new();
        let address = StreetAddress::new(None, "OAK", Some("ST"), None);

        let found = StreetResolver::new(&tables)
            .resolve(&address, &roads, &mut cache)
            .unwrap()
            .unwrap();
        assert_eq!(found.name, "Oak Street");
        assert_eq!(roads.queries.get(), 1);
    }

    #[test]
    fn narrows_substring_step() {
        let tables = StreetTables::default();
        let roads = CountingSource::new(vec![
            road("w1", "East Oak Street Extension"),
            road("w2", "West Oak Street Extension"),
        ]);
        let mut cache = StreetCache::new();

        let found = StreetResolver::new(&tables)
            .resolve(&w_oak_st(), &roads, &mut cache)
            .unwrap()
            .unwrap();
        assert_eq!(found.name, "West Oak Street Extension");
        assert_eq!(
            found.resolved_by,
            ResolvedBy::Pattern {
                step: 5,
                narrowed: true
            }
        );
    }

    #[test]
    fn ambiguous_without_direction_is_unresolved() {
        let tables = StreetTables::default();
        let roads = CountingSource::new(vec![
            road("w1", "East Oak Street"),
            road("w2", "West Oak Street"),
        ]);
        let mut cache = StreetCache::new();
        let address = StreetAddress::new(None, "OAK", Some("ST"), None);

        let found = StreetResolver::new(&tables)
            .resolve(&address, &roads, &mut cache)
            .unwrap();
        assert_eq!(found, None);
        assert!(cache.is_empty());
    }

    #[test]
    fn ambiguous_step_falls_through_to_later_step() {
        let tables = StreetTables::default();
        let roads = CountingSource::new(vec![
            road("w1", "Port Washington Road"),
            road("w2", "PORT WASHINGTON ROAD"),
            road("w3", "Portwashington Road"),
        ]);
        let mut cache = StreetCache::new();
        let address = StreetAddress::new(None, "PORT WASHINGTON", Some("RD"), None);

        let found = StreetResolver::new(&tables)
            .resolve(&address, &roads, &mut cache)
            .unwrap()
            .unwrap();

        assert_eq!(found.name, "Portwashington Road");
        assert_eq!(
            found.resolved_by,
            ResolvedBy::Pattern {
                step: 4,
                narrowed: false
            }
        );
        assert_eq!(roads.queries.get(), 2);
    }

    #[test]
    fn abbreviated_road_names_match_raw_type() {
        let tables = StreetTables::default();
        let roads = CountingSource::new(vec![road("w1", "West Oak St")]);
        let mut cache = StreetCache::new();

        let found = StreetResolver::new(&tables)
            .resolve(&w_oak_st(), &roads, &mut cache)
            .unwrap()
            .unwrap();

        assert_eq!(found.name, "West Oak St");
        assert_eq!(
            found.resolved_by,
            ResolvedBy::Pattern {
                step: 6,
                narrowed: false
            }
        );
    }

    #[test]
    fn failures_are_not_cached() {
        let tables = StreetTables::default();
        let roads = CountingSource::new(vec![road("w1", "Elm Avenue")]);
        let mut cache = StreetCache::new();
        let resolver = StreetResolver::new(&tables);

        assert_eq!(resolver.resolve(&w_oak_st(), &roads, &mut cache).unwrap(), None);
        let first = roads.queries.get();
        assert!(first > 0);

        assert_eq!(resolver.resolve(&w_oak_st(), &roads, &mut cache).unwrap(), None);
        assert_eq!(roads.queries.get(), first * 2);
    }

    #[test]
    fn narrowing_needs_exactly_one_direction_match() {
        let names = vec!["West Oak".to_string(), "Westfield Road".to_string()];
        assert_eq!(narrow(&names, "West"), Some("West Oak"));
        assert_eq!(narrow(&names, "East"), None);

        let twice = vec!["West Oak".to_string(), "west oak".to_string()];
        assert_eq!(narrow(&twice, "West"), None);
    }
}
