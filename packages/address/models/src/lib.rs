#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Feature types shared by the building address toolchain.
//!
//! Every dataset the enrichment pipeline touches (buildings, cadastral
//! parcels, municipal boundaries, road segments) is a [`Feature`]: an id,
//! a vertex ring and a tag map. The [`FeatureKind`] discriminant says which
//! role a feature plays, and the typed views ([`ParcelView`],
//! [`BoundaryView`], [`RoadView`]) give named access to the attributes
//! each role carries.

pub mod config;
pub mod report;

use std::collections::BTreeMap;
use std::fmt;

use geo::{BoundingRect, LineString, Polygon, Rect};
use serde::{Deserialize, Serialize};

pub use config::{MunicipalityMode, PipelineConfig, StreetTables};
pub use report::{Diagnostic, RunReport, RunSummary, SkipReason};

/// Tag map of a feature. Keys are unique; ordering is irrelevant but kept
/// sorted so output is deterministic.
pub type Tags = BTreeMap<String, String>;

/// OSM-style address tag keys written by the enrichment.
pub mod addr {
    /// `addr:city`
    pub const CITY: &str = "addr:city";
    /// `addr:postcode`
    pub const POSTCODE: &str = "addr:postcode";
    /// `addr:street`
    pub const STREET: &str = "addr:street";
    /// `addr:housenumber`
    pub const HOUSENUMBER: &str = "addr:housenumber";

    /// All address keys that make up a complete address.
    pub const ALL: &[&str] = &[HOUSENUMBER, STREET, POSTCODE, CITY];
}

/// Attribute names of the cadastral parcel dataset.
pub mod parcel {
    /// Full site address, e.g. `"123 W OAK ST"`.
    pub const SITEADDRESS: &str = "SITEADDRESS";
    /// Misspelled site address column used by the Wisconsin V900
    /// statewide parcel layer.
    pub const SITEADRESS: &str = "SITEADRESS";
    /// Directional prefix code (`W`, `E`, `N`, `S`).
    pub const PREFIX: &str = "PREFIX";
    /// Street name without prefix or type.
    pub const STREETNAME: &str = "STREETNAME";
    /// Abbreviated street type (`ST`, `AVE`, ...).
    pub const STREETTYPE: &str = "STREETTYPE";
    /// Trailing directional or qualifier.
    pub const SUFFIX: &str = "SUFFIX";
    /// Postal code.
    pub const ZIPCODE: &str = "ZIPCODE";
    /// House number.
    pub const ADDNUM: &str = "ADDNUM";
    /// Municipality name as recorded by the county.
    pub const PLACENAME: &str = "PLACENAME";
}

/// Stable identity of a feature within its dataset.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureId(pub String);

impl FeatureId {
    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FeatureId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for FeatureId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Which role a feature plays in an enrichment run.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum FeatureKind {
    /// Building footprint, the target of enrichment.
    Building,
    /// Cadastral parcel carrying authoritative address attributes.
    Parcel,
    /// Administrative boundary (only the municipal level matters).
    #[serde(rename = "boundary")]
    #[strum(serialize = "boundary")]
    AdminBoundary,
    /// Road segment tagged `highway`.
    #[serde(rename = "road")]
    #[strum(serialize = "road")]
    RoadSegment,
    /// Anything else found in a dataset.
    Other,
}

impl FeatureKind {
    /// Derives the kind of a feature loaded without an explicit role.
    ///
    /// Checked in priority order: `highway` makes a road, an
    /// `admin_level` or `boundary=administrative` makes a boundary, any
    /// parcel address column makes a parcel and a `building` tag makes a
    /// building.
    #[must_use]
    pub fn classify(tags: &Tags) -> Self {
        if tags.contains_key("highway") {
            Self::RoadSegment
        } else if tags.contains_key("admin_level")
            || tags.get("boundary").is_some_and(|v| v == "administrative")
        {
            Self::AdminBoundary
        } else if [
            parcel::SITEADDRESS,
            parcel::SITEADRESS,
            parcel::ADDNUM,
            parcel::STREETNAME,
        ]
        .iter()
        .any(|k| tags.contains_key(*k))
        {
            Self::Parcel
        } else if tags.contains_key("building") {
            Self::Building
        } else {
            Self::Other
        }
    }
}

/// A geographic feature: identity, a vertex ring and tags.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Dataset-unique identity.
    pub id: FeatureId,
    /// Role of this feature.
    pub kind: FeatureKind,
    /// Ordered vertices. Closed when the first and last vertex coincide.
    pub ring: LineString<f64>,
    /// Tag map.
    pub tags: Tags,
}

impl Feature {
    /// Creates a feature.
    #[must_use]
    pub fn new(
        id: impl Into<FeatureId>,
        kind: FeatureKind,
        ring: LineString<f64>,
        tags: Tags,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            ring,
            tags,
        }
    }

    /// Returns the value of `key`, if set.
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Returns `true` if `key` is set (to any value).
    #[must_use]
    pub fn has_tag(&self, key: &str) -> bool {
        self.tags.contains_key(key)
    }

    /// Returns `true` if the ring is closed and encloses an area.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.ring.0.len() >= 4 && self.ring.is_closed()
    }

    /// Builds the polygon for a closed ring.
    #[must_use]
    pub fn polygon(&self) -> Option<Polygon<f64>> {
        self.is_closed()
            .then(|| Polygon::new(self.ring.clone(), vec![]))
    }

    /// Bounding rectangle of the ring.
    #[must_use]
    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        self.ring.bounding_rect()
    }

    /// Returns `true` if every `addr:*` key the enrichment writes is
    /// present and non-empty.
    #[must_use]
    pub fn has_complete_address(&self) -> bool {
        addr::ALL
            .iter()
            .all(|k| self.tag(k).is_some_and(|v| !v.trim().is_empty()))
    }
}

/// A feature was viewed as a kind it is not.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Feature {id} is a {actual}, not a {expected}")]
pub struct KindMismatch {
    /// Offending feature.
    pub id: FeatureId,
    /// Kind that was requested.
    pub expected: FeatureKind,
    /// Kind the feature actually has.
    pub actual: FeatureKind,
}

fn expect_kind(feature: &Feature, expected: FeatureKind) -> Result<(), KindMismatch> {
    if feature.kind == expected {
        Ok(())
    } else {
        Err(KindMismatch {
            id: feature.id.clone(),
            expected,
            actual: feature.kind,
        })
    }
}

/// Non-empty, trimmed tag value.
fn attr<'a>(feature: &'a Feature, key: &str) -> Option<&'a str> {
    feature.tag(key).map(str::trim).filter(|v| !v.is_empty())
}

/// Read-only view of a cadastral parcel.
#[derive(Debug, Clone, Copy)]
pub struct ParcelView<'a> {
    feature: &'a Feature,
}

impl<'a> TryFrom<&'a Feature> for ParcelView<'a> {
    type Error = KindMismatch;

    fn try_from(feature: &'a Feature) -> Result<Self, Self::Error> {
        expect_kind(feature, FeatureKind::Parcel)?;
        Ok(Self { feature })
    }
}

impl<'a> ParcelView<'a> {
    /// Underlying feature.
    #[must_use]
    pub const fn feature(&self) -> &'a Feature {
        self.feature
    }

    /// Full site address, accepting the V900 misspelling.
    #[must_use]
    pub fn site_address(&self) -> Option<&'a str> {
        attr(self.feature, parcel::SITEADDRESS).or_else(|| attr(self.feature, parcel::SITEADRESS))
    }

    /// Directional prefix code.
    #[must_use]
    pub fn prefix(&self) -> Option<&'a str> {
        attr(self.feature, parcel::PREFIX)
    }

    /// Street name.
    #[must_use]
    pub fn street_name(&self) -> Option<&'a str> {
        attr(self.feature, parcel::STREETNAME)
    }

    /// Street type abbreviation.
    #[must_use]
    pub fn street_type(&self) -> Option<&'a str> {
        attr(self.feature, parcel::STREETTYPE)
    }

    /// Street suffix.
    #[must_use]
    pub fn suffix(&self) -> Option<&'a str> {
        attr(self.feature, parcel::SUFFIX)
    }

    /// Postal code.
    #[must_use]
    pub fn zipcode(&self) -> Option<&'a str> {
        attr(self.feature, parcel::ZIPCODE)
    }

    /// House number.
    #[must_use]
    pub fn house_number(&self) -> Option<&'a str> {
        attr(self.feature, parcel::ADDNUM)
    }

    /// County-recorded municipality name.
    #[must_use]
    pub fn place_name(&self) -> Option<&'a str> {
        attr(self.feature, parcel::PLACENAME)
    }
}

/// Read-only view of an administrative boundary.
#[derive(Debug, Clone, Copy)]
pub struct BoundaryView<'a> {
    feature: &'a Feature,
}

impl<'a> TryFrom<&'a Feature> for BoundaryView<'a> {
    type Error = KindMismatch;

    fn try_from(feature: &'a Feature) -> Result<Self, Self::Error> {
        expect_kind(feature, FeatureKind::AdminBoundary)?;
        Ok(Self { feature })
    }
}

impl<'a> BoundaryView<'a> {
    /// Underlying feature.
    #[must_use]
    pub const fn feature(&self) -> &'a Feature {
        self.feature
    }

    /// Boundary name (the city name for municipal boundaries).
    #[must_use]
    pub fn name(&self) -> Option<&'a str> {
        attr(self.feature, "name")
    }
}

/// Read-only view of a road segment.
#[derive(Debug, Clone, Copy)]
pub struct RoadView<'a> {
    feature: &'a Feature,
}

impl<'a> TryFrom<&'a Feature> for RoadView<'a> {
    type Error = KindMismatch;

    fn try_from(feature: &'a Feature) -> Result<Self, Self::Error> {
        expect_kind(feature, FeatureKind::RoadSegment)?;
        Ok(Self { feature })
    }
}

impl<'a> RoadView<'a> {
    /// Underlying feature.
    #[must_use]
    pub const fn feature(&self) -> &'a Feature {
        self.feature
    }

    /// Road name as mapped.
    #[must_use]
    pub fn name(&self) -> Option<&'a str> {
        attr(self.feature, "name")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn square() -> LineString<f64> {
        LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)])
    }

    #[test]
    fn classifies_roads_before_buildings() {
        let t = tags(&[("highway", "residential"), ("building", "yes")]);
        assert_eq!(FeatureKind::classify(&t), FeatureKind::RoadSegment);
    }

    #[test]
    fn classifies_boundaries_and_parcels() {
        assert_eq!(
            FeatureKind::classify(&tags(&[("admin_level", "8"), ("name", "Mequon")])),
            FeatureKind::AdminBoundary
        );
        assert_eq!(
            FeatureKind::classify(&tags(&[("SITEADRESS", "123 W OAK ST")])),
            FeatureKind::Parcel
        );
        assert_eq!(FeatureKind::classify(&Tags::new()), FeatureKind::Other);
    }

    #[test]
    fn parses_kind_names() {
        assert_eq!(FeatureKind::from_str("road").unwrap(), FeatureKind::RoadSegment);
        assert_eq!(
            FeatureKind::from_str("Boundary").unwrap(),
            FeatureKind::AdminBoundary
        );
        assert_eq!(FeatureKind::Building.to_string(), "building");
        assert!(FeatureKind::from_str("relation").is_err());
    }

    #[test]
    fn open_ring_has_no_polygon() {
        let open = Feature::new(
            "w1",
            FeatureKind::Building,
            LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]),
            Tags::new(),
        );
        assert!(!open.is_closed());
        assert!(open.polygon().is_none());

        let closed = Feature::new("w2", FeatureKind::Building, square(), Tags::new());
        assert!(closed.is_closed());
        assert!(closed.polygon().is_some());
    }

    #[test]
    fn complete_address_requires_all_four_keys() {
        let mut f = Feature::new(
            "w1",
            FeatureKind::Building,
            square(),
            tags(&[
                ("addr:housenumber", "123"),
                ("addr:street", "West Oak Street"),
                ("addr:postcode", "53092"),
            ]),
        );
        assert!(!f.has_complete_address());
        f.tags.insert("addr:city".to_string(), "Mequon".to_string());
        assert!(f.has_complete_address());
    }

    #[test]
    fn parcel_view_accepts_misspelled_site_address() {
        let f = Feature::new(
            "p1",
            FeatureKind::Parcel,
            square(),
            tags(&[("SITEADRESS", "123 W OAK ST"), ("PREFIX", " W ")]),
        );
        let view = ParcelView::try_from(&f).unwrap();
        assert_eq!(view.site_address(), Some("123 W OAK ST"));
        assert_eq!(view.prefix(), Some("W"));
        assert_eq!(view.suffix(), None);
    }

    #[test]
    fn view_rejects_wrong_kind() {
        let f = Feature::new("w1", FeatureKind::Building, square(), Tags::new());
        let err = RoadView::try_from(&f).unwrap_err();
        assert_eq!(err.expected, FeatureKind::RoadSegment);
        assert_eq!(err.to_string(), "Feature w1 is a building, not a road");
    }
}
