//! Pipeline configuration types.
//!
//! Deserialized from TOML. Every field has a default, so a configuration
//! file only needs to list what it overrides.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Where the city for `addr:city` comes from.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "kebab-case")]
pub enum MunicipalityMode {
    /// One boundary must contain the whole working envelope; if none
    /// does, the run aborts.
    #[default]
    PerRun,
    /// Each building is resolved on its own bounding box; buildings
    /// outside every boundary are skipped.
    PerBuilding,
}

/// Lookup tables used to expand abbreviated parcel street components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreetTables {
    /// Single-letter directional codes to full words (`W` -> `West`).
    pub directional_prefixes: BTreeMap<String, String>,
    /// Street type abbreviations to full words (`ST` -> `Street`).
    pub street_types: BTreeMap<String, String>,
}

impl StreetTables {
    /// Expands a directional code, if known.
    #[must_use]
    pub fn direction(&self, code: &str) -> Option<&str> {
        self.directional_prefixes
            .get(&code.trim().to_uppercase())
            .map(String::as_str)
    }

    /// Expands a street type abbreviation, if known.
    #[must_use]
    pub fn street_type(&self, abbreviation: &str) -> Option<&str> {
        self.street_types
            .get(&abbreviation.trim().to_uppercase())
            .map(String::as_str)
    }
}

impl Default for StreetTables {
    fn default() -> Self {
        let directional_prefixes = [("W", "West"), ("E", "East"), ("N", "North"), ("S", "South")];
        let street_types = [
            ("ALY", "Alley"),
            ("AVE", "Avenue"),
            ("BLVD", "Boulevard"),
            ("CIR", "Circle"),
            ("CT", "Court"),
            ("CV", "Cove"),
            ("CTR", "Center"),
            ("DR", "Drive"),
            ("EXPY", "Expressway"),
            ("FWY", "Freeway"),
            ("GRV", "Grove"),
            ("HTS", "Heights"),
            ("HWY", "Highway"),
            ("HOLW", "Hollow"),
            ("LN", "Lane"),
            ("LNDG", "Landing"),
            ("LOOP", "Loop"),
            ("MDW", "Meadow"),
            ("MDWS", "Meadows"),
            ("PASS", "Pass"),
            ("PATH", "Path"),
            ("PKWY", "Parkway"),
            ("PL", "Place"),
            ("PT", "Point"),
            ("RD", "Road"),
            ("RDG", "Ridge"),
            ("RUN", "Run"),
            ("SQ", "Square"),
            ("ST", "Street"),
            ("TER", "Terrace"),
            ("TRL", "Trail"),
            ("VW", "View"),
            ("WAY", "Way"),
            ("XING", "Crossing"),
        ];

        Self {
            directional_prefixes: directional_prefixes
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            street_types: street_types
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        }
    }
}

/// Configuration for one enrichment run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Margin added once around the working envelope before the parcel
    /// prefetch, in coordinate units (degrees for WGS84 data).
    pub envelope_padding: f64,
    /// `admin_level` value of municipal boundaries.
    pub admin_level: String,
    /// How the city is determined.
    pub municipality: MunicipalityMode,
    /// Fall back to the parcel `PLACENAME` when no boundary resolves.
    pub placename_fallback: bool,
    /// Tag buildings that fail resolution with [`Self::marker_tag`].
    pub mark_failures: bool,
    /// Review marker set on failed buildings and cleared on success.
    pub marker_tag: String,
    /// Tags that make a selected feature ineligible for enrichment.
    pub disqualifying_tags: Vec<String>,
    /// Import-provenance tags removed from enriched buildings.
    pub foreign_tags: Vec<String>,
    /// Street component expansion tables.
    pub street: StreetTables,
    /// Upper-case `PLACENAME` values mapped to their proper city name,
    /// used by the place-name fallback.
    pub city_aliases: BTreeMap<String, String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            envelope_padding: 0.0005,
            admin_level: "8".to_string(),
            municipality: MunicipalityMode::PerRun,
            placename_fallback: false,
            mark_failures: true,
            marker_tag: "checkme".to_string(),
            disqualifying_tags: vec![
                "highway".to_string(),
                "natural".to_string(),
                "landuse".to_string(),
            ],
            foreign_tags: vec!["capture_dates_range".to_string(), "release".to_string()],
            street: StreetTables::default(),
            city_aliases: BTreeMap::from([("CITY OF MEQUON".to_string(), "Mequon".to_string())]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn expands_codes_case_insensitively() {
        let tables = StreetTables::default();
        assert_eq!(tables.direction("w"), Some("West"));
        assert_eq!(tables.street_type(" st "), Some("Street"));
        assert_eq!(tables.street_type("BOGUS"), None);
    }

    #[test]
    fn parses_municipality_mode() {
        assert_eq!(
            MunicipalityMode::from_str("per-building").unwrap(),
            MunicipalityMode::PerBuilding
        );
        assert_eq!(MunicipalityMode::PerRun.to_string(), "per-run");
    }
}
