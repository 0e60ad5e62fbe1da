//! Reading and writing feature datasets as `GeoJSON`.
//!
//! Each `GeoJSON` feature becomes one [`Feature`] with a single vertex
//! ring: a polygon's exterior (the first polygon of a multipolygon) or a
//! line's vertices. Boundaries are kept as their bounding rectangle, the
//! only shape municipality lookup uses. Properties become tags; non-string
//! values are stored as their JSON text and nulls are dropped.

use std::path::{Path, PathBuf};

use building_address_models::{Feature, FeatureId, FeatureKind, Tags};
use geo::{BoundingRect, Geometry, LineString, Polygon};
use geojson::feature::Id;
use geojson::{FeatureCollection, GeoJson, JsonObject};
use serde_json::Value as JsonValue;

/// Errors from reading or writing a `GeoJSON` file.
#[derive(Debug, thiserror::Error)]
pub enum GeoJsonError {
    /// The file could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid `GeoJSON`.
    #[error("Invalid GeoJSON: {0}")]
    Parse(#[from] Box<geojson::Error>),

    /// The document is a bare geometry or feature.
    #[error("Expected a FeatureCollection")]
    NotACollection,
}

/// Loads the features of a `FeatureCollection` file.
///
/// `kind` forces the role of every feature; when `None` each feature is
/// classified from its tags. Features without an id get `<file stem>-<n>`.
///
/// # Errors
///
/// Returns [`GeoJsonError`] if the file cannot be read or parsed.
pub fn load(path: &Path, kind: Option<FeatureKind>) -> Result<Vec<Feature>, GeoJsonError> {
    let text = std::fs::read_to_string(path).map_err(|source| GeoJsonError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let stem = path
        .file_stem()
        .map_or_else(|| "feature".to_string(), |s| s.to_string_lossy().into_owned());

    let features = parse_collection(&text, &stem, kind)?;
    log::info!("Loaded {} features from {}", features.len(), path.display());
    Ok(features)
}

/// Writes `features` as a `FeatureCollection`.
///
/// # Errors
///
/// Returns [`GeoJsonError::Io`] if the file cannot be written.
pub fn write(path: &Path, features: &[Feature]) -> Result<(), GeoJsonError> {
    std::fs::write(path, to_collection(features).to_string()).map_err(|source| GeoJsonError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses `GeoJSON` text into features. See [`load`].
///
/// # Errors
///
/// Returns [`GeoJsonError`] if the text is not a `FeatureCollection`.
pub fn parse_collection(
    text: &str,
    stem: &str,
    kind: Option<FeatureKind>,
) -> Result<Vec<Feature>, GeoJsonError> {
    let geojson = text.parse::<GeoJson>().map_err(Box::new)?;
    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(GeoJsonError::NotACollection);
    };

    Ok(collection
        .features
        .into_iter()
        .enumerate()
        .filter_map(|(index, feature)| convert(feature, stem, index, kind))
        .collect())
}

fn convert(
    feature: geojson::Feature,
    stem: &str,
    index: usize,
    kind: Option<FeatureKind>,
) -> Option<Feature> {
    let tags = feature
        .properties
        .as_ref()
        .map(properties_to_tags)
        .unwrap_or_default();

    let id = match &feature.id {
        Some(Id::String(s)) => s.clone(),
        Some(Id::Number(n)) => n.to_string(),
        None => tags
            .get("id")
            .cloned()
            .unwrap_or_else(|| format!("{stem}-{index}")),
    };

    let kind = kind.unwrap_or_else(|| FeatureKind::classify(&tags));

    let Some(geometry) = feature
        .geometry
        .and_then(|g| Geometry::<f64>::try_from(g).ok())
    else {
        log::warn!("Skipping {id}: missing or unsupported geometry");
        return None;
    };

    let Some(ring) = ring_of(&geometry, kind) else {
        log::warn!("Skipping {id}: geometry has no usable ring");
        return None;
    };

    Some(Feature::new(id, kind, ring, tags))
}

fn ring_of(geometry: &Geometry<f64>, kind: FeatureKind) -> Option<LineString<f64>> {
    if kind == FeatureKind::AdminBoundary {
        let rect = geometry.bounding_rect()?;
        return Some(rect.to_polygon().exterior().clone());
    }

    match geometry {
        Geometry::Polygon(p) => Some(p.exterior().clone()),
        Geometry::MultiPolygon(mp) => mp.0.first().map(|p| p.exterior().clone()),
        Geometry::LineString(ls) => Some(ls.clone()),
        Geometry::MultiLineString(mls) => mls.0.first().cloned(),
        _ => None,
    }
}

fn properties_to_tags(properties: &JsonObject) -> Tags {
    properties
        .iter()
        .filter_map(|(key, value)| {
            let value = match value {
                JsonValue::Null => return None,
                JsonValue::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some((key.clone(), value))
        })
        .collect()
}

/// Builds a `FeatureCollection` from `features`. Closed rings are written
/// as polygons, open ones as line strings.
#[must_use]
pub fn to_collection(features: &[Feature]) -> GeoJson {
    let features = features
        .iter()
        .map(|feature| {
            let value = if feature.is_closed() {
                geojson::Value::from(&Polygon::new(feature.ring.clone(), vec![]))
            } else {
                geojson::Value::from(&feature.ring)
            };
            let properties: JsonObject = feature
                .tags
                .iter()
                .map(|(k, v)| (k.clone(), JsonValue::String(v.clone())))
                .collect();

            geojson::Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::new(value)),
                id: Some(Id::String(feature.id.to_string())),
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    GeoJson::from(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

/// Splits a comma-separated id list, ignoring blanks.
#[must_use]
pub fn parse_id_list(list: &str) -> Vec<FeatureId> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(FeatureId::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": 42,
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 1], [0, 0]]]
                },
                "properties": { "ADDNUM": 123, "STREETNAME": "OAK", "PLACENAME": null }
            },
            {
                "type": "Feature",
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[0, 0], [5, 0]]
                },
                "properties": { "highway": "residential", "name": "West Oak Street" }
            },
            {
                "type": "Feature",
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[0, 0], [2, 0], [2, 2], [0, 2], [0, 0]]],
                        [[[10, 10], [12, 10], [12, 12], [10, 12], [10, 10]]]
                    ]
                },
                "properties": { "id": "r7", "admin_level": "8", "name": "Mequon" }
            },
            {
                "type": "Feature",
                "geometry": null,
                "properties": {}
            }
        ]
    }"#;

    #[test]
    fn converts_features_and_properties() {
        let features = parse_collection(SAMPLE, "sample", None).unwrap();
        assert_eq!(features.len(), 3);

        let parcel = &features[0];
        assert_eq!(parcel.id.as_str(), "42");
        assert_eq!(parcel.kind, FeatureKind::Parcel);
        assert_eq!(parcel.tag("ADDNUM"), Some("123"));
        assert!(!parcel.has_tag("PLACENAME"));
        assert!(parcel.is_closed());

        let road = &features[1];
        assert_eq!(road.id.as_str(), "sample-1");
        assert_eq!(road.kind, FeatureKind::RoadSegment);
        assert!(!road.is_closed());
    }

    #[test]
    fn boundaries_keep_their_full_extent() {
        let features = parse_collection(SAMPLE, "sample", None).unwrap();
        let boundary = &features[2];

        assert_eq!(boundary.id.as_str(), "r7");
        assert_eq!(boundary.kind, FeatureKind::AdminBoundary);
        let rect = boundary.bounding_rect().unwrap();
        assert!((rect.max().x - 12.0).abs() < f64::EPSILON);
        assert!((rect.max().y - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn forced_kind_overrides_classification() {
        let features = parse_collection(SAMPLE, "sample", Some(FeatureKind::Building)).unwrap();
        assert!(features.iter().all(|f| f.kind == FeatureKind::Building));
        // A building keeps only the first polygon of a multipolygon.
        assert!((features[2].bounding_rect().unwrap().max().x - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_bare_geometry() {
        let err = parse_collection(r#"{"type": "Point", "coordinates": [0, 0]}"#, "x", None)
            .unwrap_err();
        assert!(matches!(err, GeoJsonError::NotACollection));
    }

    #[test]
    fn written_buildings_load_back() {
        let features = parse_collection(SAMPLE, "sample", Some(FeatureKind::Building)).unwrap();
        let text = to_collection(&features[..1]).to_string();

        let reloaded = parse_collection(&text, "out", Some(FeatureKind::Building)).unwrap();
        assert_eq!(reloaded, features[..1]);
    }

    #[test]
    fn splits_id_lists() {
        assert_eq!(
            parse_id_list(" w1, ,w2 "),
            vec![FeatureId::from("w1"), FeatureId::from("w2")]
        );
    }
}
