//! Loading [`PipelineConfig`] from TOML.

use std::path::{Path, PathBuf};

use building_address_models::PipelineConfig;

/// Embedded default configuration.
const DEFAULT_TOML: &str = include_str!("../config/default.toml");

/// Errors from loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config {path}: {source}")]
    Io {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid TOML for [`PipelineConfig`].
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("Invalid config value for '{field}': {message}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

/// The embedded default configuration.
///
/// # Errors
///
/// Returns [`ConfigError`] if the embedded file is malformed, which a
/// test guards against.
pub fn embedded_default() -> Result<PipelineConfig, ConfigError> {
    from_toml_str(DEFAULT_TOML)
}

/// Reads and validates a configuration file. Fields the file omits keep
/// their defaults.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read, parsed or fails
/// validation.
pub fn load(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = from_toml_str(&contents)?;
    log::debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Parses and validates configuration text.
///
/// # Errors
///
/// Returns [`ConfigError`] if the text cannot be parsed or fails
/// validation.
pub fn from_toml_str(contents: &str) -> Result<PipelineConfig, ConfigError> {
    let config: PipelineConfig = toml::de::from_str(contents)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &PipelineConfig) -> Result<(), ConfigError> {
    if !config.envelope_padding.is_finite() || config.envelope_padding < 0.0 {
        return Err(ConfigError::Invalid {
            field: "envelope_padding",
            message: format!("must be a non-negative number, got {}", config.envelope_padding),
        });
    }
    if config.admin_level.trim().is_empty() {
        return Err(ConfigError::Invalid {
            field: "admin_level",
            message: "must not be empty".to_string(),
        });
    }
    if config.marker_tag.trim().is_empty() {
        return Err(ConfigError::Invalid {
            field: "marker_tag",
            message: "must not be empty".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use building_address_models::MunicipalityMode;

    #[test]
    fn embedded_default_matches_built_in_default() {
        let config = embedded_default().unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn omitted_fields_keep_defaults() {
        let config = from_toml_str(
            r#"
            municipality = "per_building"
            placename_fallback = true

            [city_aliases]
            "VILLAGE OF THIENSVILLE" = "Thiensville"
            "#,
        )
        .unwrap();

        assert_eq!(config.municipality, MunicipalityMode::PerBuilding);
        assert!(config.placename_fallback);
        assert_eq!(config.marker_tag, "checkme");
        assert_eq!(config.street.street_type("ST"), Some("Street"));
        assert_eq!(config.city_aliases.len(), 1);
        assert!(!config.city_aliases.contains_key("CITY OF MEQUON"));
    }

    #[test]
    fn rejects_negative_padding() {
        let err = from_toml_str("envelope_padding = -1.0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "envelope_padding",
                ..
            }
        ));
    }

    #[test]
    fn rejects_empty_marker() {
        let err = from_toml_str(r#"marker_tag = " ""#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "marker_tag", .. }));
    }

    #[test]
    fn reports_parse_errors() {
        let err = from_toml_str("municipality = \"sometimes\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn reports_missing_file() {
        let err = load(Path::new("/nonexistent/building_address.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
