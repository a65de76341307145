#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Configuration for the geotag record filter.
//!
//! Deserialized from TOML; every option is optional:
//!
//! ```toml
//! properties_dig_level = 1
//! properties_ignore_list = ["internal_id"]
//! geometry_centroid_key = "centroid"
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading a [`FilterConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the config file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The config is not valid TOML for [`FilterConfig`].
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Filter options shared (read-only) by every invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterConfig {
    /// How deep to un-nest `properties`: `0` disables flattening, a
    /// positive value descends that many levels, and a negative value
    /// descends without limit.
    pub properties_dig_level: i64,
    /// Keys skipped (with their subtrees) at every flattening depth.
    pub properties_ignore_list: BTreeSet<String>,
    /// Output field for the geometry centroid.
    pub geometry_centroid_key: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            properties_dig_level: 1,
            properties_ignore_list: BTreeSet::new(),
            geometry_centroid_key: "centroid".to_string(),
        }
    }
}

impl FilterConfig {
    /// Parses a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if the text is not valid TOML or
    /// contains unknown options.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::de::from_str(toml_str)?)
    }

    /// Loads a config from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = FilterConfig::from_toml_str("").unwrap();
        assert_eq!(config, FilterConfig::default());
        assert_eq!(config.properties_dig_level, 1);
        assert!(config.properties_ignore_list.is_empty());
        assert_eq!(config.geometry_centroid_key, "centroid");
    }

    #[test]
    fn parses_all_options() {
        let config = FilterConfig::from_toml_str(
            r#"
            properties_dig_level = -1
            properties_ignore_list = ["secret", "internal_id"]
            geometry_centroid_key = "point"
            "#,
        )
        .unwrap();

        assert_eq!(config.properties_dig_level, -1);
        assert!(config.properties_ignore_list.contains("secret"));
        assert!(config.properties_ignore_list.contains("internal_id"));
        assert_eq!(config.geometry_centroid_key, "point");
    }

    #[test]
    fn rejects_unknown_options() {
        assert!(matches!(
            FilterConfig::from_toml_str("dig_level = 3"),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn rejects_wrong_types() {
        assert!(FilterConfig::from_toml_str("properties_dig_level = \"deep\"").is_err());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            FilterConfig::load(Path::new("/nonexistent/geotag.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
