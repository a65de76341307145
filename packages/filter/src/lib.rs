#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geo enrichment filter for structured records.
//!
//! The host pipeline hands [`GeoTagFilter::filter`] one JSON record at a
//! time and gets the enriched record back. Two kinds of record are
//! handled, independently of each other:
//!
//! 1. **`GeoJSON` features**: `properties` is flattened into the record
//!    and `geometry` is reduced to a centroid field ([`geojson`]).
//! 2. **HTTP captures**: request/response bodies and the request query
//!    are searched for embedded locations, and the findings are written
//!    to `request.geo_fields` / `response.geo_fields` ([`geo_fields`]).
//!
//! Nothing fails the record: every error is logged and degrades the one
//! field it affected.

pub mod geo_fields;
pub mod geojson;

use std::fmt;

use geotag_filter_models::FilterConfig;
use geotag_flatten::Depth;
use geotag_geocoder_models::ReverseGeocoder;
use geotag_geometry::GeometryError;
use serde_json::{Map, Value};
use thiserror::Error;

pub use geotag_filter_models::ConfigError;

/// Errors raised inside a single filter step. They never escape
/// [`GeoTagFilter::filter`].
#[derive(Debug, Error)]
pub enum FilterError {
    /// A body or query is a string that is not valid JSON.
    #[error("Failed to parse {field} as JSON: {source}")]
    BodyParse {
        /// Which field failed (e.g. `request.body`).
        field: &'static str,
        /// The underlying parse error.
        source: serde_json::Error,
    },

    /// A body declares a content type other than `application/json`.
    #[error("Skipping {field}: content type {content_type} is not JSON")]
    UnsupportedContentType {
        /// Which field was skipped.
        field: &'static str,
        /// The declared content type.
        content_type: String,
    },

    /// The record's `geometry` could not be reduced to a centroid.
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),
}

/// Identifiers used to attribute log messages to a record's tenant.
#[derive(Debug, Clone, Default)]
pub struct RecordContext {
    /// The record's `org_id`, if any.
    pub org_id: Option<String>,
    /// The record's `app_id`, if any.
    pub app_id: Option<String>,
}

impl RecordContext {
    /// Reads `org_id` / `app_id` from the top level of a record.
    #[must_use]
    pub fn from_record(record: &Map<String, Value>) -> Self {
        Self {
            org_id: record.get("org_id").and_then(id_string),
            app_id: record.get("app_id").and_then(id_string),
        }
    }
}

impl fmt::Display for RecordContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "org_id={} app_id={}",
            self.org_id.as_deref().unwrap_or("-"),
            self.app_id.as_deref().unwrap_or("-")
        )
    }
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// The record filter.
///
/// Holds only read-only configuration and a shared geocoder, so one
/// instance can serve many worker threads at once.
pub struct GeoTagFilter<G> {
    config: FilterConfig,
    depth: Depth,
    geocoder: G,
}

impl<G: ReverseGeocoder> GeoTagFilter<G> {
    /// Creates a filter from its configuration and a reverse geocoder.
    #[must_use]
    pub fn new(config: FilterConfig, geocoder: G) -> Self {
        let depth = Depth::from(config.properties_dig_level);
        Self {
            config,
            depth,
            geocoder,
        }
    }

    /// Enriches one record and returns it. Non-object records are returned
    /// unchanged.
    #[must_use]
    pub fn filter(&self, record: Value) -> Value {
        match record {
            Value::Object(mut map) => {
                self.filter_map(&mut map);
                Value::Object(map)
            }
            other => {
                log::debug!("Passing through non-object record");
                other
            }
        }
    }

    /// Enriches a record in place.
    pub fn filter_map(&self, record: &mut Map<String, Value>) {
        let context = RecordContext::from_record(record);

        geojson::apply(record, &self.config, self.depth, &context);
        geo_fields::apply(record, &self.geocoder, &context);
    }
}
