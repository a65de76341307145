#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Point and centroid types shared by the geotag enrichment crates.
//!
//! A [`GeoPoint`] is the unit every component produces: the centroid
//! converter, the point extractor, and the field walker all hand points
//! around as `{ "lat": .., "lon": .. }` objects.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A WGS84 coordinate pair. Both components are always finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

impl GeoPoint {
    /// Creates a point, returning `None` if either component is NaN or
    /// infinite.
    #[must_use]
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        if lat.is_finite() && lon.is_finite() {
            Some(Self { lat, lon })
        } else {
            None
        }
    }

    /// Renders the point as a `{ "lat": .., "lon": .. }` JSON object.
    #[must_use]
    pub fn to_json_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("lat".to_string(), number(self.lat));
        map.insert("lon".to_string(), number(self.lon));
        map
    }

    /// Renders the point as a JSON value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(self.to_json_map())
    }
}

/// The representative point(s) of a geometry.
///
/// Single-shape geometries collapse to one point; multi-shape geometries
/// keep one point per member, in input order.
#[derive(Debug, Clone, PartialEq)]
pub enum Centroid {
    /// One representative point.
    Single(GeoPoint),
    /// One point per member of a multi-geometry.
    Multiple(Vec<GeoPoint>),
}

impl Centroid {
    /// Returns the contained points in order.
    #[must_use]
    pub fn points(&self) -> Vec<GeoPoint> {
        match self {
            Self::Single(point) => vec![*point],
            Self::Multiple(points) => points.clone(),
        }
    }

    /// Renders the centroid as a point object or an array of point objects.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Single(point) => point.to_json(),
            Self::Multiple(points) => Value::Array(points.iter().map(GeoPoint::to_json).collect()),
        }
    }
}

impl From<GeoPoint> for Centroid {
    fn from(point: GeoPoint) -> Self {
        Self::Single(point)
    }
}

fn number(value: f64) -> Value {
    serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
}
