#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Heuristic geographic point detection for JSON objects.
//!
//! Request and response bodies encode locations in many ways: a `GeoJSON`
//! geometry, `lat`/`lon` siblings, a `"lat,lon"` string under `location`,
//! a `geo*` field, and so on. [`extract`] tries each convention in a fixed
//! priority order and returns the first one that yields a valid point.
//!
//! Key matching is case-insensitive.

pub mod parsing;

use std::collections::BTreeMap;

use geotag_geometry::{GeometryError, convert_to_point};
use geotag_geometry_models::{Centroid, GeoPoint};
use serde_json::{Map, Value};
use thiserror::Error;

pub use parsing::{pair, parse_lat_lon};

/// Faults raised while scanning a candidate object.
///
/// Never escapes [`extract`]; it is logged and the object is treated as
/// having no point.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// An embedded geometry could not be converted.
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    /// A `POINT` string without a parenthesised body.
    #[error("Malformed POINT string: {value}")]
    MalformedWkt {
        /// The offending string.
        value: String,
    },
}

/// A point (or points) found in an object.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// The object itself is the location (a geometry or `lat`/`lon` style
    /// siblings).
    Own(Centroid),
    /// A single field of the object holds the location.
    Carried {
        /// Name of the field that held the location.
        carrier: String,
        /// The parsed point.
        point: GeoPoint,
    },
}

impl Extraction {
    fn carried(point: GeoPoint, carrier: &str) -> Self {
        Self::Carried {
            carrier: carrier.to_string(),
            point,
        }
    }
}

/// Lower-cased view of an object's keys. The first key wins when two keys
/// differ only by case.
struct Fields<'a> {
    record: &'a Map<String, Value>,
    by_lower: BTreeMap<String, &'a Value>,
}

impl<'a> Fields<'a> {
    fn new(record: &'a Map<String, Value>) -> Self {
        let mut by_lower = BTreeMap::new();
        for (key, value) in record {
            by_lower.entry(key.to_lowercase()).or_insert(value);
        }
        Self { record, by_lower }
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.by_lower.get(key).copied()
    }

    fn both(&self, a: &str, b: &str) -> Option<(&'a Value, &'a Value)> {
        Some((self.get(a)?, self.get(b)?))
    }
}

type Rule = fn(&Fields<'_>) -> Result<Option<Extraction>, ExtractError>;

/// Extraction rules in priority order. The first rule producing a point
/// wins; a rule that matches its keys but produces nothing falls through
/// to the next one.
const RULES: &[(&str, Rule)] = &[
    ("geometry", geometry),
    ("lat/lon", lat_lon),
    ("latitude/longitude", latitude_longitude),
    ("lat/lng", lat_lng),
    ("location", location),
    ("latlng", latlng),
    ("coordinates", coordinates),
    ("position", position),
    ("geo*", geo_prefixed),
];

/// Determines whether `record` encodes a geographic point.
///
/// Returns `None` when no convention matches. An unrecognised or empty
/// geometry is skipped like any other invalid candidate. Faults (malformed
/// geometry coordinates, a `POINT` string without parentheses) are logged at
/// debug level and also produce `None`.
#[must_use]
pub fn extract(record: &Map<String, Value>) -> Option<Extraction> {
    let fields = Fields::new(record);

    for (name, rule) in RULES {
        match rule(&fields) {
            Ok(Some(extraction)) => {
                log::trace!("Matched geo point via {name} rule");
                return Some(extraction);
            }
            Ok(None) => {}
            Err(e) => {
                log::debug!("Geo point extraction failed in {name} rule: {e}");
                return None;
            }
        }
    }

    None
}

fn geometry(fields: &Fields<'_>) -> Result<Option<Extraction>, ExtractError> {
    if fields.both("type", "coordinates").is_none() {
        return Ok(None);
    }

    let mut geometry = Map::new();
    for key in ["type", "coordinates"] {
        if let Some(value) = fields.get(key) {
            geometry.insert(key.to_string(), value.clone());
        }
    }

    match convert_to_point(&Value::Object(geometry)) {
        Ok(centroid) => Ok(Some(Extraction::Own(centroid))),
        Err(
            e @ (GeometryError::UnsupportedType(_)
            | GeometryError::MissingType
            | GeometryError::EmptyCoordinates),
        ) => {
            log::warn!("Ignoring geometry candidate: {e}");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn lat_lon(fields: &Fields<'_>) -> Result<Option<Extraction>, ExtractError> {
    Ok(paired(fields, "lat", "lon"))
}

fn latitude_longitude(fields: &Fields<'_>) -> Result<Option<Extraction>, ExtractError> {
    Ok(paired(fields, "latitude", "longitude"))
}

fn lat_lng(fields: &Fields<'_>) -> Result<Option<Extraction>, ExtractError> {
    Ok(paired(fields, "lat", "lng"))
}

fn location(fields: &Fields<'_>) -> Result<Option<Extraction>, ExtractError> {
    carried(fields, "location")
}

fn latlng(fields: &Fields<'_>) -> Result<Option<Extraction>, ExtractError> {
    carried(fields, "latlng")
}

fn coordinates(fields: &Fields<'_>) -> Result<Option<Extraction>, ExtractError> {
    carried(fields, "coordinates")
}

fn position(fields: &Fields<'_>) -> Result<Option<Extraction>, ExtractError> {
    carried(fields, "position")
}

fn paired(fields: &Fields<'_>, lat: &str, lon: &str) -> Option<Extraction> {
    let (lat, lon) = fields.both(lat, lon)?;
    pair(lat, lon).map(|point| Extraction::Own(point.into()))
}

fn carried(fields: &Fields<'_>, key: &str) -> Result<Option<Extraction>, ExtractError> {
    let Some(value) = fields.get(key) else {
        return Ok(None);
    };
    Ok(parse_lat_lon(value)?.map(|point| Extraction::carried(point, key)))
}

fn geo_prefixed(fields: &Fields<'_>) -> Result<Option<Extraction>, ExtractError> {
    for (key, value) in fields.record {
        if !key.to_lowercase().starts_with("geo") {
            continue;
        }
        if let Some(point) = parse_lat_lon(value)? {
            return Ok(Some(Extraction::carried(point, key)));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(value: &Value) -> Option<Extraction> {
        extract(value.as_object().unwrap())
    }

    fn own_point(lat: f64, lon: f64) -> Option<Extraction> {
        Some(Extraction::Own(Centroid::Single(GeoPoint { lat, lon })))
    }

    fn carried_point(lat: f64, lon: f64, carrier: &str) -> Option<Extraction> {
        Some(Extraction::Carried {
            carrier: carrier.to_string(),
            point: GeoPoint { lat, lon },
        })
    }

    #[test]
    fn lat_lon_and_latitude_longitude_agree() {
        let a = run(&json!({"lat": 1.5, "lon": 2.5}));
        let b = run(&json!({"latitude": 1.5, "longitude": 2.5}));
        assert_eq!(a, own_point(1.5, 2.5));
        assert_eq!(a, b);
    }

    #[test]
    fn lat_lng_is_recognised() {
        assert_eq!(run(&json!({"lat": "1.5", "lng": "2.5"})), own_point(1.5, 2.5));
    }

    #[test]
    fn keys_are_case_insensitive() {
        assert_eq!(run(&json!({"Lat": 1.5, "LON": 2.5})), own_point(1.5, 2.5));
        assert_eq!(
            run(&json!({"Location": "1.5,2.5"})),
            carried_point(1.5, 2.5, "location")
        );
    }

    #[test]
    fn geometry_rule_has_no_carrier() {
        assert_eq!(
            run(&json!({"type": "Point", "coordinates": [125.6, 10.1]})),
            own_point(10.1, 125.6)
        );
    }

    #[test]
    fn geometry_rule_returns_all_points_of_multi_geometries() {
        let extraction = run(&json!({
            "type": "MultiPoint",
            "coordinates": [[100.0, 0.0], [101.0, 1.0]]
        }))
        .unwrap();

        let Extraction::Own(centroid) = extraction else {
            panic!("expected the geometry to be the object's own location");
        };
        assert_eq!(centroid.points().len(), 2);
    }

    #[test]
    fn unsupported_geometry_type_falls_through() {
        assert_eq!(
            run(&json!({"type": "store", "coordinates": "1.5,2.5"})),
            carried_point(1.5, 2.5, "coordinates")
        );
        assert_eq!(
            run(&json!({"type": "Feature", "coordinates": [9.0, 9.0], "lat": 3.0, "lon": 4.0})),
            own_point(3.0, 4.0)
        );
    }

    #[test]
    fn empty_geometry_falls_through() {
        assert_eq!(
            run(&json!({"type": "LineString", "coordinates": [], "lat": 1.0, "lon": 2.0})),
            own_point(1.0, 2.0)
        );
    }

    #[test]
    fn malformed_geometry_coordinates_yield_nothing() {
        assert_eq!(
            run(&json!({"type": "Point", "coordinates": ["a", "b"], "lat": 1.0, "lon": 2.0})),
            None
        );
    }

    #[test]
    fn geometry_wins_over_lat_lon() {
        assert_eq!(
            run(&json!({
                "lat": 50.0,
                "lon": 60.0,
                "type": "Point",
                "coordinates": [125.6, 10.1]
            })),
            own_point(10.1, 125.6)
        );
    }

    #[test]
    fn invalid_pair_falls_through_to_later_rules() {
        assert_eq!(
            run(&json!({"lat": "north", "lon": "west", "location": "1.5,2.5"})),
            carried_point(1.5, 2.5, "location")
        );
    }

    #[test]
    fn carrier_rules_follow_priority() {
        assert_eq!(
            run(&json!({"position": [3.0, 4.0], "latlng": "1.5,2.5"})),
            carried_point(1.5, 2.5, "latlng")
        );
        assert_eq!(
            run(&json!({"position": [3.0, 4.0], "coordinates": [5.0, 6.0]})),
            carried_point(5.0, 6.0, "coordinates")
        );
        assert_eq!(
            run(&json!({"position": [3.0, 4.0]})),
            carried_point(3.0, 4.0, "position")
        );
    }

    #[test]
    fn geo_prefixed_key_uses_first_parseable_in_order() {
        assert_eq!(
            run(&json!({
                "geohash": "dp3wjztv",
                "GeoLocation": "POINT(1.5,2.5)",
                "geo_other": [9.0, 9.0]
            })),
            carried_point(1.5, 2.5, "GeoLocation")
        );
    }

    #[test]
    fn malformed_point_string_yields_nothing() {
        assert_eq!(run(&json!({"location": "POINT 1,2"})), None);
    }

    #[test]
    fn nothing_matches_plain_object() {
        assert_eq!(run(&json!({"name": "cafe", "rating": 4})), None);
        assert_eq!(run(&json!({})), None);
    }
}
