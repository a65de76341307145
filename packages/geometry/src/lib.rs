#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Representative points for `GeoJSON` geometry objects.
//!
//! Converts a geometry (`{ "type": .., "coordinates": .. }`) into one or
//! more [`GeoPoint`]s suitable for a `geo_point` index field:
//!
//! - `Point` maps directly.
//! - `LineString` and `Polygon` collapse to the arithmetic mean of their
//!   vertices. Polygons only use the exterior ring, minus its closing
//!   vertex. This is a vertex average, not an area-weighted centroid.
//! - `MultiPoint` and `MultiPolygon` keep one point per member, in order.
//!
//! The `type` tag is matched case-insensitively.

use std::str::FromStr;

use geo::{Coord, LineString};
use geotag_geometry_models::{Centroid, GeoPoint};
use serde_json::Value;
use strum_macros::EnumString;
use thiserror::Error;

/// Errors from converting a geometry into representative points.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// The `type` tag is not one of the supported geometry types.
    #[error("Unsupported geometry type: {0}")]
    UnsupportedType(String),

    /// The geometry has no string `type` tag.
    #[error("Geometry is missing its type")]
    MissingType,

    /// A vertex list that must be averaged is empty.
    #[error("Geometry has no coordinates to average")]
    EmptyCoordinates,

    /// The `coordinates` member does not have the shape the type requires.
    #[error("Malformed coordinates: {message}")]
    MalformedCoordinates {
        /// Description of what was wrong.
        message: String,
    },
}

/// Geometry types that can be reduced to representative points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum GeometryKind {
    /// A single position.
    Point,
    /// An ordered list of positions.
    LineString,
    /// A list of linear rings; only the first (exterior) ring is used.
    Polygon,
    /// A list of independent positions.
    MultiPoint,
    /// A list of polygons.
    MultiPolygon,
}

/// Converts a `GeoJSON` geometry object into its representative point(s).
///
/// # Errors
///
/// * [`GeometryError::MissingType`] if `type` is absent or not a string
/// * [`GeometryError::UnsupportedType`] for any type other than the five
///   supported ones
/// * [`GeometryError::EmptyCoordinates`] if a vertex list to average is empty
/// * [`GeometryError::MalformedCoordinates`] if `coordinates` is not shaped
///   like the declared type
pub fn convert_to_point(geometry: &Value) -> Result<Centroid, GeometryError> {
    let type_tag = geometry
        .get("type")
        .and_then(Value::as_str)
        .ok_or(GeometryError::MissingType)?;

    let kind = GeometryKind::from_str(type_tag)
        .map_err(|_| GeometryError::UnsupportedType(type_tag.to_string()))?;

    let coordinates = geometry.get("coordinates").unwrap_or(&Value::Null);

    match kind {
        GeometryKind::Point => Ok(Centroid::Single(to_point(position(coordinates)?)?)),
        GeometryKind::LineString => Ok(Centroid::Single(vertex_mean(&line_string(coordinates)?)?)),
        GeometryKind::Polygon => Ok(Centroid::Single(polygon_centroid(coordinates)?)),
        GeometryKind::MultiPoint => array(coordinates, "MultiPoint")?
            .iter()
            .map(|p| to_point(position(p)?))
            .collect::<Result<Vec<_>, _>>()
            .map(Centroid::Multiple),
        GeometryKind::MultiPolygon => array(coordinates, "MultiPolygon")?
            .iter()
            .map(polygon_centroid)
            .collect::<Result<Vec<_>, _>>()
            .map(Centroid::Multiple),
    }
}

/// Averages the exterior ring of a polygon, excluding the closing vertex.
fn polygon_centroid(polygon: &Value) -> Result<GeoPoint, GeometryError> {
    let ring = array(polygon, "Polygon")?
        .first()
        .ok_or(GeometryError::EmptyCoordinates)?;

    let LineString(mut coords) = line_string(ring)?;
    coords.pop();

    vertex_mean(&LineString(coords))
}

/// Arithmetic mean of every vertex. Fails instead of dividing by zero.
#[allow(clippy::cast_precision_loss)]
fn vertex_mean(line: &LineString<f64>) -> Result<GeoPoint, GeometryError> {
    if line.0.is_empty() {
        return Err(GeometryError::EmptyCoordinates);
    }

    let count = line.0.len() as f64;
    let (sum_x, sum_y) = line
        .coords()
        .fold((0.0, 0.0), |(x, y), c| (x + c.x, y + c.y));

    to_point(Coord {
        x: sum_x / count,
        y: sum_y / count,
    })
}

fn line_string(value: &Value) -> Result<LineString<f64>, GeometryError> {
    array(value, "LineString")?
        .iter()
        .map(position)
        .collect::<Result<Vec<_>, _>>()
        .map(LineString::new)
}

/// Reads a `[lon, lat, ..]` position. Extra members (altitude) are ignored.
fn position(value: &Value) -> Result<Coord<f64>, GeometryError> {
    let members = array(value, "position")?;

    match (
        members.first().and_then(Value::as_f64),
        members.get(1).and_then(Value::as_f64),
    ) {
        (Some(x), Some(y)) => Ok(Coord { x, y }),
        _ => Err(GeometryError::MalformedCoordinates {
            message: format!("expected a numeric [lon, lat] position, got {value}"),
        }),
    }
}

fn to_point(coord: Coord<f64>) -> Result<GeoPoint, GeometryError> {
    GeoPoint::new(coord.y, coord.x).ok_or_else(|| GeometryError::MalformedCoordinates {
        message: format!("non-finite position ({}, {})", coord.x, coord.y),
    })
}

fn array<'a>(value: &'a Value, what: &str) -> Result<&'a Vec<Value>, GeometryError> {
    value
        .as_array()
        .ok_or_else(|| GeometryError::MalformedCoordinates {
            message: format!("{what} coordinates must be an array"),
        })
}
