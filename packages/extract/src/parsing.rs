//! Coordinate-pair parsing shared by the extraction rules.
//!
//! Accepts the loose encodings seen in request bodies: `"lat,lon"`
//! strings, `POINT(..)` strings, and `[lat, lon]` arrays.

use geotag_geometry_models::GeoPoint;
use serde_json::Value;

use crate::ExtractError;

/// Parses a `lat`/`lon` pair out of a single value.
///
/// * `"POINT(a,b)"` uses the text inside the first parentheses
/// * any other string is split on `,`
/// * arrays use their first two members
///
/// Anything past the first two members is ignored. Returns `Ok(None)` when
/// the value simply does not hold a valid pair.
///
/// The `POINT` form is split on commas as well, so standard WKT
/// (`POINT(30 10)`, space separated) does not parse.
///
/// # Errors
///
/// Returns [`ExtractError::MalformedWkt`] if a `POINT` string has no
/// parenthesised body.
pub fn parse_lat_lon(value: &Value) -> Result<Option<GeoPoint>, ExtractError> {
    match value {
        Value::String(s) if s.starts_with("POINT") => {
            let inner = wkt_body(s).ok_or_else(|| ExtractError::MalformedWkt {
                value: s.clone(),
            })?;
            Ok(split_pair(inner))
        }
        Value::String(s) => Ok(split_pair(s)),
        Value::Array(members) if members.len() >= 2 => Ok(pair(&members[0], &members[1])),
        _ => Ok(None),
    }
}

/// Validates a candidate `(lat, lon)` tuple.
///
/// Valid when both members are JSON numbers, or both are strings that
/// parse completely as floats. Mixed pairs are rejected, as are
/// non-finite results.
#[must_use]
pub fn pair(lat: &Value, lon: &Value) -> Option<GeoPoint> {
    let (lat, lon) = match (lat, lon) {
        (Value::Number(lat), Value::Number(lon)) => (lat.as_f64()?, lon.as_f64()?),
        (Value::String(lat), Value::String(lon)) => (parse_float(lat)?, parse_float(lon)?),
        _ => return None,
    };

    GeoPoint::new(lat, lon)
}

fn split_pair(s: &str) -> Option<GeoPoint> {
    let mut tokens = s.split(',');
    let lat = parse_float(tokens.next()?)?;
    let lon = parse_float(tokens.next()?)?;
    GeoPoint::new(lat, lon)
}

fn parse_float(token: &str) -> Option<f64> {
    token.trim().parse::<f64>().ok()
}

/// Text between the first `(` and the next `)`.
fn wkt_body(s: &str) -> Option<&str> {
    let open = s.find('(')?;
    let rest = &s[open + 1..];
    let close = rest.find(')')?;
    Some(&rest[..close])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parsed(value: &Value) -> Option<GeoPoint> {
        parse_lat_lon(value).unwrap()
    }

    #[test]
    fn parses_comma_separated_string() {
        assert_eq!(
            parsed(&json!("41.8781,-87.6298")),
            Some(GeoPoint { lat: 41.8781, lon: -87.6298 })
        );
    }

    #[test]
    fn trims_whitespace_around_tokens() {
        assert_eq!(
            parsed(&json!(" 1.5 , 2.5 ")),
            Some(GeoPoint { lat: 1.5, lon: 2.5 })
        );
    }

    #[test]
    fn parses_point_string_with_commas() {
        assert_eq!(
            parsed(&json!("POINT(1.5, 2.5)")),
            Some(GeoPoint { lat: 1.5, lon: 2.5 })
        );
    }

    #[test]
    fn space_separated_point_string_does_not_parse() {
        assert_eq!(parsed(&json!("POINT(30 10)")), None);
    }

    #[test]
    fn point_string_without_parentheses_is_malformed() {
        assert!(matches!(
            parse_lat_lon(&json!("POINT 1,2")),
            Err(ExtractError::MalformedWkt { .. })
        ));
    }

    #[test]
    fn parses_numeric_array_and_ignores_extra_members() {
        assert_eq!(
            parsed(&json!([1.5, 2.5, 100.0])),
            Some(GeoPoint { lat: 1.5, lon: 2.5 })
        );
    }

    #[test]
    fn parses_string_array() {
        assert_eq!(
            parsed(&json!(["1.5", "2.5"])),
            Some(GeoPoint { lat: 1.5, lon: 2.5 })
        );
    }

    #[test]
    fn rejects_mixed_array() {
        assert_eq!(parsed(&json!([1.5, "2.5"])), None);
    }

    #[test]
    fn rejects_partial_numbers() {
        assert_eq!(parsed(&json!("1.5abc,2.5")), None);
        assert_eq!(parsed(&json!("1.5")), None);
    }

    #[test]
    fn rejects_non_finite_values() {
        assert_eq!(parsed(&json!("NaN,1.0")), None);
        assert_eq!(parsed(&json!("inf,1.0")), None);
    }

    #[test]
    fn rejects_short_arrays_and_other_types() {
        assert_eq!(parsed(&json!([1.5])), None);
        assert_eq!(parsed(&json!({"lat": 1.5, "lon": 2.5})), None);
        assert_eq!(parsed(&json!(true)), None);
        assert_eq!(parsed(&Value::Null), None);
    }
}
