#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Finds geographic points anywhere inside an arbitrary JSON document.
//!
//! [`walk`] runs the point extractor on every object in the tree, reverse
//! geocodes each hit, and returns a sparse mirror of the input: only the
//! branches that led to a point survive, and empty objects or arrays are
//! never emitted.
//!
//! For an object that is itself a location, its enrichment fields and a
//! `geo_point` member are written at that object's position. For a
//! location found under a named field (`location`, `geo_hint`, ..), the
//! enrichment is nested under that field's name instead.

use geotag_extract::{Extraction, extract};
use geotag_geocoder_models::{Enrichment, ReverseGeocoder};
use geotag_geometry_models::{Centroid, GeoPoint};
use serde_json::{Map, Value};

/// Key holding the detected point inside each enrichment object.
pub const GEO_POINT_KEY: &str = "geo_point";

/// Key holding the enrichment list of an object that is itself a
/// multi-point location.
pub const GEO_POINTS_KEY: &str = "geo_points";

/// Walks `value` and returns the geo-relevant subset of it, or `None` if
/// no point was found anywhere below it.
#[must_use]
pub fn walk<G: ReverseGeocoder + ?Sized>(value: &Value, geocoder: &G) -> Option<Value> {
    match value {
        Value::Object(map) => walk_object(map, geocoder),
        Value::Array(items) => {
            let found: Vec<Value> = items
                .iter()
                .filter_map(|item| walk(item, geocoder))
                .collect();
            if found.is_empty() {
                None
            } else {
                Some(Value::Array(found))
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => None,
    }
}

fn walk_object<G: ReverseGeocoder + ?Sized>(
    map: &Map<String, Value>,
    geocoder: &G,
) -> Option<Value> {
    let mut out = Map::new();

    match extract(map) {
        Some(Extraction::Own(Centroid::Single(point))) => out.extend(enrich(point, geocoder)),
        Some(Extraction::Own(Centroid::Multiple(points))) => {
            out.insert(GEO_POINTS_KEY.to_string(), enrich_all(&points, geocoder));
        }
        Some(Extraction::Carried { carrier, point }) => {
            out.insert(carrier, Value::Object(enrich(point, geocoder)));
        }
        None => {}
    }

    for (key, child) in map {
        if out.contains_key(key) {
            continue;
        }
        if let Some(found) = walk(child, geocoder) {
            out.insert(key.clone(), found);
        }
    }

    if out.is_empty() {
        None
    } else {
        Some(Value::Object(out))
    }
}

fn enrich_all<G: ReverseGeocoder + ?Sized>(points: &[GeoPoint], geocoder: &G) -> Value {
    Value::Array(
        points
            .iter()
            .map(|point| Value::Object(enrich(*point, geocoder)))
            .collect(),
    )
}

/// Lookup fields for `point` plus the point itself under [`GEO_POINT_KEY`].
/// A failed or empty lookup still yields the point.
fn enrich<G: ReverseGeocoder + ?Sized>(point: GeoPoint, geocoder: &G) -> Enrichment {
    let mut enrichment = match geocoder.lookup(point.lat, point.lon) {
        Ok(Some(found)) => found,
        Ok(None) => {
            log::trace!("No reverse geocode match for ({}, {})", point.lat, point.lon);
            Enrichment::new()
        }
        Err(e) => {
            log::debug!(
                "Reverse geocode failed for ({}, {}): {e}",
                point.lat,
                point.lon
            );
            Enrichment::new()
        }
    };

    enrichment.insert(GEO_POINT_KEY.to_string(), point.to_json());
    enrichment
}

#[cfg(test)]
mod tests {
    use geotag_geocoder_models::{GeocodeError, NoopGeocoder};
    use serde_json::json;

    use super::*;

    /// Knows one city in the northern hemisphere and fails south of the
    /// equator.
    struct FakeGeocoder;

    impl ReverseGeocoder for FakeGeocoder {
        fn lookup(&self, lat: f64, _lon: f64) -> Result<Option<Enrichment>, GeocodeError> {
            if lat < 0.0 {
                return Err(GeocodeError::Lookup {
                    message: "offline".to_string(),
                });
            }
            if lat > 80.0 {
                return Ok(None);
            }
            let mut found = Enrichment::new();
            found.insert("city".to_string(), json!("Springfield"));
            Ok(Some(found))
        }
    }

    #[test]
    fn scalars_are_pruned() {
        assert_eq!(walk(&json!("1.5,2.5"), &FakeGeocoder), None);
        assert_eq!(walk(&json!(42), &FakeGeocoder), None);
        assert_eq!(walk(&Value::Null, &FakeGeocoder), None);
    }

    #[test]
    fn body_without_geo_content_is_pruned() {
        let body = json!({
            "user": {"name": "alice", "tags": ["a", "b"]},
            "items": [{"sku": 1}, {"sku": 2}],
            "empty": {}
        });
        assert_eq!(walk(&body, &FakeGeocoder), None);
    }

    #[test]
    fn object_that_is_a_location_is_enriched_in_place() {
        let found = walk(&json!({"lat": 1.5, "lon": 2.5, "name": "cafe"}), &FakeGeocoder);
        assert_eq!(
            found,
            Some(json!({
                "city": "Springfield",
                "geo_point": {"lat": 1.5, "lon": 2.5}
            }))
        );
    }

    #[test]
    fn carried_location_is_nested_under_its_field() {
        let found = walk(&json!({"id": 7, "location": "1.5,2.5"}), &FakeGeocoder);
        assert_eq!(
            found,
            Some(json!({
                "location": {
                    "city": "Springfield",
                    "geo_point": {"lat": 1.5, "lon": 2.5}
                }
            }))
        );
    }

    #[test]
    fn non_geometry_type_tag_does_not_hide_coordinates() {
        let found = walk(
            &json!({"type": "store", "coordinates": "1.5,2.5"}),
            &FakeGeocoder,
        );
        assert_eq!(
            found,
            Some(json!({
                "coordinates": {
                    "city": "Springfield",
                    "geo_point": {"lat": 1.5, "lon": 2.5}
                }
            }))
        );
    }

    #[test]
    fn nested_branches_are_mirrored_and_empty_ones_pruned() {
        let body = json!({
            "order": {
                "id": 1,
                "shipping": {"address": {"latitude": "10.0", "longitude": "20.0"}},
                "billing": {"zip": "12345"}
            },
            "meta": {"version": 2}
        });

        let found = walk(&body, &NoopGeocoder);
        assert_eq!(
            found,
            Some(json!({
                "order": {
                    "shipping": {
                        "address": {"geo_point": {"lat": 10.0, "lon": 20.0}}
                    }
                }
            }))
        );
    }

    #[test]
    fn arrays_keep_only_elements_with_points() {
        let body = json!([
            {"name": "no geo"},
            {"lat": 1.0, "lon": 2.0},
            "text",
            [{"position": [3.0, 4.0]}]
        ]);

        let found = walk(&body, &NoopGeocoder);
        assert_eq!(
            found,
            Some(json!([
                {"geo_point": {"lat": 1.0, "lon": 2.0}},
                [{"position": {"geo_point": {"lat": 3.0, "lon": 4.0}}}]
            ]))
        );
    }

    #[test]
    fn failed_and_empty_lookups_still_emit_the_point() {
        assert_eq!(
            walk(&json!({"lat": -1.0, "lon": 2.0}), &FakeGeocoder),
            Some(json!({"geo_point": {"lat": -1.0, "lon": 2.0}}))
        );
        assert_eq!(
            walk(&json!({"lat": 85.0, "lon": 2.0}), &FakeGeocoder),
            Some(json!({"geo_point": {"lat": 85.0, "lon": 2.0}}))
        );
    }

    #[test]
    fn multi_point_geometry_lists_every_point() {
        let body = json!({
            "type": "MultiPoint",
            "coordinates": [[100.0, 0.0], [101.0, 1.0]]
        });

        let found = walk(&body, &NoopGeocoder);
        assert_eq!(
            found,
            Some(json!({
                "geo_points": [
                    {"geo_point": {"lat": 0.0, "lon": 100.0}},
                    {"geo_point": {"lat": 1.0, "lon": 101.0}}
                ]
            }))
        );
    }

    #[test]
    fn own_point_and_nested_points_are_both_kept() {
        let body = json!({
            "lat": 1.0,
            "lon": 2.0,
            "stops": [{"geo_hint": "3.0,4.0"}]
        });

        let found = walk(&body, &NoopGeocoder);
        assert_eq!(
            found,
            Some(json!({
                "geo_point": {"lat": 1.0, "lon": 2.0},
                "stops": [{"geo_hint": {"geo_point": {"lat": 3.0, "lon": 4.0}}}]
            }))
        );
    }

    #[test]
    fn works_through_trait_objects() {
        let geocoder: Box<dyn ReverseGeocoder> = Box::new(FakeGeocoder);
        let found = walk(&json!({"geo": {"lat": 1.0, "lng": 2.0}}), geocoder.as_ref());
        assert_eq!(
            found,
            Some(json!({
                "geo": {"city": "Springfield", "geo_point": {"lat": 1.0, "lon": 2.0}}
            }))
        );
    }
}
