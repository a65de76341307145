//! Geo field discovery for captured HTTP requests and responses.
//!
//! For each of `request.body`, `request.query` and `response.body`, the
//! sub-document is parsed (if it is a string), searched with the field
//! walker, and the result written to `geo_fields.body` / `geo_fields.query`
//! next to it. A missing, unparseable or non-JSON field gets an empty
//! object.

use std::borrow::Cow;

use geotag_geocoder_models::ReverseGeocoder;
use geotag_walker::walk;
use serde_json::{Map, Value};

use crate::{FilterError, RecordContext};

/// Key of the output object written into `request` / `response`.
pub const GEO_FIELDS_KEY: &str = "geo_fields";

const JSON_MEDIA_TYPE: &str = "application/json";

/// One sub-document to search.
struct Target {
    section: &'static str,
    field: &'static str,
    label: &'static str,
    /// Whether the section's `Content-Type` header applies to this field.
    typed: bool,
}

const REQUEST_TARGETS: &[Target] = &[
    Target {
        section: "request",
        field: "body",
        label: "request.body",
        typed: true,
    },
    Target {
        section: "request",
        field: "query",
        label: "request.query",
        typed: false,
    },
];

const RESPONSE_TARGETS: &[Target] = &[Target {
    section: "response",
    field: "body",
    label: "response.body",
    typed: true,
}];

/// Writes `geo_fields` into the record's `request` and `response` objects.
/// Sections that are absent (or not objects) are skipped.
pub fn apply<G: ReverseGeocoder + ?Sized>(
    record: &mut Map<String, Value>,
    geocoder: &G,
    context: &RecordContext,
) {
    for targets in [REQUEST_TARGETS, RESPONSE_TARGETS] {
        let Some(Value::Object(section)) = record.get_mut(targets[0].section) else {
            continue;
        };

        let found: Vec<(&'static str, Value)> = targets
            .iter()
            .map(|target| (target.field, field_geo_fields(section, target, geocoder, context)))
            .collect();

        let geo_fields = section
            .entry(GEO_FIELDS_KEY)
            .or_insert_with(|| Value::Object(Map::new()));
        if !geo_fields.is_object() {
            *geo_fields = Value::Object(Map::new());
        }
        if let Value::Object(geo_fields) = geo_fields {
            for (field, value) in found {
                geo_fields.insert(field.to_string(), value);
            }
        }
    }
}

/// Runs the per-field pipeline, degrading every failure to `{}`.
fn field_geo_fields<G: ReverseGeocoder + ?Sized>(
    section: &Map<String, Value>,
    target: &Target,
    geocoder: &G,
    context: &RecordContext,
) -> Value {
    match parse_document(section, target) {
        Ok(Some(document)) => walk(&document, geocoder).unwrap_or_else(empty),
        Ok(None) => {
            log::trace!("[{context}] No {} to search", target.label);
            empty()
        }
        Err(e) => {
            log::warn!("[{context}] {e}");
            empty()
        }
    }
}

/// Fetches the target field as structured JSON.
///
/// Returns `Ok(None)` if the field is absent or `null`.
///
/// # Errors
///
/// * [`FilterError::UnsupportedContentType`] if the section declares a
///   non-JSON content type
/// * [`FilterError::BodyParse`] if the field is a string that is not JSON
fn parse_document<'a>(
    section: &'a Map<String, Value>,
    target: &Target,
) -> Result<Option<Cow<'a, Value>>, FilterError> {
    let raw = match section.get(target.field) {
        None | Some(Value::Null) => return Ok(None),
        Some(raw) => raw,
    };

    if target.typed
        && let Some(content_type) = content_type(section)
        && !is_json_media_type(content_type)
    {
        return Err(FilterError::UnsupportedContentType {
            field: target.label,
            content_type: content_type.to_string(),
        });
    }

    match raw {
        Value::String(text) => serde_json::from_str(text)
            .map(|parsed| Some(Cow::Owned(parsed)))
            .map_err(|source| FilterError::BodyParse {
                field: target.label,
                source,
            }),
        structured => Ok(Some(Cow::Borrowed(structured))),
    }
}

/// Reads the `Content-Type` header, matching the header name
/// case-insensitively. Multi-valued headers use their first value.
fn content_type(section: &Map<String, Value>) -> Option<&str> {
    let Some(Value::Object(headers)) = section.get("headers") else {
        return None;
    };

    headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
        .and_then(|(_, value)| match value {
            Value::String(s) => Some(s.as_str()),
            Value::Array(values) => values.first().and_then(Value::as_str),
            _ => None,
        })
}

/// Compares the media type (parameters such as `charset` stripped)
/// against `application/json`.
fn is_json_media_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(JSON_MEDIA_TYPE))
}

fn empty() -> Value {
    Value::Object(Map::new())
}
