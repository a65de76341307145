//! `GeoJSON` feature handling: property flattening and geometry centroid.

use geotag_filter_models::FilterConfig;
use geotag_flatten::{Depth, flatten_properties};
use geotag_geometry::convert_to_point;
use serde_json::{Map, Value};

use crate::{FilterError, RecordContext};

/// Flattens `properties` into the record and writes the centroid of
/// `geometry` to the configured key.
///
/// A geometry that cannot be converted leaves the centroid key unset; the
/// rest of the record is still processed.
pub fn apply(
    record: &mut Map<String, Value>,
    config: &FilterConfig,
    depth: Depth,
    context: &RecordContext,
) {
    flatten_properties(record, depth, &config.properties_ignore_list);

    if let Err(e) = apply_centroid(record, &config.geometry_centroid_key) {
        log::warn!("[{context}] Skipping geometry centroid: {e}");
    }
}

/// Writes the centroid of the record's `geometry` under `key`. Records
/// without a geometry (or with a `null` one) are left alone.
///
/// # Errors
///
/// Returns [`FilterError::Geometry`] if the geometry is unsupported or
/// malformed.
pub fn apply_centroid(record: &mut Map<String, Value>, key: &str) -> Result<(), FilterError> {
    let centroid = match record.get("geometry") {
        None | Some(Value::Null) => return Ok(()),
        Some(geometry) => convert_to_point(geometry)?,
    };

    record.insert(key.to_string(), centroid.to_json());
    Ok(())
}
