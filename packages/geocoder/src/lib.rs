#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Local reverse geocoders for the geotag field walker.
//!
//! Both implementations answer from memory with no network I/O, so they
//! can sit on the enrichment path without adding backpressure:
//!
//! 1. [`BoundaryGeocoder`]: R-tree point-in-polygon lookups over a
//!    `GeoJSON` `FeatureCollection` of named areas. A hit returns the
//!    containing feature's `properties`.
//! 2. [`CachedGeocoder`]: memoises another geocoder's answers by rounded
//!    coordinates.

pub mod boundary;
pub mod cache;

pub use boundary::{BoundaryError, BoundaryGeocoder};
pub use cache::CachedGeocoder;
pub use geotag_geocoder_models::{Enrichment, GeocodeError, NoopGeocoder, ReverseGeocoder};

/// Rejects coordinates outside the WGS84 range.
///
/// # Errors
///
/// Returns [`GeocodeError::InvalidCoordinates`] if `lat` is outside
/// `[-90, 90]`, `lon` is outside `[-180, 180]`, or either is not finite.
pub fn validate_coordinates(lat: f64, lon: f64) -> Result<(), GeocodeError> {
    if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        Err(GeocodeError::InvalidCoordinates { lat, lon })
    }
}
