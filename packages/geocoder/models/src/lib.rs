#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Reverse geocoding capability.
//!
//! The field walker only needs `lookup(lat, lon)`. Anything that can answer
//! that (an in-memory boundary index, a cache in front of one, a test fake)
//! implements [`ReverseGeocoder`] and is injected at construction.

use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;

/// Fields merged into an enriched point (e.g. `city`, `country_code`).
pub type Enrichment = Map<String, Value>;

/// Errors from a reverse geocoding lookup.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// The backend failed to answer.
    #[error("Lookup failed: {message}")]
    Lookup {
        /// Description of the failure.
        message: String,
    },

    /// The coordinates are outside what the backend accepts.
    #[error("Invalid coordinates: ({lat}, {lon})")]
    InvalidCoordinates {
        /// Latitude that was looked up.
        lat: f64,
        /// Longitude that was looked up.
        lon: f64,
    },
}

/// Resolves a coordinate pair to enrichment fields.
///
/// Implementations are shared between concurrent filter invocations and
/// must be fast, local and side-effect free from the caller's point of
/// view. `Ok(None)` means "nothing known about this location".
pub trait ReverseGeocoder: Send + Sync {
    /// Looks up enrichment data for a point.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the backend cannot answer. Callers treat
    /// this the same as `Ok(None)`.
    fn lookup(&self, lat: f64, lon: f64) -> Result<Option<Enrichment>, GeocodeError>;
}

impl<T: ReverseGeocoder + ?Sized> ReverseGeocoder for &T {
    fn lookup(&self, lat: f64, lon: f64) -> Result<Option<Enrichment>, GeocodeError> {
        (**self).lookup(lat, lon)
    }
}

impl<T: ReverseGeocoder + ?Sized> ReverseGeocoder for Arc<T> {
    fn lookup(&self, lat: f64, lon: f64) -> Result<Option<Enrichment>, GeocodeError> {
        (**self).lookup(lat, lon)
    }
}

impl<T: ReverseGeocoder + ?Sized> ReverseGeocoder for Box<T> {
    fn lookup(&self, lat: f64, lon: f64) -> Result<Option<Enrichment>, GeocodeError> {
        (**self).lookup(lat, lon)
    }
}

/// A geocoder that knows nothing. Points pass through unenriched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopGeocoder;

impl ReverseGeocoder for NoopGeocoder {
    fn lookup(&self, _lat: f64, _lon: f64) -> Result<Option<Enrichment>, GeocodeError> {
        Ok(None)
    }
}
