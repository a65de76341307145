//! Lookup cache in front of another reverse geocoder.
//!
//! Caches both hits and misses (`None`) so repeated coordinates in a
//! stream of records do not re-query the inner geocoder. Failed lookups
//! are not cached.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use geotag_geocoder_models::{Enrichment, GeocodeError, ReverseGeocoder};

/// Coordinates scaled by `10^precision` and rounded.
type CacheKey = (i64, i64);

/// Memoising wrapper around a [`ReverseGeocoder`].
pub struct CachedGeocoder<G> {
    inner: G,
    scale: f64,
    max_entries: usize,
    entries: Mutex<BTreeMap<CacheKey, Option<Enrichment>>>,
}

impl<G: ReverseGeocoder> CachedGeocoder<G> {
    /// Default number of decimal places kept in the cache key
    /// (about 1.1 m at the equator).
    pub const DEFAULT_PRECISION: u8 = 5;

    /// Default maximum number of cached coordinates.
    pub const DEFAULT_MAX_ENTRIES: usize = 100_000;

    /// Wraps `inner` with the default precision and capacity.
    #[must_use]
    pub fn new(inner: G) -> Self {
        Self::with_limits(inner, Self::DEFAULT_PRECISION, Self::DEFAULT_MAX_ENTRIES)
    }

    /// Wraps `inner`, keying entries on coordinates rounded to `precision`
    /// decimal places. Once `max_entries` is reached the cache is cleared.
    #[must_use]
    pub fn with_limits(inner: G, precision: u8, max_entries: usize) -> Self {
        Self {
            inner,
            scale: 10_f64.powi(i32::from(precision)),
            max_entries,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// Number of cached coordinates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing is cached yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[allow(clippy::cast_possible_truncation)]
    fn key(&self, lat: f64, lon: f64) -> CacheKey {
        (
            (lat * self.scale).round() as i64,
            (lon * self.scale).round() as i64,
        )
    }
}

impl<G: ReverseGeocoder> ReverseGeocoder for CachedGeocoder<G> {
    fn lookup(&self, lat: f64, lon: f64) -> Result<Option<Enrichment>, GeocodeError> {
        let key = self.key(lat, lon);

        if let Some(cached) = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(cached.clone());
        }

        // The lock is not held across the inner lookup; two workers racing
        // on the same key both query and store the same answer.
        let found = self.inner.lookup(lat, lon)?;

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.len() >= self.max_entries {
            log::debug!("Geocode cache full ({} entries), clearing", entries.len());
            entries.clear();
        }
        entries.insert(key, found.clone());

        Ok(found)
    }
}
