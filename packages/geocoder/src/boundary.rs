//! In-memory boundary index for reverse geocoding.
//!
//! Loads polygon features from a `GeoJSON` `FeatureCollection`, builds an
//! R-tree over their bounding boxes, and answers point-in-polygon lookups.
//! The index is immutable after construction, so concurrent lookups need
//! no locking.

use std::path::Path;

use geo::{Area, BoundingRect, Contains, MultiPolygon};
use geojson::{Feature, FeatureCollection, GeoJson};
use geotag_geocoder_models::{Enrichment, GeocodeError, ReverseGeocoder};
use rstar::{AABB, RTree, RTreeObject};
use thiserror::Error;

use crate::validate_coordinates;

/// Errors from building a [`BoundaryGeocoder`].
#[derive(Debug, Error)]
pub enum BoundaryError {
    /// Reading the boundary file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid `GeoJSON`.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The document is valid `GeoJSON` but not a `FeatureCollection`.
    #[error("Expected a FeatureCollection, got {kind}")]
    NotFeatureCollection {
        /// What the document was instead.
        kind: &'static str,
    },
}

/// A boundary polygon stored in the R-tree with its properties.
struct BoundaryEntry {
    properties: Enrichment,
    area: f64,
    envelope: AABB<[f64; 2]>,
    polygon: MultiPolygon<f64>,
}

impl RTreeObject for BoundaryEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Reverse geocoder backed by a set of named boundary polygons.
///
/// When boundaries overlap, the smallest containing polygon wins, so a
/// neighborhood beats the city that contains it.
pub struct BoundaryGeocoder {
    boundaries: RTree<BoundaryEntry>,
}

impl BoundaryGeocoder {
    /// Loads boundaries from a `GeoJSON` file.
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryError`] if the file cannot be read or is not a
    /// `GeoJSON` `FeatureCollection`.
    pub fn load(path: &Path) -> Result<Self, BoundaryError> {
        let contents = std::fs::read_to_string(path)?;
        let geocoder = Self::from_geojson_str(&contents)?;
        log::info!(
            "Loaded {} boundaries from {}",
            geocoder.len(),
            path.display()
        );
        Ok(geocoder)
    }

    /// Parses boundaries from a `GeoJSON` string.
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryError`] if the string is not a `GeoJSON`
    /// `FeatureCollection`.
    pub fn from_geojson_str(geojson_str: &str) -> Result<Self, BoundaryError> {
        match geojson_str.parse::<GeoJson>()? {
            GeoJson::FeatureCollection(collection) => Ok(Self::from_features(collection)),
            GeoJson::Feature(_) => Err(BoundaryError::NotFeatureCollection { kind: "Feature" }),
            GeoJson::Geometry(_) => Err(BoundaryError::NotFeatureCollection { kind: "Geometry" }),
        }
    }

    /// Builds the index from a parsed collection. Features without a
    /// polygonal geometry are skipped with a warning.
    #[must_use]
    pub fn from_features(collection: FeatureCollection) -> Self {
        let entries: Vec<BoundaryEntry> = collection
            .features
            .into_iter()
            .enumerate()
            .filter_map(|(index, feature)| {
                let entry = to_entry(feature);
                if entry.is_none() {
                    log::warn!("Skipping boundary feature {index}: no polygon geometry");
                }
                entry
            })
            .collect();

        Self {
            boundaries: RTree::bulk_load(entries),
        }
    }

    /// Number of indexed boundaries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.boundaries.size()
    }

    /// Whether the index holds no boundaries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boundaries.size() == 0
    }

    fn smallest_containing(&self, lat: f64, lon: f64) -> Option<&BoundaryEntry> {
        let point = geo::Point::new(lon, lat);
        let query_env = AABB::from_point([lon, lat]);

        let mut best: Option<&BoundaryEntry> = None;

        for entry in self.boundaries.locate_in_envelope_intersecting(&query_env) {
            if entry.polygon.contains(&point) {
                match best {
                    None => best = Some(entry),
                    Some(current) if entry.area < current.area => {
                        best = Some(entry);
                    }
                    _ => {}
                }
            }
        }

        best
    }
}

impl ReverseGeocoder for BoundaryGeocoder {
    fn lookup(&self, lat: f64, lon: f64) -> Result<Option<Enrichment>, GeocodeError> {
        validate_coordinates(lat, lon)?;
        Ok(self
            .smallest_containing(lat, lon)
            .map(|entry| entry.properties.clone()))
    }
}

fn to_entry(feature: Feature) -> Option<BoundaryEntry> {
    let polygon = to_multipolygon(feature.geometry?)?;
    let envelope = compute_envelope(&polygon)?;

    Some(BoundaryEntry {
        properties: feature.properties.unwrap_or_default(),
        area: polygon.unsigned_area(),
        envelope,
        polygon,
    })
}

/// Handles both `Polygon` and `MultiPolygon` geometry types.
fn to_multipolygon(geometry: geojson::Geometry) -> Option<MultiPolygon<f64>> {
    let geo_geom: geo::Geometry<f64> = geometry.try_into().ok()?;
    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}

fn compute_envelope(mp: &MultiPolygon<f64>) -> Option<AABB<[f64; 2]>> {
    mp.bounding_rect()
        .map(|rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]))
}
