//! Point-of-interest catalog: types, backend record parsing, and the
//! built-in demo data set.

pub mod source;

use crate::geo::Coordinate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Trigger radius applied when the backend row does not specify one.
pub const DEFAULT_RADIUS_M: f64 = 50.0;

/// Narration length assumed when the backend row does not specify one.
pub const DEFAULT_AUDIO_LENGTH_SECS: f64 = 180.0;

/// A point of interest with narration content and a geographic trigger zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointOfInterest {
    /// Stable unique identifier
    pub id: String,
    /// Display name
    pub title: String,
    /// Narration text spoken during the tour
    pub script: String,
    /// Geographic position; `None` when the source row was malformed.
    /// Such POIs stay listed for browsing but never trigger by proximity.
    pub location: Option<Coordinate>,
    /// Human-readable locality shown under the title ("New York, NY")
    pub locality: Option<String>,
    /// Trigger radius in meters
    pub radius_m: f64,
    /// Expected narration duration in seconds
    pub audio_length_secs: f64,
}

impl PointOfInterest {
    /// Create a POI at a location with the default radius and audio length.
    pub fn new(id: impl Into<String>, title: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            script: script.into(),
            location: None,
            locality: None,
            radius_m: DEFAULT_RADIUS_M,
            audio_length_secs: DEFAULT_AUDIO_LENGTH_SECS,
        }
    }

    /// Set the location.
    pub fn at(mut self, location: Coordinate) -> Self {
        self.location = Some(location);
        self
    }

    /// Set the locality label.
    pub fn in_locality(mut self, locality: impl Into<String>) -> Self {
        self.locality = Some(locality.into());
        self
    }

    /// Set the trigger radius in meters.
    pub fn with_radius(mut self, radius_m: f64) -> Self {
        self.radius_m = radius_m;
        self
    }

    /// Set the narration length in seconds.
    pub fn with_audio_length(mut self, secs: f64) -> Self {
        self.audio_length_secs = secs;
        self
    }
}

/// Raw POI row as returned by the backend.
///
/// The production table stores the coordinate either as a free-text
/// `"lat,lon"` column or as two numeric columns; both shapes are accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoiRecord {
    /// Row id
    pub id: serde_json::Value,
    /// Display name
    #[serde(rename = "POI")]
    pub poi: String,
    /// Narration text
    #[serde(rename = "Script")]
    pub script: String,
    /// Free-text "lat,lon"
    #[serde(rename = "Location", default)]
    pub location: Option<String>,
    /// Numeric latitude, if the table splits the coordinate
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Numeric longitude, if the table splits the coordinate
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Trigger radius in meters
    #[serde(default)]
    pub radius: Option<f64>,
    /// Narration length in seconds
    #[serde(rename = "audioLength", default)]
    pub audio_length: Option<f64>,
}

/// Non-fatal issues noticed while building a catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogWarning {
    /// A row's coordinate could not be parsed; the POI is kept for display
    /// but excluded from proximity detection.
    MalformedPoi { id: String, detail: String },
}

/// Errors loading the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("POI source unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed response from POI source: {0}")]
    MalformedResponse(String),
}

/// Ordered, in-memory POI collection.
///
/// Insertion order is preserved and used as the tie-break order in proximity
/// resolution. Refreshing replaces the set wholesale.
#[derive(Debug, Clone, Default)]
pub struct PoiCatalog {
    pois: Vec<PointOfInterest>,
}

impl PoiCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from a list of POIs, preserving order.
    pub fn from_pois(pois: Vec<PointOfInterest>) -> Self {
        Self { pois }
    }

    /// Build a catalog from backend rows.
    ///
    /// Rows with unparsable coordinates are kept without a location and a
    /// [`CatalogWarning::MalformedPoi`] is pushed for each.
    pub fn from_records(records: Vec<PoiRecord>, warnings: &mut Vec<CatalogWarning>) -> Self {
        let mut pois = Vec::with_capacity(records.len());

        for record in records {
            let id = record_id(&record.id);
            let location = match parse_location(&record) {
                Ok(coord) => Some(coord),
                Err(detail) => {
                    tracing::warn!("POI {} has a malformed coordinate: {}", id, detail);
                    warnings.push(CatalogWarning::MalformedPoi {
                        id: id.clone(),
                        detail,
                    });
                    None
                }
            };

            pois.push(PointOfInterest {
                id,
                title: record.poi,
                script: record.script,
                location,
                locality: None,
                radius_m: record.radius.unwrap_or(DEFAULT_RADIUS_M),
                audio_length_secs: record.audio_length.unwrap_or(DEFAULT_AUDIO_LENGTH_SECS),
            });
        }

        tracing::info!("Catalog loaded with {} POIs", pois.len());
        Self { pois }
    }

    /// Replace the entire POI set (manual refresh).
    pub fn replace(&mut self, pois: Vec<PointOfInterest>) {
        self.pois = pois;
    }

    /// All POIs in catalog order.
    pub fn pois(&self) -> &[PointOfInterest] {
        &self.pois
    }

    /// Number of POIs.
    pub fn len(&self) -> usize {
        self.pois.len()
    }

    /// Whether the catalog has no POIs.
    pub fn is_empty(&self) -> bool {
        self.pois.is_empty()
    }

    /// POI at a catalog position.
    pub fn get(&self, index: usize) -> Option<&PointOfInterest> {
        self.pois.get(index)
    }

    /// Catalog position of a POI by id.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.pois.iter().position(|p| p.id == id)
    }

    /// The built-in New York demo catalog used when no backend is configured.
    pub fn builtin_nyc() -> Self {
        Self::from_pois(vec![
            PointOfInterest::new(
                "empire-state-building",
                "Empire State Building",
                "Standing 1,454 feet tall, the Empire State Building is an Art Deco \
                 masterpiece and one of New York's most iconic landmarks.",
            )
            .at(Coordinate {
                latitude: 40.7484,
                longitude: -73.9857,
            })
            .with_radius(50.0)
            .with_audio_length(160.0)
            .in_locality("New York, NY"),
            PointOfInterest::new(
                "central-park",
                "Central Park",
                "A vast urban oasis featuring lakes, walking trails, and cultural \
                 landmarks in the heart of Manhattan.",
            )
            .at(Coordinate {
                latitude: 40.7829,
                longitude: -73.9654,
            })
            .with_radius(100.0)
            .with_audio_length(240.0)
            .in_locality("New York, NY"),
            PointOfInterest::new(
                "times-square",
                "Times Square",
                "The bustling heart of Manhattan, known for its bright lights and \
                 entertainment.",
            )
            .at(Coordinate {
                latitude: 40.7580,
                longitude: -73.9855,
            })
            .with_radius(75.0)
            .with_audio_length(150.0)
            .in_locality("New York, NY"),
        ])
    }
}

pub(crate) fn record_id(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse a row's coordinate from either the free-text column or the split
/// numeric columns.
fn parse_location(record: &PoiRecord) -> Result<Coordinate, String> {
    if let (Some(lat), Some(lon)) = (record.latitude, record.longitude) {
        return Coordinate::new(lat, lon).map_err(|e| e.to_string());
    }

    let text = record
        .location
        .as_deref()
        .ok_or_else(|| "no coordinate columns present".to_string())?;

    let mut parts = text.split(',');
    let lat = parts
        .next()
        .ok_or_else(|| format!("expected \"lat,lon\", got {:?}", text))?;
    let lon = parts
        .next()
        .ok_or_else(|| format!("expected \"lat,lon\", got {:?}", text))?;
    if parts.next().is_some() {
        return Err(format!("expected \"lat,lon\", got {:?}", text));
    }

    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("unparsable latitude {:?}", lat.trim()))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|_| format!("unparsable longitude {:?}", lon.trim()))?;

    Coordinate::new(lat, lon).map_err(|e| e.to_string())
}
