//! Geographic math: great-circle distance, bearing, and unit formatting.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius in meters.
const EARTH_RADIUS: f64 = 6_371_000.0;

/// Feet per meter.
const FEET_PER_METER: f64 = 3.281;

/// Feet per statute mile.
const FEET_PER_MILE: i64 = 5280;

/// A WGS84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees (-90..=90)
    pub latitude: f64,
    /// Longitude in degrees (-180..=180)
    pub longitude: f64,
}

impl Coordinate {
    /// Create a validated coordinate.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if !latitude.is_finite()
            || !longitude.is_finite()
            || !(-90.0..=90.0).contains(&latitude)
            || !(-180.0..=180.0).contains(&longitude)
        {
            return Err(GeoError::InvalidCoordinate {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// Errors from geographic computations.
#[derive(Debug, Error)]
pub enum GeoError {
    #[error("Invalid coordinate: ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
}

/// Eight-point compass direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardinalDirection {
    North,
    Northeast,
    East,
    Southeast,
    South,
    Southwest,
    West,
    Northwest,
}

impl std::fmt::Display for CardinalDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CardinalDirection::North => write!(f, "North"),
            CardinalDirection::Northeast => write!(f, "Northeast"),
            CardinalDirection::East => write!(f, "East"),
            CardinalDirection::Southeast => write!(f, "Southeast"),
            CardinalDirection::South => write!(f, "South"),
            CardinalDirection::Southwest => write!(f, "Southwest"),
            CardinalDirection::West => write!(f, "West"),
            CardinalDirection::Northwest => write!(f, "Northwest"),
        }
    }
}

/// Great-circle distance between two coordinates in meters (Haversine formula).
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().asin();

    EARTH_RADIUS * c
}

/// Compass direction from one coordinate toward another.
///
/// Uses the flat `atan2(delta_lon, delta_lat)` approximation bucketed into
/// eight 45-degree sectors. Identical coordinates yield `North`, the
/// fallback the original app shipped with.
pub fn bearing_direction(from: Coordinate, to: Coordinate) -> CardinalDirection {
    let d_lat = to.latitude - from.latitude;
    let d_lon = to.longitude - from.longitude;

    if d_lat == 0.0 && d_lon == 0.0 {
        return CardinalDirection::North;
    }

    let degrees = d_lon.atan2(d_lat).to_degrees();
    let degrees = if degrees < 0.0 {
        degrees + 360.0
    } else {
        degrees
    };

    // 45-degree sectors centered on each compass point.
    match degrees {
        d if d < 22.5 => CardinalDirection::North,
        d if d < 67.5 => CardinalDirection::Northeast,
        d if d < 112.5 => CardinalDirection::East,
        d if d < 157.5 => CardinalDirection::Southeast,
        d if d < 202.5 => CardinalDirection::South,
        d if d < 247.5 => CardinalDirection::Southwest,
        d if d < 292.5 => CardinalDirection::West,
        d if d < 337.5 => CardinalDirection::Northwest,
        _ => CardinalDirection::North,
    }
}

/// Convert meters to whole feet.
pub fn meters_to_feet(meters: f64) -> i64 {
    (meters * FEET_PER_METER).round() as i64
}

/// Format a distance in feet for display: feet below one mile, tenths of a
/// mile at or above.
pub fn format_distance(feet: i64) -> String {
    if feet >= FEET_PER_MILE {
        format!("{:.1} mi", feet as f64 / FEET_PER_MILE as f64)
    } else {
        format!("{} ft", feet)
    }
}
