//! Proximity resolution: which POI, if any, the user is standing in, and
//! which one is nearest overall.

use crate::catalog::{PoiCatalog, PointOfInterest};
use crate::geo::{self, CardinalDirection, Coordinate};
use chrono::{DateTime, Utc};

/// A location fix from the platform location stream.
#[derive(Debug, Clone, Copy)]
pub struct UserLocationSample {
    pub coordinate: Coordinate,
    pub timestamp: DateTime<Utc>,
}

impl UserLocationSample {
    /// A sample stamped with the current time.
    pub fn now(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            timestamp: Utc::now(),
        }
    }
}

/// A POI annotated with its distance and direction from the user.
#[derive(Debug, Clone)]
pub struct NearbyPoi {
    pub poi: PointOfInterest,
    pub distance_meters: f64,
    pub direction: CardinalDirection,
}

impl NearbyPoi {
    /// "350 ft Northeast" style guidance text.
    pub fn guidance(&self) -> String {
        format!(
            "{} {}",
            geo::format_distance(geo::meters_to_feet(self.distance_meters)),
            self.direction
        )
    }
}

/// Result of resolving one location sample against the catalog.
///
/// `active` is the nearest POI whose trigger radius contains the user;
/// `closest` is the nearest POI regardless of radius, for "getting closer"
/// guidance before anything triggers.
#[derive(Debug, Clone, Default)]
pub struct ProximityResult {
    pub active: Option<NearbyPoi>,
    pub closest: Option<NearbyPoi>,
}

/// Resolve the user's position against every POI in the catalog.
///
/// Pure function, recomputed fully per sample. POIs without a valid
/// coordinate are skipped. Ties are broken by smallest distance first, then
/// catalog order (strict `<` while scanning in order keeps the earlier POI).
pub fn resolve(catalog: &PoiCatalog, user: Coordinate) -> ProximityResult {
    let mut active: Option<NearbyPoi> = None;
    let mut closest: Option<NearbyPoi> = None;

    for poi in catalog.pois() {
        let Some(location) = poi.location else {
            continue;
        };

        let distance = geo::distance_meters(user, location);
        let direction = geo::bearing_direction(user, location);

        if closest
            .as_ref()
            .map(|c| distance < c.distance_meters)
            .unwrap_or(true)
        {
            closest = Some(NearbyPoi {
                poi: poi.clone(),
                distance_meters: distance,
                direction,
            });
        }

        if distance <= poi.radius_m
            && active
                .as_ref()
                .map(|a| distance < a.distance_meters)
                .unwrap_or(true)
        {
            active = Some(NearbyPoi {
                poi: poi.clone(),
                distance_meters: distance,
                direction,
            });
        }
    }

    ProximityResult { active, closest }
}
