//! Protected zone membership.
//!
//! An observation is inside a protected zone when either its place name
//! mentions one of the zone's aliases or its coordinates fall within the
//! zone's shape. The two checks are independent pure functions.

use crate::models::{Geofence, GeofenceVerdict, MatchPath, Observation, ZoneShape};

/// Case-insensitive substring match of a place query against zone aliases.
pub fn matches_place(zone: &Geofence, place_query: &str) -> bool {
    let query = place_query.trim().to_lowercase();
    if query.is_empty() {
        return false;
    }
    zone.aliases
        .iter()
        .map(|alias| alias.trim().to_lowercase())
        .filter(|alias| !alias.is_empty())
        .any(|alias| query.contains(&alias))
}

/// Check if a point lies within the zone's shape.
pub fn contains_coordinates(zone: &Geofence, lat: f64, lon: f64) -> bool {
    if !lat.is_finite() || !lon.is_finite() {
        return false;
    }
    match &zone.shape {
        ZoneShape::BoundingBox {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        } => *min_lat < lat && lat < *max_lat && *min_lon < lon && lon < *max_lon,
        ZoneShape::Polygon { vertices } => polygon_contains(vertices, lat, lon),
    }
}

/// Ray casting: count intersections with polygon edges.
fn polygon_contains(polygon: &[[f64; 2]], lat: f64, lon: f64) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let yi = polygon[i][0];
        let xi = polygon[i][1];
        let yj = polygon[j][0];
        let xj = polygon[j][1];

        if ((yi > lat) != (yj > lat)) && (lon < (xj - xi) * (lat - yi) / (yj - yi) + xi) {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Evaluates observations against the configured protected zones.
#[derive(Debug, Clone)]
pub struct GeofenceEvaluator {
    zones: Vec<Geofence>,
}

impl Default for GeofenceEvaluator {
    fn default() -> Self {
        Self::new(vec![Geofence::visakhapatnam()])
    }
}

impl GeofenceEvaluator {
    /// Zones that fail validation are logged and left out.
    pub fn new(zones: Vec<Geofence>) -> Self {
        let zones = zones
            .into_iter()
            .filter(|zone| {
                let errors = zone.validate();
                if !errors.is_empty() {
                    tracing::warn!("Ignoring invalid geofence '{}': {}", zone.name, errors.join("; "));
                }
                errors.is_empty()
            })
            .collect();
        Self { zones }
    }

    pub fn zones(&self) -> &[Geofence] {
        &self.zones
    }

    /// First protected zone the observation falls in, by name then by coordinates.
    pub fn evaluate(&self, observation: &Observation) -> GeofenceVerdict {
        for zone in self.zones.iter().filter(|zone| zone.protected) {
            let by_name = observation
                .place_query
                .as_deref()
                .is_some_and(|place| matches_place(zone, place));
            let matched_by = if by_name {
                Some(MatchPath::PlaceName)
            } else if contains_coordinates(zone, observation.latitude, observation.longitude) {
                Some(MatchPath::Coordinates)
            } else {
                None
            };

            if matched_by.is_some() {
                return GeofenceVerdict {
                    inside: true,
                    zone: Some(zone.name.clone()),
                    matched_by,
                };
            }
        }
        GeofenceVerdict::outside()
    }
}
