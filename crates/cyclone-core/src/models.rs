//! Core data models for the cyclone risk pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single weather reading submitted for risk classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub latitude: f64,
    pub longitude: f64,
    pub pressure_hpa: f64,
    /// Place name typed by the operator when the reading came from a name lookup
    #[serde(default)]
    pub place_query: Option<String>,
}

impl Observation {
    /// Create an observation from raw coordinates and pressure.
    pub fn new(latitude: f64, longitude: f64, pressure_hpa: f64) -> Self {
        Self {
            latitude,
            longitude,
            pressure_hpa,
            place_query: None,
        }
    }

    /// Attach the place name this observation was resolved from.
    pub fn with_place_query(mut self, place: impl Into<String>) -> Self {
        self.place_query = Some(place.into());
        self
    }

    /// Feature vector in model order: latitude, longitude, pressure.
    pub fn features(&self) -> [f64; 3] {
        [self.latitude, self.longitude, self.pressure_hpa]
    }
}

/// Where a resolved observation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObservationSource {
    /// Fetched from the weather provider
    Live,
    /// Entered by the operator as a simulation
    Manual,
    /// Live lookup failed; previously held values were kept
    Fallback,
}

/// An observation plus the context the operator sees alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub observation: Observation,
    pub display_name: String,
    pub source: ObservationSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl Resolution {
    /// The built-in starting point: Visakhapatnam at standard pressure.
    pub fn default_vizag() -> Self {
        Self {
            observation: Observation::new(17.7, 83.3, 1012.0),
            display_name: "Vizag (Default)".to_string(),
            source: ObservationSource::Fallback,
            warning: None,
        }
    }
}

// ========== RISK LEVELS ==========

/// Risk levels, in ascending order of severity.
///
/// The declaration order is the severity order; every comparison and the
/// alert gate key off it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Safe,
    Depression,
    Storm,
    Cyclone,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Safe,
        RiskLevel::Depression,
        RiskLevel::Storm,
        RiskLevel::Cyclone,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Safe => "SAFE",
            RiskLevel::Depression => "DEPRESSION",
            RiskLevel::Storm => "STORM",
            RiskLevel::Cyclone => "CYCLONE",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            RiskLevel::Safe => "No threat detected.",
            RiskLevel::Depression => "Watch required.",
            RiskLevel::Storm => "Warning issued.",
            RiskLevel::Cyclone => "High danger!",
        }
    }

    /// Storm and above get the emergency presentation.
    pub fn is_severe(self) -> bool {
        self >= RiskLevel::Storm
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classifier output for one observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    /// Maximum class probability as a percentage (0-100)
    pub confidence: f64,
}

// ========== GEOFENCE MODELS ==========

/// Region geometry for a geofence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ZoneShape {
    /// Open box: bounds themselves are outside
    BoundingBox {
        min_lat: f64,
        max_lat: f64,
        min_lon: f64,
        max_lon: f64,
    },
    /// Polygon vertices as [lat, lon] pairs (closed ring - first == last)
    Polygon { vertices: Vec<[f64; 2]> },
}

/// A named protection zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geofence {
    pub name: String,
    /// Lower-case place names that identify this zone
    pub aliases: Vec<String>,
    pub shape: ZoneShape,
    /// Only protected zones trigger alerting
    pub protected: bool,
}

impl Geofence {
    /// The built-in Visakhapatnam emergency zone.
    pub fn visakhapatnam() -> Self {
        Self {
            name: "Visakhapatnam".to_string(),
            aliases: vec!["visakhapatnam".to_string(), "vizag".to_string()],
            shape: ZoneShape::BoundingBox {
                min_lat: 17.5,
                max_lat: 18.0,
                min_lon: 83.0,
                max_lon: 83.5,
            },
            protected: true,
        }
    }

    /// Validate geofence configuration.
    /// Returns list of validation errors (empty = valid).
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("Geofence name must not be empty".to_string());
        }

        match &self.shape {
            ZoneShape::BoundingBox {
                min_lat,
                max_lat,
                min_lon,
                max_lon,
            } => {
                if min_lat >= max_lat {
                    errors.push(format!(
                        "min_lat ({}) must be less than max_lat ({})",
                        min_lat, max_lat
                    ));
                }
                if min_lon >= max_lon {
                    errors.push(format!(
                        "min_lon ({}) must be less than max_lon ({})",
                        min_lon, max_lon
                    ));
                }
            }
            ZoneShape::Polygon { vertices } => {
                if vertices.len() < 3 {
                    errors.push("Polygon must have at least 3 vertices".to_string());
                } else if let (Some(first), Some(last)) = (vertices.first(), vertices.last()) {
                    if (first[0] - last[0]).abs() > 0.0001 || (first[1] - last[1]).abs() > 0.0001 {
                        errors.push(
                            "Polygon must be closed (first vertex must equal last)".to_string(),
                        );
                    }
                }
            }
        }

        errors
    }
}

/// Which geofence predicate matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPath {
    PlaceName,
    Coordinates,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeofenceVerdict {
    pub inside: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_by: Option<MatchPath>,
}

impl GeofenceVerdict {
    pub fn outside() -> Self {
        Self {
            inside: false,
            zone: None,
            matched_by: None,
        }
    }
}

// ========== CONTACTS & ALERTS ==========

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactRole {
    Primary,
    Family,
    Authority,
}

/// A destination for alert messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactEndpoint {
    pub address: String,
    pub role: ContactRole,
}

impl ContactEndpoint {
    pub fn new(address: impl Into<String>, role: ContactRole) -> Self {
        Self {
            address: address.into(),
            role,
        }
    }

    /// Build the contact list from the three operator slots, in role order.
    /// Missing slots are dropped; blank ones are kept so they can be reported.
    pub fn from_slots(
        primary: Option<String>,
        family: Option<String>,
        authority: Option<String>,
    ) -> Vec<ContactEndpoint> {
        [
            (primary, ContactRole::Primary),
            (family, ContactRole::Family),
            (authority, ContactRole::Authority),
        ]
        .into_iter()
        .filter_map(|(address, role)| address.map(|address| ContactEndpoint::new(address, role)))
        .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    /// Accepted by the messaging provider
    Sent,
    /// Messaging is not configured; nothing left the process
    Simulated,
    /// The provider call errored or timed out
    Failed,
}

/// Result of one dispatch attempt to one endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertOutcome {
    pub endpoint: ContactEndpoint,
    pub status: DeliveryStatus,
    pub detail: String,
    pub attempted_at: DateTime<Utc>,
}

// ========== HISTORICAL TRACKS ==========

/// Wind speed (knots) at which a track point counts as cyclone strength.
pub const CYCLONE_WIND_KT: f64 = 64.0;

/// One historical storm track fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub wind_kt: f64,
}

impl TrackPoint {
    pub fn is_cyclone_strength(&self) -> bool {
        self.wind_kt >= CYCLONE_WIND_KT
    }
}
