//! Alerting rules and input thresholds.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::time::Duration;

use crate::models::RiskLevel;

/// The only level that triggers a dispatch. Storm and below are informational.
pub const ALERT_LEVEL: RiskLevel = RiskLevel::Cyclone;

/// Contacts accepted per request (primary, family, authority).
pub const MAX_CONTACTS: usize = 3;

/// Configuration for alert dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRules {
    /// Shortest address (after trimming) considered a real destination
    pub min_address_len: usize,
    /// Upper bound on a single provider call
    pub send_timeout: Duration,
}

impl Default for AlertRules {
    fn default() -> Self {
        Self {
            min_address_len: 6,
            send_timeout: Duration::from_secs(15),
        }
    }
}

/// Accepted ranges for manually simulated observations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationBounds {
    pub latitude: RangeInclusive<f64>,
    pub longitude: RangeInclusive<f64>,
    pub pressure_hpa: RangeInclusive<f64>,
}

impl Default for SimulationBounds {
    fn default() -> Self {
        // North Indian Ocean basin
        Self {
            latitude: 0.0..=30.0,
            longitude: 50.0..=100.0,
            pressure_hpa: 900.0..=1020.0,
        }
    }
}
