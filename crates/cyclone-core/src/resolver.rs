//! Turns operator input into a single observation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::models::{Observation, ObservationSource, Resolution};
use crate::rules::SimulationBounds;

/// Current conditions for a named place, as reported by a weather provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveReading {
    pub latitude: f64,
    pub longitude: f64,
    pub pressure_hpa: f64,
    pub display_name: String,
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("place not found: '{0}'")]
    NotFound(String),
    #[error("weather API key rejected or not active yet")]
    Unauthorized,
    #[error("weather API key is not configured")]
    Unconfigured,
    #[error("weather provider returned status {0}")]
    Upstream(u16),
    #[error("weather provider request failed: {0}")]
    Transport(String),
    #[error("weather provider returned an unusable reading: {0}")]
    InvalidReading(String),
}

/// Source of live weather readings.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, place: &str) -> Result<LiveReading, LookupError>;
}

#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
    #[error("{field} {value} is outside {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("at most {max} contacts are accepted, got {got}")]
    TooManyContacts { max: usize, got: usize },
}

/// Operator-selected input mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ObservationInput {
    Live { place: String },
    Manual {
        latitude: f64,
        longitude: f64,
        pressure_hpa: f64,
    },
}

pub struct InputResolver {
    provider: Arc<dyn WeatherProvider>,
    bounds: SimulationBounds,
}

impl InputResolver {
    pub fn new(provider: Arc<dyn WeatherProvider>, bounds: SimulationBounds) -> Self {
        Self { provider, bounds }
    }

    /// Resolve either input mode. Only manual input can fail.
    pub async fn resolve(
        &self,
        input: &ObservationInput,
        fallback: &Resolution,
    ) -> Result<Resolution, InputError> {
        match input {
            ObservationInput::Live { place } => Ok(self.resolve_live(place, fallback).await),
            ObservationInput::Manual {
                latitude,
                longitude,
                pressure_hpa,
            } => self.resolve_manual(*latitude, *longitude, *pressure_hpa),
        }
    }

    /// Look up a place; on any failure keep the fallback values and attach a warning.
    ///
    /// A blank place is treated as not found without asking the provider.
    pub async fn resolve_live(&self, place: &str, fallback: &Resolution) -> Resolution {
        let place = place.trim();
        let reading = if place.is_empty() {
            Err(LookupError::NotFound(String::new()))
        } else {
            match self.provider.current(place).await {
                Ok(reading) => check_reading(reading),
                Err(err) => Err(err),
            }
        };

        match reading {
            Ok(reading) => {
                tracing::debug!("Live reading for {}: {:?}", place, reading);
                Resolution {
                    observation: Observation::new(
                        reading.latitude,
                        reading.longitude,
                        reading.pressure_hpa,
                    )
                    .with_place_query(place),
                    display_name: reading.display_name,
                    source: ObservationSource::Live,
                    warning: None,
                }
            }
            Err(err) => {
                tracing::warn!("Weather lookup for {} failed, keeping previous values: {}", place, err);
                let mut observation = fallback.observation.clone();
                if !place.is_empty() {
                    observation = observation.with_place_query(place);
                }
                Resolution {
                    observation,
                    display_name: fallback.display_name.clone(),
                    source: ObservationSource::Fallback,
                    warning: Some(err.to_string()),
                }
            }
        }
    }

    /// Validate simulated values against the basin bounds.
    pub fn resolve_manual(
        &self,
        latitude: f64,
        longitude: f64,
        pressure_hpa: f64,
    ) -> Result<Resolution, InputError> {
        check_range("latitude", latitude, &self.bounds.latitude)?;
        check_range("longitude", longitude, &self.bounds.longitude)?;
        check_range("pressure_hpa", pressure_hpa, &self.bounds.pressure_hpa)?;

        Ok(Resolution {
            observation: Observation::new(latitude, longitude, pressure_hpa),
            display_name: "Custom Simulation".to_string(),
            source: ObservationSource::Manual,
            warning: None,
        })
    }
}

fn check_range(
    field: &'static str,
    value: f64,
    range: &std::ops::RangeInclusive<f64>,
) -> Result<(), InputError> {
    if !value.is_finite() {
        return Err(InputError::NotFinite { field });
    }
    if !range.contains(&value) {
        return Err(InputError::OutOfRange {
            field,
            value,
            min: *range.start(),
            max: *range.end(),
        });
    }
    Ok(())
}

fn check_reading(reading: LiveReading) -> Result<LiveReading, LookupError> {
    let finite = [reading.latitude, reading.longitude, reading.pressure_hpa]
        .iter()
        .all(|value| value.is_finite());
    if !finite {
        return Err(LookupError::InvalidReading("non-finite value".to_string()));
    }
    if !(-90.0..=90.0).contains(&reading.latitude) || !(-180.0..=180.0).contains(&reading.longitude) {
        return Err(LookupError::InvalidReading(format!(
            "coordinates out of range: {}, {}",
            reading.latitude, reading.longitude
        )));
    }
    Ok(reading)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Weather provider backed by a fixed table.
    #[derive(Default)]
    pub(crate) struct TableProvider {
        pub(crate) readings: HashMap<String, LiveReading>,
        pub(crate) unauthorized: bool,
        pub(crate) calls: AtomicUsize,
    }

    impl TableProvider {
        pub(crate) fn with(mut self, place: &str, lat: f64, lon: f64, pressure: f64, name: &str) -> Self {
            self.readings.insert(
                place.to_lowercase(),
                LiveReading {
                    latitude: lat,
                    longitude: lon,
                    pressure_hpa: pressure,
                    display_name: name.to_string(),
                },
            );
            self
        }
    }

    #[async_trait]
    impl WeatherProvider for TableProvider {
        async fn current(&self, place: &str) -> Result<LiveReading, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.unauthorized {
                return Err(LookupError::Unauthorized);
            }
            self.readings
                .get(&place.to_lowercase())
                .cloned()
                .ok_or_else(|| LookupError::NotFound(place.to_string()))
        }
    }

    fn resolver(provider: TableProvider) -> InputResolver {
        InputResolver::new(Arc::new(provider), SimulationBounds::default())
    }

    #[tokio::test]
    async fn live_lookup_carries_place_query() {
        let resolver = resolver(
            TableProvider::default().with("Visakhapatnam", 17.69, 83.22, 1004.0, "Visakhapatnam, IN"),
        );
        let resolution = resolver
            .resolve_live("Visakhapatnam", &Resolution::default_vizag())
            .await;
        assert_eq!(resolution.source, ObservationSource::Live);
        assert_eq!(resolution.display_name, "Visakhapatnam, IN");
        assert_eq!(resolution.observation.pressure_hpa, 1004.0);
        assert_eq!(resolution.observation.place_query.as_deref(), Some("Visakhapatnam"));
        assert!(resolution.warning.is_none());
    }

    #[tokio::test]
    async fn not_found_keeps_fallback_with_warning() {
        let resolver = resolver(TableProvider::default());
        let fallback = Resolution::default_vizag();
        let resolution = resolver.resolve_live("Atlantis", &fallback).await;
        assert_eq!(resolution.source, ObservationSource::Fallback);
        assert_eq!(resolution.observation.features(), fallback.observation.features());
        assert_eq!(resolution.observation.place_query.as_deref(), Some("Atlantis"));
        assert_eq!(resolution.display_name, fallback.display_name);
        assert!(resolution.warning.unwrap().contains("Atlantis"));
    }

    #[tokio::test]
    async fn unauthorized_keeps_fallback() {
        let resolver = resolver(TableProvider {
            unauthorized: true,
            ..TableProvider::default()
        });
        let resolution = resolver
            .resolve_live("Chennai", &Resolution::default_vizag())
            .await;
        assert_eq!(resolution.source, ObservationSource::Fallback);
        assert!(resolution.warning.is_some());
    }

    #[tokio::test]
    async fn non_finite_reading_is_rejected() {
        let resolver = resolver(TableProvider::default().with("Void", f64::NAN, 80.0, 1000.0, "Void"));
        let resolution = resolver.resolve_live("Void", &Resolution::default_vizag()).await;
        assert_eq!(resolution.source, ObservationSource::Fallback);
    }

    #[tokio::test]
    async fn repeated_lookup_yields_same_observation() {
        let resolver = resolver(TableProvider::default().with("Puri", 19.8, 85.83, 998.0, "Puri, IN"));
        let fallback = Resolution::default_vizag();
        let first = resolver.resolve_live("Puri", &fallback).await;
        let second = resolver.resolve_live("Puri", &fallback).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn blank_place_falls_back_without_lookup() {
        let provider = Arc::new(TableProvider::default());
        let resolver = InputResolver::new(provider.clone(), SimulationBounds::default());
        let fallback = Resolution::default_vizag();
        let input = ObservationInput::Live { place: "  ".to_string() };

        let resolution = resolver.resolve(&input, &fallback).await.unwrap();
        assert_eq!(resolution.source, ObservationSource::Fallback);
        assert_eq!(resolution.observation, fallback.observation);
        assert!(resolution.observation.place_query.is_none());
        assert!(resolution.warning.is_some());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_lookup_keeps_place_for_name_matching() {
        let resolver = resolver(TableProvider {
            unauthorized: true,
            ..TableProvider::default()
        });
        let elsewhere = Resolution {
            observation: Observation::new(13.08, 80.27, 1008.0),
            display_name: "Chennai".to_string(),
            source: ObservationSource::Fallback,
            warning: None,
        };
        let resolution = resolver.resolve_live(" Vizag ", &elsewhere).await;
        assert_eq!(resolution.source, ObservationSource::Fallback);
        assert_eq!(resolution.observation.latitude, 13.08);
        assert_eq!(resolution.observation.place_query.as_deref(), Some("Vizag"));
    }

    #[test]
    fn manual_input_within_bounds() {
        let resolver = resolver(TableProvider::default());
        let resolution = resolver.resolve_manual(17.7, 83.3, 960.0).unwrap();
        assert_eq!(resolution.source, ObservationSource::Manual);
        assert_eq!(resolution.display_name, "Custom Simulation");
        assert!(resolution.observation.place_query.is_none());
    }

    #[test]
    fn manual_input_out_of_bounds_is_rejected() {
        let resolver = resolver(TableProvider::default());
        assert!(matches!(
            resolver.resolve_manual(45.0, 83.3, 960.0),
            Err(InputError::OutOfRange { field: "latitude", .. })
        ));
        assert!(matches!(
            resolver.resolve_manual(17.7, 83.3, 880.0),
            Err(InputError::OutOfRange { field: "pressure_hpa", .. })
        ));
        assert_eq!(
            resolver.resolve_manual(17.7, f64::INFINITY, 960.0),
            Err(InputError::NotFinite { field: "longitude" })
        );
    }

    #[test]
    fn manual_bounds_are_inclusive() {
        let resolver = resolver(TableProvider::default());
        assert!(resolver.resolve_manual(0.0, 50.0, 900.0).is_ok());
        assert!(resolver.resolve_manual(30.0, 100.0, 1020.0).is_ok());
    }
}
