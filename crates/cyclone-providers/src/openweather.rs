//! OpenWeatherMap current-weather client.

use anyhow::{Context, Result};
use async_trait::async_trait;
use cyclone_core::resolver::{LiveReading, LookupError, WeatherProvider};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_OPENWEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// HTTP client for the OpenWeatherMap current weather endpoint.
pub struct OpenWeatherClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CurrentWeatherResponse {
    coord: Coord,
    main: MainBlock,
    name: String,
    #[serde(default)]
    sys: Option<SysBlock>,
}

#[derive(Debug, Deserialize)]
struct Coord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct SysBlock {
    #[serde(default)]
    country: Option<String>,
}

impl CurrentWeatherResponse {
    pub(crate) fn into_reading(self) -> LiveReading {
        let country = self
            .sys
            .and_then(|sys| sys.country)
            .filter(|country| !country.trim().is_empty());
        let display_name = match country {
            Some(country) => format!("{}, {}", self.name, country),
            None => self.name,
        };
        LiveReading {
            latitude: self.coord.lat,
            longitude: self.coord.lon,
            pressure_hpa: self.main.pressure,
            display_name,
        }
    }
}

impl OpenWeatherClient {
    /// Create a new client. A blank key leaves the client unconfigured.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let api_key = api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        Ok(Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .context("Failed to create HTTP client")?,
            base_url: base_url.into(),
            api_key,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Map a non-success status to a lookup error.
pub(crate) fn status_error(status: StatusCode, place: &str) -> LookupError {
    match status {
        StatusCode::UNAUTHORIZED => LookupError::Unauthorized,
        StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => LookupError::NotFound(place.to_string()),
        other => LookupError::Upstream(other.as_u16()),
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current(&self, place: &str) -> Result<LiveReading, LookupError> {
        let api_key = self.api_key.as_deref().ok_or(LookupError::Unconfigured)?;

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("q", place), ("appid", api_key)])
            .send()
            .await
            .map_err(|err| LookupError::Transport(err.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("OpenWeatherMap lookup for {} returned {}", place, status);
            return Err(status_error(status, place));
        }

        let payload = response
            .json::<CurrentWeatherResponse>()
            .await
            .map_err(|err| LookupError::InvalidReading(err.without_url().to_string()))?;

        Ok(payload.into_reading())
    }
}
