//! Shared, read-only application state.

use anyhow::{Context, Result};
use cyclone_core::{
    AlertDispatcher, AlertRules, AssessmentPipeline, GeofenceEvaluator, InputResolver,
    RiskClassifier, SimulationBounds, TrackArchive,
};
use cyclone_providers::{delivery_mode, OpenWeatherClient};
use std::sync::Arc;

use crate::config::Config;

pub struct AppState {
    pub pipeline: AssessmentPipeline,
    pub tracks: TrackArchive,
    pub config: Config,
}

impl AppState {
    pub fn new(pipeline: AssessmentPipeline, tracks: TrackArchive, config: Config) -> Self {
        Self {
            pipeline,
            tracks,
            config,
        }
    }

    /// Load everything the service needs. Fails if the model cannot be loaded.
    pub fn from_config(config: Config) -> Result<Self> {
        let pipeline = build_pipeline(&config)?;
        let tracks = TrackArchive::load_or_empty(&config.tracks_path, config.tracks_limit, config.tracks_seed);
        Ok(Self::new(pipeline, tracks, config))
    }
}

/// Wire the assessment pipeline from configuration.
pub fn build_pipeline(config: &Config) -> Result<AssessmentPipeline> {
    let classifier = RiskClassifier::load(&config.model_path)
        .with_context(|| format!("Could not load model file '{}'", config.model_path))?;
    tracing::info!(
        "Loaded risk model from {} ({} classes)",
        config.model_path,
        classifier.labels().len()
    );

    let weather = OpenWeatherClient::new(
        config.openweather_url.clone(),
        config.openweather_api_key.clone(),
        config.http_timeout(),
    )?;
    if !weather.is_configured() {
        tracing::warn!("OPENWEATHER_API_KEY not set; live lookups will use default values");
    }

    let mode = delivery_mode(&config.messaging, &config.twilio_url, config.http_timeout())?;
    if mode.is_simulated() {
        tracing::warn!("Twilio credentials not configured; alerts will be simulated");
    }

    let rules = AlertRules {
        send_timeout: config.send_timeout(),
        ..AlertRules::default()
    };

    Ok(AssessmentPipeline::new(
        InputResolver::new(Arc::new(weather), SimulationBounds::default()),
        classifier,
        GeofenceEvaluator::default(),
        AlertDispatcher::new(mode, rules),
    ))
}
