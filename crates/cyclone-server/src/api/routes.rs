//! REST API routes.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::state::AppState;
use cyclone_core::{
    AssessmentReport, AssessmentRequest, ContactEndpoint, Geofence, InputError, ObservationInput,
    RiskLevel, TrackPoint,
};

/// Create the API router.
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/v1/assess", post(assess))
        .route("/v1/zones", get(list_zones))
        .route("/v1/tracks", get(list_tracks))
        .route("/v1/levels", get(list_levels))
}

#[derive(Debug, Error)]
enum ApiError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("invalid request body: {}", .0.body_text())]
    Body(#[from] JsonRejection),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Input(_) | ApiError::Body(_) => StatusCode::BAD_REQUEST,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// The three operator contact slots.
#[derive(Debug, Default, Deserialize)]
struct ContactSlots {
    primary: Option<String>,
    family: Option<String>,
    authority: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AssessBody {
    #[serde(flatten)]
    input: ObservationInput,
    #[serde(default)]
    alerts_enabled: Option<bool>,
    #[serde(default)]
    contacts: ContactSlots,
}

#[derive(Debug, Serialize)]
struct AssessResponse {
    #[serde(flatten)]
    report: AssessmentReport,
    label: &'static str,
    description: &'static str,
    severe: bool,
}

async fn assess(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AssessBody>, JsonRejection>,
) -> Result<Json<AssessResponse>, ApiError> {
    let Json(body) = body?;
    let request = AssessmentRequest {
        input: body.input,
        alerts_enabled: body.alerts_enabled.unwrap_or(state.config.alerts_enabled),
        contacts: ContactEndpoint::from_slots(
            body.contacts.primary,
            body.contacts.family,
            body.contacts.authority,
        ),
    };

    let report = state.pipeline.assess(&request).await?;
    let level = report.assessment.level;
    Ok(Json(AssessResponse {
        report,
        label: level.label(),
        description: level.description(),
        severe: level.is_severe(),
    }))
}

async fn list_zones(State(state): State<Arc<AppState>>) -> Json<Vec<Geofence>> {
    Json(state.pipeline.geofences().zones().to_vec())
}

#[derive(Debug, Serialize)]
struct TrackOverlayPoint {
    #[serde(flatten)]
    point: TrackPoint,
    cyclone_strength: bool,
}

async fn list_tracks(State(state): State<Arc<AppState>>) -> Json<Vec<TrackOverlayPoint>> {
    let points = state
        .tracks
        .points()
        .iter()
        .map(|point| TrackOverlayPoint {
            point: *point,
            cyclone_strength: point.is_cyclone_strength(),
        })
        .collect();
    Json(points)
}

async fn list_levels() -> Json<serde_json::Value> {
    let levels: Vec<serde_json::Value> = RiskLevel::ALL
        .iter()
        .map(|level| {
            json!({
                "level": level,
                "label": level.label(),
                "description": level.description(),
                "severe": level.is_severe(),
            })
        })
        .collect();
    Json(json!(levels))
}
