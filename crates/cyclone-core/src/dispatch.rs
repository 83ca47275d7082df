//! Alert dispatch decisions.
//!
//! A batch is gated once (alerting enabled, cyclone level, protected zone),
//! then each contact is either skipped or dispatched exactly once, in the
//! order given. Send failures are recorded on the outcome and never abort
//! the remaining contacts.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::models::{
    AlertOutcome, ContactEndpoint, DeliveryStatus, GeofenceVerdict, Resolution, RiskAssessment,
    RiskLevel,
};
use crate::rules::{AlertRules, ALERT_LEVEL};

#[derive(Debug, Error)]
pub enum SendError {
    #[error("messaging provider rejected the message ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("messaging request failed: {0}")]
    Transport(String),
}

/// Receipt for an accepted message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReceipt {
    /// Provider-assigned message identifier
    pub id: String,
}

/// Outbound message transport.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, to: &str, body: &str) -> Result<MessageReceipt, SendError>;
}

/// How eligible alerts are delivered.
#[derive(Clone)]
pub enum DeliveryMode {
    /// Messaging credentials are not configured; record, never send
    Simulated,
    Live(Arc<dyn Messenger>),
}

impl DeliveryMode {
    pub fn is_simulated(&self) -> bool {
        matches!(self, DeliveryMode::Simulated)
    }
}

impl std::fmt::Debug for DeliveryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryMode::Simulated => f.write_str("Simulated"),
            DeliveryMode::Live(_) => f.write_str("Live"),
        }
    }
}

/// Whether a batch may dispatch at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GateDecision {
    Open,
    Disabled,
    BelowThreshold { level: RiskLevel },
    OutsideZone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Empty,
    TooShort,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEndpoint {
    pub endpoint: ContactEndpoint,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchReport {
    pub gate: GateDecision,
    pub outcomes: Vec<AlertOutcome>,
    pub skipped: Vec<SkippedEndpoint>,
}

impl DispatchReport {
    fn closed(gate: GateDecision) -> Self {
        Self {
            gate,
            outcomes: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

/// Decide whether a batch may dispatch.
pub fn evaluate_gate(enabled: bool, assessment: &RiskAssessment, geofence: &GeofenceVerdict) -> GateDecision {
    if !enabled {
        GateDecision::Disabled
    } else if assessment.level != ALERT_LEVEL {
        GateDecision::BelowThreshold {
            level: assessment.level,
        }
    } else if !geofence.inside {
        GateDecision::OutsideZone
    } else {
        GateDecision::Open
    }
}

/// Alert text sent to every contact.
pub fn alert_message(resolution: &Resolution) -> String {
    format!(
        "CYCLONE ALERT! High danger in {}. Pressure: {}hPa. Evacuate!",
        resolution.display_name, resolution.observation.pressure_hpa
    )
}

pub struct AlertDispatcher {
    mode: DeliveryMode,
    rules: AlertRules,
}

impl AlertDispatcher {
    pub fn new(mode: DeliveryMode, rules: AlertRules) -> Self {
        Self { mode, rules }
    }

    fn check_endpoint(&self, endpoint: &ContactEndpoint) -> Result<(), SkipReason> {
        let address = endpoint.address.trim();
        if address.is_empty() {
            Err(SkipReason::Empty)
        } else if address.chars().count() < self.rules.min_address_len {
            Err(SkipReason::TooShort)
        } else {
            Ok(())
        }
    }

    /// Run one dispatch batch. Endpoints are attempted one after another.
    pub async fn dispatch(
        &self,
        enabled: bool,
        resolution: &Resolution,
        assessment: &RiskAssessment,
        geofence: &GeofenceVerdict,
        endpoints: &[ContactEndpoint],
    ) -> DispatchReport {
        let gate = evaluate_gate(enabled, assessment, geofence);
        if gate != GateDecision::Open {
            tracing::debug!("Alert gate closed: {:?}", gate);
            return DispatchReport::closed(gate);
        }

        let body = alert_message(resolution);
        let mut report = DispatchReport::closed(gate);
        for endpoint in endpoints {
            if let Err(reason) = self.check_endpoint(endpoint) {
                if reason == SkipReason::TooShort {
                    tracing::warn!("Skipping {:?} contact: address too short", endpoint.role);
                }
                report.skipped.push(SkippedEndpoint {
                    endpoint: endpoint.clone(),
                    reason,
                });
                continue;
            }
            report.outcomes.push(self.deliver(endpoint, &body).await);
        }
        report
    }

    async fn deliver(&self, endpoint: &ContactEndpoint, body: &str) -> AlertOutcome {
        let attempted_at = Utc::now();
        let address = endpoint.address.trim();

        let (status, detail) = match &self.mode {
            DeliveryMode::Simulated => {
                tracing::info!("[SIMULATION] Alert to {} not sent (messaging not configured)", address);
                (
                    DeliveryStatus::Simulated,
                    "messaging not configured; alert recorded without sending".to_string(),
                )
            }
            DeliveryMode::Live(messenger) => {
                match tokio::time::timeout(self.rules.send_timeout, messenger.send(address, body)).await {
                    Ok(Ok(receipt)) => {
                        tracing::info!("Alert sent to {} ({})", address, receipt.id);
                        (DeliveryStatus::Sent, format!("message id {}", receipt.id))
                    }
                    Ok(Err(err)) => {
                        tracing::warn!("Alert to {} failed: {}", address, err);
                        (DeliveryStatus::Failed, err.to_string())
                    }
                    Err(_) => {
                        tracing::warn!("Alert to {} timed out", address);
                        (
                            DeliveryStatus::Failed,
                            format!("timed out after {}s", self.rules.send_timeout.as_secs_f64()),
                        )
                    }
                }
            }
        };

        AlertOutcome {
            endpoint: endpoint.clone(),
            status,
            detail,
            attempted_at,
        }
    }
}
