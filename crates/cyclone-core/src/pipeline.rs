//! End-to-end assessment for one operator interaction.

use serde::{Deserialize, Serialize};

use crate::classifier::RiskClassifier;
use crate::dispatch::{AlertDispatcher, DispatchReport};
use crate::geofence::GeofenceEvaluator;
use crate::models::{ContactEndpoint, GeofenceVerdict, Resolution, RiskAssessment};
use crate::resolver::{InputError, InputResolver, ObservationInput};
use crate::rules::MAX_CONTACTS;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentRequest {
    #[serde(flatten)]
    pub input: ObservationInput,
    pub alerts_enabled: bool,
    #[serde(default)]
    pub contacts: Vec<ContactEndpoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentReport {
    pub resolution: Resolution,
    pub assessment: RiskAssessment,
    pub geofence: GeofenceVerdict,
    pub dispatch: DispatchReport,
}

/// Resolver, classifier, geofence evaluator and dispatcher wired in order.
pub struct AssessmentPipeline {
    resolver: InputResolver,
    classifier: RiskClassifier,
    geofences: GeofenceEvaluator,
    dispatcher: AlertDispatcher,
    fallback: Resolution,
}

impl AssessmentPipeline {
    pub fn new(
        resolver: InputResolver,
        classifier: RiskClassifier,
        geofences: GeofenceEvaluator,
        dispatcher: AlertDispatcher,
    ) -> Self {
        Self {
            resolver,
            classifier,
            geofences,
            dispatcher,
            fallback: Resolution::default_vizag(),
        }
    }

    pub fn classifier(&self) -> &RiskClassifier {
        &self.classifier
    }

    pub fn geofences(&self) -> &GeofenceEvaluator {
        &self.geofences
    }

    pub async fn assess(&self, request: &AssessmentRequest) -> Result<AssessmentReport, InputError> {
        if request.contacts.len() > MAX_CONTACTS {
            return Err(InputError::TooManyContacts {
                max: MAX_CONTACTS,
                got: request.contacts.len(),
            });
        }

        let resolution = self.resolver.resolve(&request.input, &self.fallback).await?;
        let assessment = self.classifier.classify(&resolution.observation);
        let geofence = self.geofences.evaluate(&resolution.observation);
        tracing::info!(
            "Assessed {}: {} ({:.1}%), protected zone: {}",
            resolution.display_name,
            assessment.level,
            assessment.confidence,
            geofence.inside
        );

        let dispatch = self
            .dispatcher
            .dispatch(
                request.alerts_enabled,
                &resolution,
                &assessment,
                &geofence,
                &request.contacts,
            )
            .await;

        Ok(AssessmentReport {
            resolution,
            assessment,
            geofence,
            dispatch,
        })
    }
}
