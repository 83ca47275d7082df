pub mod classifier;
pub mod dispatch;
pub mod geofence;
pub mod models;
pub mod pipeline;
pub mod resolver;
pub mod rules;
pub mod tracks;

pub use classifier::{ModelArtifact, ModelError, RiskClassifier};
pub use dispatch::{
    AlertDispatcher, DeliveryMode, DispatchReport, GateDecision, MessageReceipt, Messenger,
    SendError, SkipReason,
};
pub use geofence::GeofenceEvaluator;
pub use models::{
    AlertOutcome, ContactEndpoint, ContactRole, DeliveryStatus, Geofence, GeofenceVerdict,
    Observation, ObservationSource, Resolution, RiskAssessment, RiskLevel, TrackPoint, ZoneShape,
};
pub use pipeline::{AssessmentPipeline, AssessmentReport, AssessmentRequest};
pub use resolver::{InputError, InputResolver, LiveReading, LookupError, ObservationInput, WeatherProvider};
pub use rules::{AlertRules, SimulationBounds};
pub use tracks::TrackArchive;
