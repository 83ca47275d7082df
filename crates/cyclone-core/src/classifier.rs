//! Pre-trained risk classifier.
//!
//! The model is shipped as a JSON artifact holding the class labels in
//! training order and one of two estimator layouts (a random forest exported
//! node by node, or a multinomial logistic regression). The artifact is
//! validated once at load time so that prediction itself cannot fail.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::{Observation, RiskAssessment, RiskLevel};

/// Number of input features: latitude, longitude, pressure.
pub const FEATURE_COUNT: usize = 3;

const SUPPORTED_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid model artifact: {0}")]
    Invalid(String),
}

/// Serialized classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    /// Risk level for each class index, in training order
    pub labels: Vec<RiskLevel>,
    pub estimator: Estimator,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Estimator {
    RandomForest { trees: Vec<DecisionTree> },
    Logistic {
        /// One row of feature weights per class
        coefficients: Vec<[f64; FEATURE_COUNT]>,
        intercepts: Vec<f64>,
    },
}

/// A decision tree stored as a flat node array; node 0 is the root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Go to `left` when `features[feature] <= threshold`, else `right`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Per-class sample weights at this leaf
    Leaf { value: Vec<f64> },
}

impl DecisionTree {
    fn leaf_distribution(&self, features: &[f64; FEATURE_COUNT]) -> Vec<f64> {
        let mut index = 0;
        // Children always have larger indices than their parent (checked at
        // load), so this walk terminates.
        loop {
            match &self.nodes[index] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                TreeNode::Leaf { value } => return normalize(value),
            }
        }
    }

    fn validate(&self, tree_index: usize, classes: usize) -> Result<(), ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::Invalid(format!("tree {} has no nodes", tree_index)));
        }
        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= FEATURE_COUNT {
                        return Err(ModelError::Invalid(format!(
                            "tree {} node {} splits on feature {} (only {} features)",
                            tree_index, index, feature, FEATURE_COUNT
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(ModelError::Invalid(format!(
                            "tree {} node {} has a non-finite threshold",
                            tree_index, index
                        )));
                    }
                    for child in [*left, *right] {
                        if child <= index || child >= self.nodes.len() {
                            return Err(ModelError::Invalid(format!(
                                "tree {} node {} points to invalid child {}",
                                tree_index, index, child
                            )));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if value.len() != classes {
                        return Err(ModelError::Invalid(format!(
                            "tree {} leaf {} has {} classes, expected {}",
                            tree_index,
                            index,
                            value.len(),
                            classes
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

impl ModelArtifact {
    /// Check the artifact is internally consistent.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.format_version != SUPPORTED_FORMAT_VERSION {
            return Err(ModelError::Invalid(format!(
                "unsupported format_version {} (expected {})",
                self.format_version, SUPPORTED_FORMAT_VERSION
            )));
        }
        if self.labels.is_empty() {
            return Err(ModelError::Invalid("no class labels".to_string()));
        }
        let mut seen = self.labels.clone();
        seen.sort();
        seen.dedup();
        if seen.len() != self.labels.len() {
            return Err(ModelError::Invalid("duplicate class labels".to_string()));
        }

        let classes = self.labels.len();
        match &self.estimator {
            Estimator::RandomForest { trees } => {
                if trees.is_empty() {
                    return Err(ModelError::Invalid("random forest has no trees".to_string()));
                }
                for (tree_index, tree) in trees.iter().enumerate() {
                    tree.validate(tree_index, classes)?;
                }
            }
            Estimator::Logistic {
                coefficients,
                intercepts,
            } => {
                if coefficients.len() != classes || intercepts.len() != classes {
                    return Err(ModelError::Invalid(format!(
                        "logistic model has {} coefficient rows and {} intercepts for {} classes",
                        coefficients.len(),
                        intercepts.len(),
                        classes
                    )));
                }
                let all_finite = coefficients
                    .iter()
                    .flatten()
                    .chain(intercepts.iter())
                    .all(|v| v.is_finite());
                if !all_finite {
                    return Err(ModelError::Invalid(
                        "logistic model has non-finite weights".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Loaded, validated classifier.
#[derive(Debug, Clone)]
pub struct RiskClassifier {
    artifact: ModelArtifact,
}

impl RiskClassifier {
    /// Load and validate an artifact from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact: ModelArtifact = serde_json::from_str(&raw)?;
        Self::from_artifact(artifact)
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ModelError> {
        artifact.validate()?;
        Ok(Self { artifact })
    }

    pub fn labels(&self) -> &[RiskLevel] {
        &self.artifact.labels
    }

    /// Class probabilities in label order. Non-finite entries become 0.
    pub fn predict_proba(&self, features: &[f64; FEATURE_COUNT]) -> Vec<f64> {
        let classes = self.artifact.labels.len();
        let raw = match &self.artifact.estimator {
            Estimator::RandomForest { trees } => {
                let mut sum = vec![0.0; classes];
                for tree in trees {
                    for (acc, p) in sum.iter_mut().zip(tree.leaf_distribution(features)) {
                        *acc += p;
                    }
                }
                let count = trees.len() as f64;
                sum.into_iter().map(|p| p / count).collect()
            }
            Estimator::Logistic {
                coefficients,
                intercepts,
            } => {
                let scores: Vec<f64> = coefficients
                    .iter()
                    .zip(intercepts)
                    .map(|(row, intercept)| {
                        row.iter().zip(features).map(|(w, x)| w * x).sum::<f64>() + intercept
                    })
                    .collect();
                softmax(&scores)
            }
        };
        raw.into_iter()
            .map(|p| if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 })
            .collect()
    }

    /// Index of the most probable class (first on ties).
    pub fn predict(&self, features: &[f64; FEATURE_COUNT]) -> usize {
        argmax(&self.predict_proba(features)).0
    }

    /// Classify an observation.
    pub fn classify(&self, observation: &Observation) -> RiskAssessment {
        let probabilities = self.predict_proba(&observation.features());
        let (index, best) = argmax(&probabilities);
        RiskAssessment {
            level: self.artifact.labels[index],
            confidence: (best * 100.0).clamp(0.0, 100.0),
        }
    }
}

fn normalize(value: &[f64]) -> Vec<f64> {
    let total: f64 = value.iter().filter(|v| v.is_finite() && **v > 0.0).sum();
    if total <= 0.0 {
        return vec![0.0; value.len()];
    }
    value
        .iter()
        .map(|v| if v.is_finite() && *v > 0.0 { v / total } else { 0.0 })
        .collect()
}

fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

fn argmax(values: &[f64]) -> (usize, f64) {
    let mut best = (0, f64::NEG_INFINITY);
    for (index, value) in values.iter().enumerate() {
        if *value > best.1 {
            best = (index, *value);
        }
    }
    if best.1.is_finite() {
        best
    } else {
        (0, 0.0)
    }
}
