//! Classifier artifact loading and inference
//!
//! The classifier is trained elsewhere and shipped as a JSON artifact. This
//! module deserializes it, checks that its recorded feature schema matches
//! the encoding this crate produces, and runs single-row or batch inference.
//! The loaded artifact is immutable and reentrant; share it via `Arc`.

use crate::error::{Result, TelemarkError};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Training-time column order. The artifact's recorded feature names must
/// match this exactly or the artifact is rejected at load.
pub const FEATURE_ORDER: [&str; 10] = [
    "job",
    "marital",
    "education_qual",
    "call_type",
    "prev_outcome",
    "mon",
    "age",
    "day",
    "dur",
    "num_calls",
];

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with positive-class score
    Leaf { value: f64, n_samples: usize },
    /// Internal node with split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn score(&self, row: ArrayView1<f64>) -> Result<f64> {
        match self {
            TreeNode::Leaf { value, .. } => Ok(*value),
            TreeNode::Split {
                feature_idx,
                threshold,
                left,
                right,
            } => {
                let x = row.get(*feature_idx).copied().ok_or_else(|| {
                    TelemarkError::InferenceError(format!(
                        "tree split references feature index {} outside the {}-column vector",
                        feature_idx,
                        row.len()
                    ))
                })?;
                if x <= *threshold {
                    left.score(row)
                } else {
                    right.score(row)
                }
            }
        }
    }

    fn max_feature_index(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split {
                feature_idx,
                left,
                right,
                ..
            } => (*feature_idx)
                .max(left.max_feature_index())
                .max(right.max_feature_index()),
        }
    }
}

/// Trained model variants the artifact can hold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClassifierModel {
    LogisticRegression { weights: Vec<f64>, intercept: f64 },
    DecisionTree { root: TreeNode },
}

impl ClassifierModel {
    /// Positive-class score for one encoded row.
    fn score(&self, row: ArrayView1<f64>) -> Result<f64> {
        match self {
            ClassifierModel::LogisticRegression { weights, intercept } => {
                let z: f64 = weights
                    .iter()
                    .zip(row.iter())
                    .map(|(w, x)| w * x)
                    .sum::<f64>()
                    + intercept;
                Ok(1.0 / (1.0 + (-z).exp()))
            }
            ClassifierModel::DecisionTree { root } => root.score(row),
        }
    }
}

/// A pre-trained binary classifier loaded from disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    /// Column names in training order; checked against [`FEATURE_ORDER`].
    feature_names: Vec<String>,
    model: ClassifierModel,
    /// Score threshold for the positive class.
    #[serde(default = "default_threshold")]
    threshold: f64,
    /// Frozen `job` label list persisted at training time. When present the
    /// codec uses it instead of refitting from the reference dataset, which
    /// pins the `job` code space to what the model was trained against.
    #[serde(default)]
    job_labels: Option<Vec<String>>,
}

fn default_threshold() -> f64 {
    0.5
}

impl ClassifierArtifact {
    /// Build an artifact in memory. Used by tests and by training pipelines
    /// that emit artifacts for this service.
    pub fn new(model: ClassifierModel) -> Self {
        Self {
            feature_names: FEATURE_ORDER.iter().map(|s| s.to_string()).collect(),
            model,
            threshold: default_threshold(),
            job_labels: None,
        }
    }

    /// Attach the frozen `job` label list.
    pub fn with_job_labels(mut self, labels: Vec<String>) -> Self {
        self.job_labels = Some(labels);
        self
    }

    /// Load and validate an artifact from a JSON file. Any failure is a
    /// fatal startup error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            TelemarkError::ConfigError(format!(
                "cannot read model artifact {}: {}",
                path.display(),
                e
            ))
        })?;
        let artifact: Self = serde_json::from_str(&json).map_err(|e| {
            TelemarkError::ConfigError(format!(
                "cannot parse model artifact {}: {}",
                path.display(),
                e
            ))
        })?;
        artifact.validate()?;
        info!(
            path = %path.display(),
            model = artifact.model_kind(),
            frozen_job_labels = artifact.job_labels.is_some(),
            "Model artifact loaded"
        );
        Ok(artifact)
    }

    /// Save the artifact to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Check the recorded schema against the encoding this crate produces.
    pub fn validate(&self) -> Result<()> {
        if self.feature_names != FEATURE_ORDER {
            return Err(TelemarkError::ConfigError(format!(
                "model artifact feature schema {:?} does not match expected {:?}",
                self.feature_names, FEATURE_ORDER
            )));
        }

        match &self.model {
            ClassifierModel::LogisticRegression { weights, .. } => {
                if weights.len() != FEATURE_ORDER.len() {
                    return Err(TelemarkError::ConfigError(format!(
                        "logistic regression artifact has {} weights, expected {}",
                        weights.len(),
                        FEATURE_ORDER.len()
                    )));
                }
            }
            ClassifierModel::DecisionTree { root } => {
                let max_idx = root.max_feature_index();
                if max_idx >= FEATURE_ORDER.len() {
                    return Err(TelemarkError::ConfigError(format!(
                        "decision tree artifact references feature index {}, expected < {}",
                        max_idx,
                        FEATURE_ORDER.len()
                    )));
                }
            }
        }

        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(TelemarkError::ConfigError(format!(
                "classification threshold {} is outside [0, 1]",
                self.threshold
            )));
        }

        Ok(())
    }

    /// Column names in training order.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// The frozen `job` label list, if the training pipeline persisted one.
    pub fn job_labels(&self) -> Option<&[String]> {
        self.job_labels.as_deref()
    }

    fn model_kind(&self) -> &'static str {
        match self.model {
            ClassifierModel::LogisticRegression { .. } => "logistic_regression",
            ClassifierModel::DecisionTree { .. } => "decision_tree",
        }
    }

    /// Predict the binary label for one encoded feature row.
    pub fn predict(&self, row: ArrayView1<f64>) -> Result<u8> {
        if row.len() != self.feature_names.len() {
            return Err(TelemarkError::ShapeError {
                expected: format!("{} features", self.feature_names.len()),
                actual: format!("{} features", row.len()),
            });
        }
        let score = self.model.score(row)?;
        Ok(u8::from(score >= self.threshold))
    }

    /// Predict binary labels for a batch of encoded rows.
    pub fn predict_batch(&self, x: &Array2<f64>) -> Result<Array1<u8>> {
        if x.ncols() != self.feature_names.len() {
            return Err(TelemarkError::ShapeError {
                expected: format!("{} features", self.feature_names.len()),
                actual: format!("{} features", x.ncols()),
            });
        }
        let mut out = Vec::with_capacity(x.nrows());
        for row in x.rows() {
            out.push(self.predict(row)?);
        }
        Ok(Array1::from_vec(out))
    }
}
