//! Prediction orchestration
//!
//! The single end-to-end operation the presentation surface calls: validate
//! one customer's selections, encode them into the training-time feature
//! vector, invoke the classifier, return the binary result. Stateless per
//! request; all tables and the artifact are fixed at construction.

use crate::codec::{CategoricalField, Codec};
use crate::data::ReferenceDataset;
use crate::error::{Result, TelemarkError};
use crate::model::{ClassifierArtifact, FEATURE_ORDER};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Bounds for the four numeric inputs: (name, min, max, form default).
pub const NUMERIC_BOUNDS: [(&str, i64, i64, i64); 4] = [
    ("age", 0, 100, 30),
    ("day", 1, 31, 1),
    ("dur", 0, 1000, 200),
    ("num_calls", 0, 20, 5),
];

/// One customer's raw form selections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSelections {
    pub job: String,
    pub marital: String,
    pub education_qual: String,
    pub call_type: String,
    pub prev_outcome: String,
    pub mon: String,
    pub age: i64,
    pub day: i64,
    pub dur: i64,
    pub num_calls: i64,
}

/// The encoded 10-column row, in training-time order:
/// (job, marital, education_qual, call_type, prev_outcome, mon,
///  age, day, dur, num_calls).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: [f64; 10],
}

impl FeatureVector {
    pub fn values(&self) -> &[f64; 10] {
        &self.values
    }

    pub fn to_array(&self) -> Array1<f64> {
        Array1::from_iter(self.values.iter().copied())
    }
}

/// Binary prediction outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Prediction {
    WillNotSubscribe,
    WillSubscribe,
}

impl Prediction {
    fn from_label(label: u8) -> Result<Self> {
        match label {
            0 => Ok(Prediction::WillNotSubscribe),
            1 => Ok(Prediction::WillSubscribe),
            other => Err(TelemarkError::InferenceError(format!(
                "classifier returned non-binary label {}",
                other
            ))),
        }
    }

    /// The classifier's integer label.
    pub fn code(&self) -> u8 {
        match self {
            Prediction::WillNotSubscribe => 0,
            Prediction::WillSubscribe => 1,
        }
    }

    /// The outcome label as it appears in the reference dataset's `y` column.
    pub fn label(&self) -> &'static str {
        match self {
            Prediction::WillNotSubscribe => "no",
            Prediction::WillSubscribe => "yes",
        }
    }

    /// Human-readable sentence for the form.
    pub fn message(&self) -> &'static str {
        match self {
            Prediction::WillNotSubscribe => "The customer will not subscribe to the insurance.",
            Prediction::WillSubscribe => "The customer will subscribe to the insurance.",
        }
    }
}

/// Schema of the form: what to offer for each selector and slider.
#[derive(Debug, Clone, Serialize)]
pub struct FormSchema {
    pub categorical: Vec<CategoricalSchema>,
    pub numeric: Vec<NumericSchema>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoricalSchema {
    pub name: &'static str,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NumericSchema {
    pub name: &'static str,
    pub min: i64,
    pub max: i64,
    pub default: i64,
}

/// The prediction service: fitted codec plus loaded classifier.
///
/// Constructed once at startup; immutable and shareable across handlers.
#[derive(Debug, Clone)]
pub struct Predictor {
    codec: Codec,
    artifact: ClassifierArtifact,
}

impl Predictor {
    /// Load the artifact and reference dataset from disk and initialize.
    pub fn load(model_path: impl AsRef<Path>, data_path: impl AsRef<Path>) -> Result<Self> {
        let artifact = ClassifierArtifact::load(model_path)?;
        let dataset = ReferenceDataset::load(data_path)?;
        Self::from_parts(artifact, &dataset)
    }

    /// Initialize from already-loaded parts. Used by tests with in-memory
    /// datasets and hand-built artifacts.
    pub fn from_parts(artifact: ClassifierArtifact, dataset: &ReferenceDataset) -> Result<Self> {
        let observed_jobs = dataset.distinct_labels("job")?;

        // Prefer the job label list frozen into the artifact at training
        // time; refitting from a different dataset would silently shift the
        // code space the model was trained against.
        let job_labels = match artifact.job_labels() {
            Some(frozen) => {
                for job in &observed_jobs {
                    if !frozen.contains(job) {
                        return Err(TelemarkError::ConfigError(format!(
                            "reference dataset job {:?} is not in the artifact's frozen label list",
                            job
                        )));
                    }
                }
                frozen.to_vec()
            }
            None => {
                warn!(
                    n_labels = observed_jobs.len(),
                    "Artifact carries no frozen job labels; fitting job codes from the \
                     reference dataset. The code space depends on this dataset version."
                );
                observed_jobs.clone()
            }
        };

        let codec = Codec::fit(&job_labels)?;

        // Every value the dataset can offer the form must be encodable.
        for field in CategoricalField::ALL {
            if field.is_dynamic() {
                continue;
            }
            let observed = dataset.distinct_labels(field.name())?;
            codec.validate_coverage(field, &observed)?;
        }

        Ok(Self { codec, artifact })
    }

    /// The fitted codec (domains for the form, decode for display).
    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// The form schema: categorical domains plus numeric bounds.
    pub fn schema(&self) -> FormSchema {
        let categorical = CategoricalField::ALL
            .iter()
            .map(|field| CategoricalSchema {
                name: field.name(),
                options: self.codec.field(*field).domain().to_vec(),
            })
            .collect();

        let numeric = NUMERIC_BOUNDS
            .iter()
            .map(|&(name, min, max, default)| NumericSchema {
                name,
                min,
                max,
                default,
            })
            .collect();

        FormSchema {
            categorical,
            numeric,
        }
    }

    /// Validate and encode the selections into the ordered feature vector.
    ///
    /// Exposed separately from [`predict`](Self::predict) so the assembly
    /// step is testable without invoking the classifier.
    pub fn feature_vector(&self, selections: &UserSelections) -> Result<FeatureVector> {
        check_bound("age", selections.age)?;
        check_bound("day", selections.day)?;
        check_bound("dur", selections.dur)?;
        check_bound("num_calls", selections.num_calls)?;

        let values = [
            self.codec.encode(CategoricalField::Job, &selections.job)? as f64,
            self.codec.encode(CategoricalField::Marital, &selections.marital)? as f64,
            self.codec
                .encode(CategoricalField::EducationQual, &selections.education_qual)?
                as f64,
            self.codec.encode(CategoricalField::CallType, &selections.call_type)? as f64,
            self.codec
                .encode(CategoricalField::PrevOutcome, &selections.prev_outcome)?
                as f64,
            self.codec.encode(CategoricalField::Month, &selections.mon)? as f64,
            selections.age as f64,
            selections.day as f64,
            selections.dur as f64,
            selections.num_calls as f64,
        ];
        debug_assert_eq!(values.len(), FEATURE_ORDER.len());

        Ok(FeatureVector { values })
    }

    /// The end-to-end operation: encode, invoke the classifier once, map its
    /// 0/1 output to a [`Prediction`]. Identical selections produce identical
    /// results.
    pub fn predict(&self, selections: &UserSelections) -> Result<Prediction> {
        let vector = self.feature_vector(selections)?;
        let label = self.artifact.predict(vector.to_array().view())?;
        Prediction::from_label(label)
    }
}

fn check_bound(name: &'static str, value: i64) -> Result<()> {
    // NUMERIC_BOUNDS is keyed by the four fixed field names.
    let (_, min, max, _) = NUMERIC_BOUNDS
        .iter()
        .copied()
        .find(|(n, ..)| *n == name)
        .unwrap_or((name, i64::MIN, i64::MAX, 0));

    if value < min || value > max {
        return Err(TelemarkError::InvalidParameter {
            name,
            value: value.to_string(),
            reason: format!("must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClassifierModel, TreeNode};
    use polars::prelude::*;

    fn sample_dataset() -> ReferenceDataset {
        let df = df!(
            "job" => &["management", "technician", "blue-collar", "admin."],
            "marital" => &["married", "single", "divorced", "married"],
            "education_qual" => &["tertiary", "secondary", "primary", "unknown"],
            "call_type" => &["cellular", "telephone", "unknown", "cellular"],
            "prev_outcome" => &["success", "failure", "unknown", "other"],
            "mon" => &["may", "jun", "jul", "aug"],
            "age" => &[35i64, 42, 58, 61],
            "day" => &[15i64, 3, 21, 8],
            "dur" => &[300i64, 120, 45, 600],
            "num_calls" => &[2i64, 1, 5, 3],
            "y" => &["yes", "no", "no", "yes"],
        )
        .unwrap();
        ReferenceDataset::from_dataframe(df).unwrap()
    }

    fn duration_tree() -> ClassifierArtifact {
        ClassifierArtifact::new(ClassifierModel::DecisionTree {
            root: TreeNode::Split {
                feature_idx: 8,
                threshold: 200.0,
                left: Box::new(TreeNode::Leaf { value: 0.0, n_samples: 60 }),
                right: Box::new(TreeNode::Leaf { value: 1.0, n_samples: 40 }),
            },
        })
    }

    fn sample_selections() -> UserSelections {
        UserSelections {
            job: "management".to_string(),
            marital: "married".to_string(),
            education_qual: "tertiary".to_string(),
            call_type: "cellular".to_string(),
            prev_outcome: "success".to_string(),
            mon: "may".to_string(),
            age: 35,
            day: 15,
            dur: 300,
            num_calls: 2,
        }
    }

    #[test]
    fn test_feature_vector_assembly() {
        let predictor = Predictor::from_parts(duration_tree(), &sample_dataset()).unwrap();
        let vector = predictor.feature_vector(&sample_selections()).unwrap();

        // Sorted distinct jobs: admin. blue-collar management technician,
        // so "management" encodes to 2.
        assert_eq!(
            vector.values(),
            &[2.0, 24.0, 3.0, 1.0, 1.0, 5.0, 35.0, 15.0, 300.0, 2.0]
        );
    }

    #[test]
    fn test_predict_end_to_end() {
        let predictor = Predictor::from_parts(duration_tree(), &sample_dataset()).unwrap();
        let prediction = predictor.predict(&sample_selections()).unwrap();
        // dur = 300 > 200, the tree predicts subscription.
        assert_eq!(prediction, Prediction::WillSubscribe);
        assert_eq!(prediction.code(), 1);
        assert_eq!(prediction.label(), "yes");
    }

    #[test]
    fn test_predict_deterministic() {
        let predictor = Predictor::from_parts(duration_tree(), &sample_dataset()).unwrap();
        let selections = sample_selections();
        let first = predictor.predict(&selections).unwrap();
        let second = predictor.predict(&selections).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_boundary_minimums() {
        let predictor = Predictor::from_parts(duration_tree(), &sample_dataset()).unwrap();
        let selections = UserSelections {
            job: "admin.".to_string(),
            marital: "married".to_string(),
            education_qual: "unknown".to_string(),
            call_type: "unknown".to_string(),
            prev_outcome: "unknown".to_string(),
            mon: "jan".to_string(),
            age: 0,
            day: 1,
            dur: 0,
            num_calls: 0,
        };
        let prediction = predictor.predict(&selections).unwrap();
        assert!(matches!(
            prediction,
            Prediction::WillSubscribe | Prediction::WillNotSubscribe
        ));
        assert_eq!(prediction, Prediction::WillNotSubscribe); // dur 0 <= 200
    }

    #[test]
    fn test_unknown_label_rejected() {
        let predictor = Predictor::from_parts(duration_tree(), &sample_dataset()).unwrap();
        let mut selections = sample_selections();
        selections.marital = "widowed".to_string();
        let err = predictor.predict(&selections).unwrap_err();
        assert!(matches!(err, TelemarkError::UnknownLabel { field: "marital", .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_out_of_bounds_numeric_rejected() {
        let predictor = Predictor::from_parts(duration_tree(), &sample_dataset()).unwrap();

        let mut selections = sample_selections();
        selections.age = 140;
        let err = predictor.predict(&selections).unwrap_err();
        assert!(matches!(err, TelemarkError::InvalidParameter { name: "age", .. }));

        let mut selections = sample_selections();
        selections.day = 0;
        assert!(predictor.predict(&selections).is_err());

        let mut selections = sample_selections();
        selections.num_calls = 21;
        assert!(predictor.predict(&selections).is_err());
    }

    #[test]
    fn test_frozen_job_labels_take_precedence() {
        let frozen: Vec<String> = [
            "admin.",
            "blue-collar",
            "entrepreneur",
            "management",
            "technician",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let artifact = duration_tree().with_job_labels(frozen);
        let predictor = Predictor::from_parts(artifact, &sample_dataset()).unwrap();

        // "management" is code 3 in the frozen list, not 2 as in the
        // dataset-fitted mapping.
        let vector = predictor.feature_vector(&sample_selections()).unwrap();
        assert_eq!(vector.values()[0], 3.0);
    }

    #[test]
    fn test_dataset_job_outside_frozen_list_rejected() {
        let artifact =
            duration_tree().with_job_labels(vec!["admin.".to_string(), "management".to_string()]);
        let err = Predictor::from_parts(artifact, &sample_dataset()).unwrap_err();
        assert!(matches!(err, TelemarkError::ConfigError(_)));
    }

    #[test]
    fn test_uncovered_static_label_fails_startup() {
        let df = df!(
            "job" => &["management"],
            "marital" => &["widowed"], // not in the marital table
            "education_qual" => &["tertiary"],
            "call_type" => &["cellular"],
            "prev_outcome" => &["success"],
            "mon" => &["may"],
            "age" => &[35i64],
            "day" => &[15i64],
            "dur" => &[300i64],
            "num_calls" => &[2i64],
            "y" => &["yes"],
        )
        .unwrap();
        let dataset = ReferenceDataset::from_dataframe(df).unwrap();
        let err = Predictor::from_parts(duration_tree(), &dataset).unwrap_err();
        assert!(matches!(err, TelemarkError::ConfigError(_)));
    }

    #[test]
    fn test_schema_exposes_domains_and_bounds() {
        let predictor = Predictor::from_parts(duration_tree(), &sample_dataset()).unwrap();
        let schema = predictor.schema();

        assert_eq!(schema.categorical.len(), 6);
        let marital = schema
            .categorical
            .iter()
            .find(|f| f.name == "marital")
            .unwrap();
        assert_eq!(marital.options, vec!["married", "single", "divorced"]);

        assert_eq!(schema.numeric.len(), 4);
        let age = schema.numeric.iter().find(|f| f.name == "age").unwrap();
        assert_eq!((age.min, age.max, age.default), (0, 100, 30));
    }
}
