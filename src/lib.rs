//! Telemark - Subscription prediction for telemarketing campaign data
//!
//! This crate serves a single-prediction form over a pre-trained binary
//! classifier:
//! - [`data`] - Reference dataset loading (valid categorical values)
//! - [`codec`] - Label↔code tables matching the training-time encoding
//! - [`model`] - Classifier artifact loading and inference
//! - [`predictor`] - The end-to-end predict operation
//! - [`server`] - Web form and REST API
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Prediction core
pub mod codec;
pub mod data;
pub mod model;
pub mod predictor;

// Services
pub mod cli;
pub mod server;

pub use error::{Result, TelemarkError};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{Result, TelemarkError};

    // Encoding
    pub use crate::codec::{CategoricalField, Codec, FieldCodec, OUTCOME_TABLE};

    // Reference data
    pub use crate::data::{ReferenceDataset, REQUIRED_COLUMNS};

    // Inference
    pub use crate::model::{ClassifierArtifact, ClassifierModel, TreeNode, FEATURE_ORDER};

    // Orchestration
    pub use crate::predictor::{
        FeatureVector, FormSchema, Prediction, Predictor, UserSelections, NUMERIC_BOUNDS,
    };
}
