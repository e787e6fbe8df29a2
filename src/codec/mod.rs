//! Categorical label↔code codec
//!
//! Translates between the human-readable labels shown on the form and the
//! integer codes the trained classifier expects, in both directions. Five
//! fields use hand-authored static tables that must match the training-time
//! encoding exactly; `job` is label-encoded dynamically from the distinct
//! values observed in the reference dataset (sorted ascending, codes 0..k-1).
//!
//! Unknown labels and codes are hard errors. The encoding the model was
//! trained against admits no fallback value, so a lookup miss is surfaced as
//! a typed error instead of a missing feature.

use crate::error::{Result, TelemarkError};
use std::collections::HashMap;

/// The six categorical input dimensions, in feature-vector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoricalField {
    Job,
    Marital,
    EducationQual,
    CallType,
    PrevOutcome,
    Month,
}

impl CategoricalField {
    /// All categorical fields, in feature-vector order.
    pub const ALL: [CategoricalField; 6] = [
        CategoricalField::Job,
        CategoricalField::Marital,
        CategoricalField::EducationQual,
        CategoricalField::CallType,
        CategoricalField::PrevOutcome,
        CategoricalField::Month,
    ];

    /// Column name in the reference dataset and the training-time schema.
    pub fn name(&self) -> &'static str {
        match self {
            CategoricalField::Job => "job",
            CategoricalField::Marital => "marital",
            CategoricalField::EducationQual => "education_qual",
            CategoricalField::CallType => "call_type",
            CategoricalField::PrevOutcome => "prev_outcome",
            CategoricalField::Month => "mon",
        }
    }

    /// Whether the field's code table is fitted from data rather than
    /// hand-authored.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, CategoricalField::Job)
    }

    /// The hand-authored table for a static field; `None` for `job`.
    pub fn static_table(&self) -> Option<&'static [(&'static str, i64)]> {
        match self {
            CategoricalField::Job => None,
            CategoricalField::Marital => Some(MARITAL_TABLE),
            CategoricalField::EducationQual => Some(EDUCATION_TABLE),
            CategoricalField::CallType => Some(CALL_TYPE_TABLE),
            CategoricalField::PrevOutcome => Some(PREV_OUTCOME_TABLE),
            CategoricalField::Month => Some(MONTH_TABLE),
        }
    }
}

// Training-time code tables. Entry order is the display order offered to the
// form; the integer values must not change without retraining the model.
const MONTH_TABLE: &[(&str, i64)] = &[
    ("may", 5),
    ("jun", 6),
    ("jul", 7),
    ("aug", 8),
    ("oct", 10),
    ("nov", 11),
    ("dec", 12),
    ("jan", 1),
    ("feb", 2),
    ("mar", 3),
    ("apr", 4),
    ("sep", 9),
];

const EDUCATION_TABLE: &[(&str, i64)] = &[
    ("tertiary", 3),
    ("secondary", 2),
    ("unknown", 0),
    ("primary", 1),
];

const MARITAL_TABLE: &[(&str, i64)] = &[
    ("married", 24),
    ("single", 16),
    ("divorced", 32),
];

const CALL_TYPE_TABLE: &[(&str, i64)] = &[
    ("unknown", 0),
    ("cellular", 1),
    ("telephone", 2),
];

const PREV_OUTCOME_TABLE: &[(&str, i64)] = &[
    ("unknown", 2),
    ("failure", 0),
    ("other", 3),
    ("success", 1),
];

/// Codes for the outcome column `y`. Not an input field; used to render the
/// classifier's 0/1 output as a label.
pub const OUTCOME_TABLE: &[(&str, i64)] = &[("no", 0), ("yes", 1)];

/// Bidirectional label↔code mapping for one field.
///
/// `labels` preserves the domain's display order; the reverse map is built
/// once at construction and reused for every decode.
#[derive(Debug, Clone)]
pub struct FieldCodec {
    field: CategoricalField,
    labels: Vec<String>,
    to_code: HashMap<String, i64>,
    to_label: HashMap<i64, String>,
}

impl FieldCodec {
    /// Build from a hand-authored table.
    fn from_table(field: CategoricalField, table: &[(&str, i64)]) -> Self {
        let labels = table.iter().map(|(l, _)| l.to_string()).collect();
        let to_code: HashMap<String, i64> =
            table.iter().map(|(l, c)| (l.to_string(), *c)).collect();
        let to_label = table.iter().map(|(l, c)| (*c, l.to_string())).collect();
        Self {
            field,
            labels,
            to_code,
            to_label,
        }
    }

    /// Fit a dynamic mapping: sort the distinct labels ascending and assign
    /// codes 0..k-1 in sorted order (standard label-encoding semantics).
    ///
    /// Deterministic for a fixed label set; NOT stable across dataset
    /// versions, since the code space follows the observed distinct values.
    fn fit_sorted(field: CategoricalField, distinct_labels: &[String]) -> Result<Self> {
        if distinct_labels.is_empty() {
            return Err(TelemarkError::ConfigError(format!(
                "no distinct values observed for dynamic field {}",
                field.name()
            )));
        }

        let mut labels: Vec<String> = distinct_labels.to_vec();
        labels.sort();
        labels.dedup();

        let to_code: HashMap<String, i64> = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), i as i64))
            .collect();
        let to_label = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (i as i64, l.clone()))
            .collect();

        Ok(Self {
            field,
            labels,
            to_code,
            to_label,
        })
    }

    /// The field this codec encodes.
    pub fn field(&self) -> CategoricalField {
        self.field
    }

    /// Domain labels in display order.
    pub fn domain(&self) -> &[String] {
        &self.labels
    }

    /// Look up the code for a label.
    pub fn encode(&self, label: &str) -> Result<i64> {
        self.to_code
            .get(label)
            .copied()
            .ok_or_else(|| TelemarkError::UnknownLabel {
                field: self.field.name(),
                label: label.to_string(),
            })
    }

    /// Inverse lookup: the label for a code.
    pub fn decode(&self, code: i64) -> Result<&str> {
        self.to_label
            .get(&code)
            .map(|s| s.as_str())
            .ok_or(TelemarkError::UnknownCode {
                field: self.field.name(),
                code,
            })
    }

    /// Number of labels in the domain.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Codec for all six categorical fields.
///
/// Built once at startup and immutable thereafter; share via `Arc` across
/// request handlers.
#[derive(Debug, Clone)]
pub struct Codec {
    fields: HashMap<CategoricalField, FieldCodec>,
}

impl Codec {
    /// Build the codec: static tables for the five fixed fields, dynamic
    /// sorted label-encoding for `job` from the supplied distinct labels.
    pub fn fit(distinct_job_labels: &[String]) -> Result<Self> {
        let mut fields = HashMap::new();

        for field in CategoricalField::ALL {
            let codec = match field.static_table() {
                Some(table) => FieldCodec::from_table(field, table),
                None => FieldCodec::fit_sorted(field, distinct_job_labels)?,
            };
            fields.insert(field, codec);
        }

        Ok(Self { fields })
    }

    /// Per-field codec.
    pub fn field(&self, field: CategoricalField) -> &FieldCodec {
        // All six fields are inserted in fit(); the map is total.
        &self.fields[&field]
    }

    /// Encode one label for one field.
    pub fn encode(&self, field: CategoricalField, label: &str) -> Result<i64> {
        self.field(field).encode(label)
    }

    /// Decode one code for one field.
    pub fn decode(&self, field: CategoricalField, code: i64) -> Result<&str> {
        self.field(field).decode(code)
    }

    /// Verify that every observed dataset value for a static field appears in
    /// its table. A miss would make a form-offered value unencodable, so it
    /// is a startup failure rather than a latent per-request one.
    pub fn validate_coverage(
        &self,
        field: CategoricalField,
        observed: &[String],
    ) -> Result<()> {
        let codec = self.field(field);
        for value in observed {
            if codec.encode(value).is_err() {
                return Err(TelemarkError::ConfigError(format!(
                    "reference dataset value {:?} for column {} is not in its code table",
                    value,
                    field.name()
                )));
            }
        }
        Ok(())
    }
}
