//! Reference dataset loading
//!
//! The reference dataset is read once at startup and is read-only afterwards.
//! It is not training data: its only roles are to enumerate the valid values
//! of each categorical field for the form and to drive the dynamic `job`
//! label-encoding fit.

use crate::error::{Result, TelemarkError};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::info;

/// Columns the reference dataset must provide: the ten feature columns plus
/// the outcome column `y`.
pub const REQUIRED_COLUMNS: [&str; 11] = [
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
    "y",
];

/// The reference dataset, loaded once and immutable thereafter.
#[derive(Debug, Clone)]
pub struct ReferenceDataset {
    df: DataFrame,
    dropped_rows: usize,
}

impl ReferenceDataset {
    /// Load the reference CSV, validate its schema, and drop rows with any
    /// missing value. Any failure here is a startup failure.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            TelemarkError::ConfigError(format!(
                "cannot open reference dataset {}: {}",
                path.display(),
                e
            ))
        })?;

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(100))
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| {
                TelemarkError::ConfigError(format!(
                    "cannot parse reference dataset {}: {}",
                    path.display(),
                    e
                ))
            })?;

        let dataset = Self::from_dataframe(df)?;
        info!(
            path = %path.display(),
            rows = dataset.height(),
            dropped_rows = dataset.dropped_rows,
            "Reference dataset loaded"
        );
        Ok(dataset)
    }

    /// Validate and clean an already-loaded frame. Used directly by tests.
    pub fn from_dataframe(df: DataFrame) -> Result<Self> {
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|name| df.column(name).is_err())
            .collect();
        if !missing.is_empty() {
            return Err(TelemarkError::ConfigError(format!(
                "reference dataset is missing required columns: {}",
                missing.join(", ")
            )));
        }

        let before = df.height();
        let df = df.drop_nulls::<String>(None)?;
        let dropped_rows = before - df.height();

        if df.height() == 0 {
            return Err(TelemarkError::ConfigError(
                "reference dataset has no complete rows after dropping missing values".to_string(),
            ));
        }

        Ok(Self { df, dropped_rows })
    }

    /// Number of usable (complete) rows.
    pub fn height(&self) -> usize {
        self.df.height()
    }

    /// Rows excluded for missing values during load.
    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    /// The distinct string values observed in a column, sorted ascending.
    pub fn distinct_labels(&self, column: &str) -> Result<Vec<String>> {
        let series = self
            .df
            .column(column)
            .map_err(|_| TelemarkError::ColumnNotFound(column.to_string()))?
            .as_materialized_series();

        let ca = series.str().map_err(|_| {
            TelemarkError::DataError(format!("column {} is not a string column", column))
        })?;

        let mut values: Vec<String> = ca
            .unique()?
            .into_iter()
            .flatten()
            .map(|s| s.to_string())
            .collect();
        values.sort();
        Ok(values)
    }

    /// The underlying frame.
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }
}
