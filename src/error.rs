//! Error types for the coolsense pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for coolsense operations
pub type Result<T> = std::result::Result<T, CoolsenseError>;

/// Main error type for the coolsense pipeline
#[derive(Error, Debug)]
pub enum CoolsenseError {
    /// No usable records remain after cleaning; training must not proceed.
    #[error("empty dataset: no usable records after cleaning ({rows_in} rows in, all dropped)")]
    EmptyDataset { rows_in: usize },

    /// Fewer than 2 distinct target values in the training partition; R² is undefined.
    #[error("degenerate training set: {distinct} distinct target value(s) in the training partition, need at least 2")]
    DegenerateTrainingSet { distinct: usize },

    /// Feature vector does not match the schema the model was trained against.
    #[error("schema mismatch: model expects [{expected}], got [{actual}]")]
    SchemaMismatch { expected: String, actual: String },

    /// A persisted model or test set is absent where a downstream stage expects it.
    #[error("missing artifact {path:?}: {hint}")]
    MissingArtifact { path: PathBuf, hint: String },

    #[error("column not found: {0}")]
    ColumnNotFound(String),

    #[error("data error: {0}")]
    DataError(String),

    #[error("invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("model not fitted")]
    ModelNotFitted,

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    SerializationError(String),
}

impl From<polars::error::PolarsError> for CoolsenseError {
    fn from(err: polars::error::PolarsError) -> Self {
        CoolsenseError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for CoolsenseError {
    fn from(err: serde_json::Error) -> Self {
        CoolsenseError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for CoolsenseError {
    fn from(err: ndarray::ShapeError) -> Self {
        CoolsenseError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
