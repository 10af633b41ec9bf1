//! Error types for preprocessing operations.

use thiserror::Error;

/// Error type for preprocessing operations.
///
/// Every variant is terminal for the call that produced it. Nothing in this
/// crate retries or silently recovers.
#[derive(Debug, Error)]
pub enum PreprocessingError {
    /// Bad pipeline configuration: unknown target column, missing required
    /// input columns, invalid split fraction.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// Column set or column type at transform time does not match the
    /// schema frozen at fit time.
    #[error("Schema mismatch on column '{column}': {reason}")]
    SchemaMismatch { column: String, reason: String },
    /// Transform or persist called before `fit_transform` or `reload`.
    #[error("Preprocessor is not fitted; call fit_transform or reload first")]
    NotFitted,
    /// Persisted state was written by an incompatible format version.
    #[error("Incompatible state version: expected {expected}, found {found}")]
    IncompatibleStateVersion { expected: u32, found: u32 },
    /// Empty data provided where non-empty was required.
    #[error("Empty data: {0}")]
    EmptyData(String),
    /// Invalid hyperparameter value.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// Feature dimension mismatch.
    #[error("Feature mismatch: expected {expected_features} features, got {got_features}")]
    FeatureMismatch {
        expected_features: usize,
        got_features: usize,
    },
    /// Serialization or deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl PreprocessingError {
    pub(crate) fn missing_column(column: impl Into<String>) -> Self {
        PreprocessingError::SchemaMismatch {
            column: column.into(),
            reason: "missing".to_string(),
        }
    }

    pub(crate) fn unexpected_column(column: impl Into<String>) -> Self {
        PreprocessingError::SchemaMismatch {
            column: column.into(),
            reason: "unexpected".to_string(),
        }
    }

    /// Name of the offending column, when the error concerns one.
    pub fn column(&self) -> Option<&str> {
        match self {
            PreprocessingError::SchemaMismatch { column, .. } => Some(column),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PreprocessingError {
    fn from(err: std::io::Error) -> Self {
        PreprocessingError::IoError(err.to_string())
    }
}

impl From<bincode::Error> for PreprocessingError {
    fn from(err: bincode::Error) -> Self {
        PreprocessingError::SerializationError(err.to_string())
    }
}

impl From<csv::Error> for PreprocessingError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            PreprocessingError::IoError(err.to_string())
        } else {
            PreprocessingError::SerializationError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for PreprocessingError {
    fn from(err: serde_json::Error) -> Self {
        PreprocessingError::Configuration(err.to_string())
    }
}
