//! Error types for the heart-risk crate

use thiserror::Error;

/// Result type alias for heart-risk operations
pub type Result<T> = std::result::Result<T, HeartRiskError>;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum HeartRiskError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Unmapped label value: {0:?} (expected \"Presence\" or \"Absence\")")]
    LabelError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Inference error: {0}")]
    InferenceError(String),

    #[error("Artifact error: {0}")]
    ArtifactError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<polars::error::PolarsError> for HeartRiskError {
    fn from(err: polars::error::PolarsError) -> Self {
        HeartRiskError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for HeartRiskError {
    fn from(err: serde_json::Error) -> Self {
        HeartRiskError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HeartRiskError::DataError("test error".to_string());
        assert_eq!(err.to_string(), "Data error: test error");
    }

    #[test]
    fn test_label_error_display() {
        let err = HeartRiskError::LabelError("Maybe".to_string());
        assert!(err.to_string().contains("Maybe"));
        assert!(err.to_string().contains("Presence"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: HeartRiskError = io_err.into();
        assert!(matches!(err, HeartRiskError::IoError(_)));
    }
}
