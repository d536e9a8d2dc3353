//! Error types for Mushroom Lab

use thiserror::Error;

/// Result type alias for Mushroom Lab operations
pub type Result<T> = std::result::Result<T, LabError>;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum LabError {
    /// The upload cannot be evaluated: bad table shape, too few rows,
    /// a single-class target, or a split with an empty side.
    #[error("Input validation error: {0}")]
    InputValidation(String),

    /// A requested diagnostic cannot be computed for the fitted model.
    #[error("Unsupported metric '{diagnostic}': {reason}")]
    UnsupportedMetric { diagnostic: String, reason: String },

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("Training error: {0}")]
    Training(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid shape: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl LabError {
    /// Whether the error was caused by the caller's input rather than by
    /// a failure inside the crate.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            LabError::InputValidation(_)
                | LabError::InvalidParameter { .. }
                | LabError::InvalidInput(_)
                | LabError::Data(_)
                | LabError::UnsupportedMetric { .. }
        )
    }
}

impl From<polars::error::PolarsError> for LabError {
    fn from(err: polars::error::PolarsError) -> Self {
        LabError::Data(err.to_string())
    }
}

impl From<serde_json::Error> for LabError {
    fn from(err: serde_json::Error) -> Self {
        LabError::Serialization(err.to_string())
    }
}

impl From<ndarray::ShapeError> for LabError {
    fn from(err: ndarray::ShapeError) -> Self {
        LabError::Shape {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
