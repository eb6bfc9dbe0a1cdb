pub mod artifacts;
pub mod features;
pub mod loader;
pub mod preprocess;
pub mod schema;
pub mod service;

use thiserror::Error;

/// Failure taxonomy for the prediction pipeline. Only the HTTP layer
/// translates these into status codes.
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("prediction service unavailable: model artifacts are not loaded")]
    Unavailable,
    #[error("invalid value for field {field}: {reason}")]
    InvalidInput { field: String, reason: String },
    #[error("prediction failed: {0}")]
    Inference(String),
}
