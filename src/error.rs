//! Error types for the voice screening pipeline

use std::fmt;

/// Errors that can occur while screening a recording.
///
/// Degraded analysis (failed pitch or perturbation layers) is not an error:
/// the analyzer absorbs it with documented fallback values. Variants here are
/// the failures that must reach the caller.
#[derive(Debug, Clone)]
pub enum PipelineError {
    /// Invalid input parameters
    InvalidInput(String),

    /// Processing error during signal conditioning or analysis
    ProcessingError(String),

    /// Assembled feature vector does not match the classifier schema
    VectorShapeMismatch {
        /// Number of features the schema requires
        expected: usize,
        /// Number of features actually present
        actual: usize,
    },

    /// Scaler or model artifact missing, unreadable, or malformed
    ArtifactError(String),

    /// Unexpected failure during scaling or inference
    ClassificationError(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            PipelineError::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
            PipelineError::VectorShapeMismatch { expected, actual } => write!(
                f,
                "Feature vector shape mismatch: expected {} features, got {}",
                expected, actual
            ),
            PipelineError::ArtifactError(msg) => write!(f, "Artifact error: {}", msg),
            PipelineError::ClassificationError(msg) => {
                write!(f, "Classification error: {}", msg)
            }
        }
    }
}

impl std::error::Error for PipelineError {}
