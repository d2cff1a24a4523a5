//! Risk classification
//!
//! Applies the fitted scaler and model to an assembled feature vector and
//! derives the discrete risk category from the positive-class probability.

use crate::analysis::result::{ClassificationResult, RiskCategory};
use crate::analysis::vector::FeatureVector;
use crate::error::PipelineError;
use crate::ml::artifacts::ModelArtifacts;

/// Classify one feature vector.
///
/// The vector is standardized with the training-time transform, the
/// ensemble produces the positive-class probability, and the label and
/// category both derive from that same probability.
///
/// # Errors
///
/// `ClassificationError` when inference fails; never fails for a valid
/// vector and validated artifacts.
pub fn classify(
    vector: &FeatureVector,
    artifacts: &ModelArtifacts,
) -> Result<ClassificationResult, PipelineError> {
    let scaled = artifacts.scaler.transform(vector);
    let probability = artifacts.model.predict_proba(&scaled)?;

    let label = if probability >= 0.5 { 1 } else { 0 };
    let category = RiskCategory::from_probability(probability);

    log::debug!(
        "Classification: label {}, probability {:.4}, category {:?}",
        label,
        probability,
        category
    );

    Ok(ClassificationResult {
        label,
        probability,
        category,
    })
}
