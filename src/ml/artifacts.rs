//! Pre-trained artifact loading
//!
//! The feature scaler and risk model are opaque JSON artifacts produced by
//! an offline training step. They are loaded and validated once at startup
//! and shared read-only across requests; a rejected artifact disables
//! classification entirely rather than risking inference against a schema
//! the model was never fit on.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::vector::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
use crate::error::PipelineError;

const SCALE_EPSILON: f32 = 1e-10;

/// Fitted standardizing scaler
///
/// Applies the same centering and scaling used at training time:
/// `(x - mean) / scale` per feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureScaler {
    /// Schema column names the scaler was fit on, in order
    pub feature_names: Vec<String>,

    /// Per-feature mean
    pub mean: Vec<f32>,

    /// Per-feature scale
    pub scale: Vec<f32>,
}

impl FeatureScaler {
    /// Apply the fitted transform to a vector.
    ///
    /// Callers hold a validated scaler, so the array lengths match the
    /// vector length.
    pub fn transform(&self, vector: &FeatureVector) -> Vec<f32> {
        vector
            .values()
            .iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .map(|(&x, (&mean, &scale))| (x - mean) / scale)
            .collect()
    }

    fn validate(&self) -> Result<(), String> {
        if self.feature_names.len() != FEATURE_COUNT
            || self.mean.len() != FEATURE_COUNT
            || self.scale.len() != FEATURE_COUNT
        {
            return Err(format!(
                "Scaler arrays must all have {} entries, got names {}, mean {}, scale {}",
                FEATURE_COUNT,
                self.feature_names.len(),
                self.mean.len(),
                self.scale.len()
            ));
        }

        for (i, (name, expected)) in self.feature_names.iter().zip(FEATURE_NAMES.iter()).enumerate()
        {
            if name != expected {
                return Err(format!(
                    "Scaler feature {} is '{}', schema expects '{}'",
                    i, name, expected
                ));
            }
        }

        for (i, &scale) in self.scale.iter().enumerate() {
            if !scale.is_finite() || scale.abs() < SCALE_EPSILON {
                return Err(format!("Scaler scale[{}] is degenerate: {}", i, scale));
            }
        }

        Ok(())
    }
}

/// One node of a fitted decision tree
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    /// Interior split: go left when `x[feature] <= threshold`
    Split {
        /// Feature index into the scaled vector
        feature: usize,
        /// Split threshold in scaled units
        threshold: f32,
        /// Node index when `x[feature] <= threshold`
        left: usize,
        /// Node index otherwise
        right: usize,
    },
    /// Terminal node
    Leaf {
        /// Positive-class probability at this leaf
        probability: f32,
    },
}

/// One fitted binary decision tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Flat node list; index 0 is the root
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Walk from the root to a leaf probability.
    ///
    /// A well-formed tree terminates within `nodes.len()` steps; exceeding
    /// that means the node graph cycles.
    fn predict(&self, features: &[f32]) -> Result<f32, PipelineError> {
        let mut index = 0usize;

        for _ in 0..self.nodes.len() {
            match self.nodes.get(index) {
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = match features.get(*feature) {
                        Some(&value) => value,
                        None => {
                            return Err(PipelineError::ClassificationError(format!(
                                "Tree splits on feature {} with only {} inputs",
                                feature,
                                features.len()
                            )))
                        }
                    };
                    index = if value <= *threshold { *left } else { *right };
                }
                Some(TreeNode::Leaf { probability }) => return Ok(*probability),
                None => {
                    return Err(PipelineError::ClassificationError(format!(
                        "Tree walk reached out-of-range node {}",
                        index
                    )))
                }
            }
        }

        Err(PipelineError::ClassificationError(
            "Tree walk exceeded the node count".to_string(),
        ))
    }
}

/// Averaged ensemble of binary decision trees
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskModel {
    /// Feature count the ensemble was fit on
    pub n_features: usize,

    /// The fitted trees
    pub trees: Vec<DecisionTree>,
}

impl RiskModel {
    /// Mean positive-class probability across the ensemble.
    ///
    /// # Errors
    ///
    /// `ClassificationError` on a dimension mismatch, a malformed walk, or
    /// a non-finite result.
    pub fn predict_proba(&self, features: &[f32]) -> Result<f32, PipelineError> {
        if features.len() != self.n_features {
            return Err(PipelineError::ClassificationError(format!(
                "Model expects {} features, got {}",
                self.n_features,
                features.len()
            )));
        }

        let mut sum = 0.0f32;
        for tree in &self.trees {
            sum += tree.predict(features)?;
        }

        let probability = sum / self.trees.len() as f32;
        if !probability.is_finite() {
            return Err(PipelineError::ClassificationError(format!(
                "Ensemble produced a non-finite probability: {}",
                probability
            )));
        }

        Ok(probability)
    }

    fn validate(&self) -> Result<(), String> {
        if self.n_features != FEATURE_COUNT {
            return Err(format!(
                "Model was fit on {} features, schema has {}",
                self.n_features, FEATURE_COUNT
            ));
        }

        if self.trees.is_empty() {
            return Err("Model has no trees".to_string());
        }

        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(format!("Tree {} has no nodes", t));
            }

            for (n, node) in tree.nodes.iter().enumerate() {
                match node {
                    TreeNode::Split {
                        feature,
                        threshold,
                        left,
                        right,
                    } => {
                        if *feature >= self.n_features {
                            return Err(format!(
                                "Tree {} node {} splits on feature {} of {}",
                                t, n, feature, self.n_features
                            ));
                        }
                        if *left >= tree.nodes.len() || *right >= tree.nodes.len() {
                            return Err(format!(
                                "Tree {} node {} points past the node list ({} nodes)",
                                t,
                                n,
                                tree.nodes.len()
                            ));
                        }
                        if !threshold.is_finite() {
                            return Err(format!(
                                "Tree {} node {} has a non-finite threshold",
                                t, n
                            ));
                        }
                    }
                    TreeNode::Leaf { probability } => {
                        if !probability.is_finite() || !(0.0..=1.0).contains(probability) {
                            return Err(format!(
                                "Tree {} node {} leaf probability {} outside [0, 1]",
                                t, n, probability
                            ));
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

/// The loaded scaler/model pair, shared read-only across requests
#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    /// Fitted feature scaler
    pub scaler: FeatureScaler,

    /// Fitted risk model
    pub model: RiskModel,
}

impl ModelArtifacts {
    /// Load and validate both artifacts from JSON files.
    ///
    /// # Errors
    ///
    /// `ArtifactError` with a path-qualified diagnostic on any read, parse,
    /// validation, or cross-check failure.
    pub fn load(scaler_path: &Path, model_path: &Path) -> Result<Self, PipelineError> {
        log::debug!(
            "Loading artifacts: scaler {}, model {}",
            scaler_path.display(),
            model_path.display()
        );

        let scaler: FeatureScaler = read_json(scaler_path, "feature scaler")?;
        scaler.validate().map_err(|e| {
            PipelineError::ArtifactError(format!("{}: {}", scaler_path.display(), e))
        })?;

        let model: RiskModel = read_json(model_path, "risk model")?;
        model.validate().map_err(|e| {
            PipelineError::ArtifactError(format!("{}: {}", model_path.display(), e))
        })?;

        cross_check(&scaler, &model).map_err(PipelineError::ArtifactError)?;

        log::debug!(
            "Artifacts ready: {} features, {} trees",
            model.n_features,
            model.trees.len()
        );

        Ok(Self { scaler, model })
    }

    /// Build artifacts from already-deserialized parts, applying the same
    /// validation as [`ModelArtifacts::load`].
    pub fn from_parts(scaler: FeatureScaler, model: RiskModel) -> Result<Self, PipelineError> {
        scaler.validate().map_err(PipelineError::ArtifactError)?;
        model.validate().map_err(PipelineError::ArtifactError)?;
        cross_check(&scaler, &model).map_err(PipelineError::ArtifactError)?;
        Ok(Self { scaler, model })
    }
}

fn cross_check(scaler: &FeatureScaler, model: &RiskModel) -> Result<(), String> {
    if model.n_features != scaler.mean.len() {
        return Err(format!(
            "Model expects {} features but the scaler was fit on {}",
            model.n_features,
            scaler.mean.len()
        ));
    }
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T, PipelineError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        PipelineError::ArtifactError(format!(
            "Failed to read {} at {}: {}",
            what,
            path.display(),
            e
        ))
    })?;

    serde_json::from_str(&text).map_err(|e| {
        PipelineError::ArtifactError(format!(
            "Failed to parse {} at {}: {}",
            what,
            path.display(),
            e
        ))
    })
}
