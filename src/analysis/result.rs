//! Screening result types

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Ordered risk category derived from the positive-class probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskCategory {
    /// No viable speech was analyzed
    None,
    /// Probability below 0.50
    LowRisk,
    /// Probability in [0.50, 0.75)
    ModerateRisk,
    /// Probability in [0.75, 0.90)
    HighRisk,
    /// Probability at or above 0.90
    CriticalRisk,
}

impl RiskCategory {
    /// Map a probability to its category.
    ///
    /// Thresholds are evaluated highest-first, so every probability in
    /// [0, 1] lands in exactly one category.
    ///
    /// # Example
    ///
    /// ```
    /// use voxscreen_dsp::analysis::result::RiskCategory;
    ///
    /// assert_eq!(RiskCategory::from_probability(0.92), RiskCategory::CriticalRisk);
    /// assert_eq!(RiskCategory::from_probability(0.80), RiskCategory::HighRisk);
    /// assert_eq!(RiskCategory::from_probability(0.60), RiskCategory::ModerateRisk);
    /// assert_eq!(RiskCategory::from_probability(0.10), RiskCategory::LowRisk);
    /// ```
    pub fn from_probability(probability: f32) -> Self {
        if probability >= 0.90 {
            RiskCategory::CriticalRisk
        } else if probability >= 0.75 {
            RiskCategory::HighRisk
        } else if probability >= 0.50 {
            RiskCategory::ModerateRisk
        } else {
            RiskCategory::LowRisk
        }
    }

    /// Report label for the category
    ///
    /// # Example
    ///
    /// ```
    /// use voxscreen_dsp::analysis::result::RiskCategory;
    ///
    /// assert_eq!(RiskCategory::CriticalRisk.label(), "Critical Risk");
    /// assert_eq!(RiskCategory::None.label(), "None");
    /// ```
    pub fn label(&self) -> &'static str {
        match self {
            RiskCategory::None => "None",
            RiskCategory::LowRisk => "Low Risk",
            RiskCategory::ModerateRisk => "Moderate Risk",
            RiskCategory::HighRisk => "High Risk",
            RiskCategory::CriticalRisk => "Critical Risk",
        }
    }

    /// Human-readable status line paired with the category
    pub fn status(&self) -> &'static str {
        match self {
            RiskCategory::None => "No viable speech detected (try speaking louder).",
            RiskCategory::LowRisk => "Healthy Voice Signature",
            RiskCategory::ModerateRisk => "Moderate Risk Detected",
            RiskCategory::HighRisk => "Elevated Risk Detected",
            RiskCategory::CriticalRisk => "High Risk Detected (Urgent Follow-up Recommended)",
        }
    }
}

/// Classifier output for one screening
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Binary label, 1 for the positive (at-risk) class
    pub label: u8,

    /// Positive-class probability in [0, 1]
    pub probability: f32,

    /// Risk category derived from the probability
    pub category: RiskCategory,
}

impl ClassificationResult {
    /// Sentinel result for recordings with no viable speech
    pub fn no_viable_speech() -> Self {
        Self {
            label: 0,
            probability: 0.0,
            category: RiskCategory::None,
        }
    }
}

/// Screening metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningMetadata {
    /// Conditioned audio duration in seconds
    pub duration_seconds: f32,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Processing time in milliseconds
    pub processing_time_ms: f32,

    /// Engine version
    pub engine_version: String,

    /// True when pitch was genuinely measured
    pub pitch_measured: bool,

    /// True when perturbation measures were genuinely measured
    pub perturbation_measured: bool,

    /// Diagnostic notices for any fallback taken
    pub notices: Vec<String>,
}

impl Default for ScreeningMetadata {
    fn default() -> Self {
        Self {
            duration_seconds: 0.0,
            sample_rate: 0,
            processing_time_ms: 0.0,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            pitch_measured: false,
            perturbation_measured: false,
            notices: vec![],
        }
    }
}

/// Complete screening result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningResult {
    /// Classifier output (or the no-speech sentinel)
    pub classification: ClassificationResult,

    /// Screening metadata
    pub metadata: ScreeningMetadata,
}

/// Serializable report in the external wire shape
///
/// Covers the three report forms: an analyzed recording, the no-speech
/// sentinel, and a fatal pipeline error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningReport {
    /// Error message, present only for the fatal-error form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Binary label (0 for no-speech and error forms)
    pub label: u8,

    /// Probability formatted as a percentage, absent on the error form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<String>,

    /// Status line
    pub status: String,

    /// Risk category label, or "Error"
    pub risk_category: String,
}

impl ScreeningReport {
    /// Build the report for a completed screening
    pub fn from_result(result: &ScreeningResult) -> Self {
        let classification = &result.classification;
        Self {
            error: None,
            label: classification.label,
            score: Some(format!("{:.2}%", classification.probability * 100.0)),
            status: classification.category.status().to_string(),
            risk_category: classification.category.label().to_string(),
        }
    }

    /// Build the report for a fatal pipeline error
    pub fn from_error(error: &PipelineError) -> Self {
        Self {
            error: Some(error.to_string()),
            label: 0,
            score: None,
            status: "Error: Check terminal".to_string(),
            risk_category: "Error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_ladder() {
        let cases = [
            (0.49, RiskCategory::LowRisk),
            (0.50, RiskCategory::ModerateRisk),
            (0.749, RiskCategory::ModerateRisk),
            (0.75, RiskCategory::HighRisk),
            (0.899, RiskCategory::HighRisk),
            (0.90, RiskCategory::CriticalRisk),
            (0.999, RiskCategory::CriticalRisk),
        ];
        for (probability, expected) in cases {
            assert_eq!(
                RiskCategory::from_probability(probability),
                expected,
                "probability {} should map to {:?}",
                probability,
                expected
            );
        }
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(RiskCategory::None.label(), "None");
        assert_eq!(RiskCategory::LowRisk.label(), "Low Risk");
        assert_eq!(RiskCategory::ModerateRisk.label(), "Moderate Risk");
        assert_eq!(RiskCategory::HighRisk.label(), "High Risk");
        assert_eq!(RiskCategory::CriticalRisk.label(), "Critical Risk");
    }

    #[test]
    fn test_category_statuses() {
        assert_eq!(RiskCategory::LowRisk.status(), "Healthy Voice Signature");
        assert_eq!(
            RiskCategory::CriticalRisk.status(),
            "High Risk Detected (Urgent Follow-up Recommended)"
        );
        assert_eq!(
            RiskCategory::None.status(),
            "No viable speech detected (try speaking louder)."
        );
    }

    #[test]
    fn test_no_speech_sentinel_report_shape() {
        let result = ScreeningResult {
            classification: ClassificationResult::no_viable_speech(),
            metadata: ScreeningMetadata::default(),
        };
        let report = ScreeningReport::from_result(&result);
        let json = serde_json::to_string(&report).unwrap();

        assert_eq!(
            json,
            r#"{"label":0,"score":"0.00%","status":"No viable speech detected (try speaking louder).","risk_category":"None"}"#
        );
    }

    #[test]
    fn test_analyzed_report_formats_score() {
        let result = ScreeningResult {
            classification: ClassificationResult {
                label: 1,
                probability: 0.92,
                category: RiskCategory::from_probability(0.92),
            },
            metadata: ScreeningMetadata::default(),
        };
        let report = ScreeningReport::from_result(&result);

        assert_eq!(report.label, 1);
        assert_eq!(report.score.as_deref(), Some("92.00%"));
        assert_eq!(
            report.status,
            "High Risk Detected (Urgent Follow-up Recommended)"
        );
        assert_eq!(report.risk_category, "Critical Risk");
    }

    #[test]
    fn test_error_report_shape() {
        let error = PipelineError::ArtifactError("scaler missing".to_string());
        let report = ScreeningReport::from_error(&error);
        let json = serde_json::to_string(&report).unwrap();

        assert_eq!(report.label, 0);
        assert_eq!(report.risk_category, "Error");
        assert_eq!(report.status, "Error: Check terminal");
        assert!(json.contains("scaler missing"));
        assert!(!json.contains("score"), "error form carries no score");
    }

    #[test]
    fn test_metadata_default_carries_version() {
        let metadata = ScreeningMetadata::default();
        assert_eq!(metadata.engine_version, env!("CARGO_PKG_VERSION"));
        assert!(metadata.notices.is_empty());
    }
}
