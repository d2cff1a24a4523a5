//! Harmonicity summary measures
//!
//! Converts per-frame autocorrelation harmonicity into the two noise
//! measures of the feature set: mean harmonics-to-noise ratio in dB and
//! mean noise-to-harmonics ratio.
//!
//! # Reference
//!
//! Boersma (1993): with normalized autocorrelation r at the pitch period,
//! HNR = 10 log10(r / (1 - r)) and NHR = (1 - r) / r.

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::features::pitch::PitchContour;

/// Harmonicity values are clamped into `[R_CLAMP, 1 - R_CLAMP]` so both
/// ratios stay finite
const R_CLAMP: f32 = 1e-6;

/// Noise measures averaged over the voiced frames of a contour
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HarmonicityMeasures {
    /// Mean harmonics-to-noise ratio in dB
    pub hnr_db: f32,
    /// Mean noise-to-harmonics ratio
    pub nhr: f32,
}

/// Average the frame-level noise ratios of a pitch contour.
///
/// # Errors
///
/// `InvalidInput` when the contour has no frames.
pub fn compute_harmonicity(contour: &PitchContour) -> Result<HarmonicityMeasures, PipelineError> {
    if contour.is_empty() {
        return Err(PipelineError::InvalidInput(
            "Empty pitch contour".to_string(),
        ));
    }

    let mut hnr_sum = 0.0f32;
    let mut nhr_sum = 0.0f32;

    for frame in &contour.frames {
        let r = frame.harmonicity.clamp(R_CLAMP, 1.0 - R_CLAMP);
        hnr_sum += 10.0 * (r / (1.0 - r)).log10();
        nhr_sum += (1.0 - r) / r;
    }

    let count = contour.len() as f32;
    Ok(HarmonicityMeasures {
        hnr_db: hnr_sum / count,
        nhr: nhr_sum / count,
    })
}
