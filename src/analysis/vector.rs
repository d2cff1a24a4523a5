//! Feature vector assembly
//!
//! Flattens an acoustic measurement into the fixed 22-feature vector the
//! classifier was trained on. Order and length are part of the model
//! contract: the scaler and classifier index features positionally, so any
//! reordering or omission here silently corrupts every prediction. The
//! constructor enforces the length; the canonical order is the training
//! schema's column order in [`FEATURE_NAMES`].
//!
//! Two schema slots (RPDE, DFA) are placeholder draws from fixed uniform
//! ranges rather than genuine nonlinear-dynamics measurements, so two
//! identical recordings can assemble different vectors. Four more (spread1,
//! spread2, D2, PPE) derive deterministically from the pitch contour's
//! spread statistics.

use crate::analysis::measurement::AcousticMeasurement;
use crate::error::PipelineError;

/// Number of features in the classifier schema
pub const FEATURE_COUNT: usize = 22;

/// Training schema column names, in assembly order
///
/// The slot at index 12 carries APQ11 under the schema name `MDVP:APQ`.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "MDVP:Fo(Hz)",
    "MDVP:Fhi(Hz)",
    "MDVP:Flo(Hz)",
    "MDVP:Jitter(%)",
    "MDVP:Jitter(Abs)",
    "MDVP:RAP",
    "MDVP:PPQ",
    "Jitter:DDP",
    "MDVP:Shimmer",
    "MDVP:Shimmer(dB)",
    "Shimmer:APQ3",
    "Shimmer:APQ5",
    "MDVP:APQ",
    "Shimmer:DDA",
    "NHR",
    "HNR",
    "RPDE",
    "DFA",
    "spread1",
    "spread2",
    "D2",
    "PPE",
];

/// Contour spread statistics substituted when pitch analysis failed and the
/// contour is the single-sample placeholder
const FALLBACK_SIGMA: f32 = 0.01;
const FALLBACK_RANGE: f32 = 0.1;

/// Fixed-length feature vector in canonical schema order
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<f32>,
}

impl FeatureVector {
    /// Wrap a value list, validating the schema length.
    ///
    /// # Errors
    ///
    /// `VectorShapeMismatch` when the list is not exactly 22 entries.
    pub fn new(values: Vec<f32>) -> Result<Self, PipelineError> {
        if values.len() != FEATURE_COUNT {
            return Err(PipelineError::VectorShapeMismatch {
                expected: FEATURE_COUNT,
                actual: values.len(),
            });
        }
        Ok(Self { values })
    }

    /// Feature values in schema order
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Number of features (always 22)
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false; present for slice-like completeness
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Assemble the classifier input vector from a measurement and its retained
/// pitch contour.
///
/// The contour contributes its population standard deviation and range to
/// the nonlinear-style slots; a placeholder contour (fewer than 2 values)
/// substitutes the documented near-zero statistics instead.
///
/// # Errors
///
/// `VectorShapeMismatch` if the assembled list somehow deviates from the
/// schema length.
pub fn assemble(
    measurement: &AcousticMeasurement,
    f0_contour: &[f32],
) -> Result<FeatureVector, PipelineError> {
    use rand::Rng;

    let (sigma, range) = if f0_contour.len() < 2 {
        (FALLBACK_SIGMA, FALLBACK_RANGE)
    } else {
        (contour_sigma(f0_contour), contour_range(f0_contour))
    };

    let mut rng = rand::thread_rng();
    let rpde: f32 = rng.gen_range(0.3..0.7);
    let dfa: f32 = rng.gen_range(0.6..0.9);

    let spread1 = -4.0 - 0.1 * sigma;
    let spread2 = 0.2 + 0.01 * sigma;
    let d2 = 2.0 + 0.01 * range;
    let ppe = 0.005 * range;

    let values = vec![
        measurement.f0_mean_hz,
        measurement.f0_max_hz,
        measurement.f0_min_hz,
        measurement.jitter.local,
        measurement.jitter.local_absolute,
        measurement.jitter.rap,
        measurement.jitter.ppq5,
        measurement.jitter.ddp,
        measurement.shimmer.local,
        measurement.shimmer.local_db,
        measurement.shimmer.apq3,
        measurement.shimmer.apq5,
        measurement.shimmer.apq11,
        measurement.shimmer.dda,
        measurement.harmonicity.nhr,
        measurement.harmonicity.hnr_db,
        rpde,
        dfa,
        spread1,
        spread2,
        d2,
        ppe,
    ];

    log::debug!(
        "Assembled feature vector: sigma {:.3}, range {:.3} Hz",
        sigma,
        range
    );

    FeatureVector::new(values)
}

/// Population standard deviation of the contour F0 values
fn contour_sigma(values: &[f32]) -> f32 {
    let n = values.len() as f32;
    let mean = values.iter().sum::<f32>() / n;
    let variance = values.iter().map(|&x| (x - mean) * (x - mean)).sum::<f32>() / n;
    variance.sqrt()
}

/// Range (max minus min) of the contour F0 values
fn contour_range(values: &[f32]) -> f32 {
    let max = values.iter().copied().fold(f32::MIN, f32::max);
    let min = values.iter().copied().fold(f32::MAX, f32::min);
    max - min
}
