//! Acoustic measurement cascade
//!
//! Drives the feature extractors as a two-layer fallback cascade so that
//! analysis always completes with a fully populated measurement:
//!
//! - **Layer 1** estimates the pitch contour. If it fails, every measure
//!   drops to neutral constants and Layer 2 is never attempted.
//! - **Layer 2** extracts periodicity markers and computes the jitter,
//!   shimmer, and harmonicity measures. If it fails, those measures drop to
//!   typical healthy-voice constants while the measured pitch is kept.
//!
//! Downstream classification needs every feature slot filled, so adverse
//! recordings (noise, clipping, too little voicing) degrade the measurement
//! instead of aborting the request. Each fallback emits a warning and a
//! diagnostic notice on the measurement.

use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::features::harmonicity::{compute_harmonicity, HarmonicityMeasures};
use crate::features::markers::{cycle_series, extract_markers};
use crate::features::perturbation::{
    compute_jitter, compute_shimmer, JitterMeasures, ShimmerMeasures,
};
use crate::features::pitch::{estimate_pitch_contour, PitchContour};
use crate::preprocessing::AudioBuffer;

/// Neutral mean F0 substituted when pitch estimation fails
pub const NEUTRAL_F0_MEAN_HZ: f32 = 150.0;

/// Neutral maximum F0 substituted when pitch estimation fails
pub const NEUTRAL_F0_MAX_HZ: f32 = 200.0;

/// Neutral minimum F0 substituted when pitch estimation fails
pub const NEUTRAL_F0_MIN_HZ: f32 = 100.0;

/// Typical healthy-voice jitter substituted when perturbation analysis fails
pub const TYPICAL_JITTER: JitterMeasures = JitterMeasures {
    local: 0.007,
    local_absolute: 0.00006,
    rap: 0.003,
    ppq5: 0.004,
    ddp: 0.009,
};

/// Typical healthy-voice shimmer substituted when perturbation analysis fails
pub const TYPICAL_SHIMMER: ShimmerMeasures = ShimmerMeasures {
    local: 0.030,
    local_db: 0.300,
    apq3: 0.015,
    apq5: 0.018,
    apq11: 0.025,
    dda: 0.045,
};

/// Typical healthy-voice noise measures substituted when perturbation
/// analysis fails
pub const TYPICAL_HARMONICITY: HarmonicityMeasures = HarmonicityMeasures {
    hnr_db: 18.0,
    nhr: 0.040,
};

/// The perturbation suite needs eleven accepted cycles for its widest
/// sub-measure window (APQ11)
const MIN_CYCLES: usize = 11;

/// Complete acoustic measurement with per-layer provenance
///
/// Every field always holds a value: a genuine measurement when the
/// corresponding layer succeeded, a documented constant otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcousticMeasurement {
    /// Mean fundamental frequency in Hz
    pub f0_mean_hz: f32,

    /// Maximum fundamental frequency in Hz
    pub f0_max_hz: f32,

    /// Minimum fundamental frequency in Hz
    pub f0_min_hz: f32,

    /// Jitter sub-measures
    pub jitter: JitterMeasures,

    /// Shimmer sub-measures
    pub shimmer: ShimmerMeasures,

    /// Noise measures
    pub harmonicity: HarmonicityMeasures,

    /// True when the F0 values come from a measured contour
    pub pitch_measured: bool,

    /// True when jitter/shimmer/harmonicity come from measured cycles
    pub perturbation_measured: bool,

    /// Diagnostic notices for every fallback taken
    pub notices: Vec<String>,
}

/// Measurement plus the retained pitch contour values
///
/// The contour feeds the nonlinear-style features of vector assembly; on
/// pitch failure it is the single-sample neutral placeholder.
#[derive(Debug, Clone)]
pub struct VoiceAnalysis {
    /// The populated measurement
    pub measurement: AcousticMeasurement,

    /// Per-frame F0 values in Hz
    pub f0_contour: Vec<f32>,
}

/// Run the full measurement cascade over a conditioned buffer.
///
/// Never fails: adverse signals degrade to documented constants with
/// diagnostic notices instead of raising.
///
/// # Example
///
/// ```no_run
/// use voxscreen_dsp::analysis::measurement::analyze_voice;
/// use voxscreen_dsp::config::PipelineConfig;
/// use voxscreen_dsp::preprocessing::AudioBuffer;
///
/// let buffer = AudioBuffer {
///     samples: vec![0.0; 44100],
///     sample_rate: 44100,
/// };
/// let analysis = analyze_voice(&buffer, &PipelineConfig::default());
/// println!(
///     "F0 {:.1} Hz (measured: {})",
///     analysis.measurement.f0_mean_hz, analysis.measurement.pitch_measured
/// );
/// ```
pub fn analyze_voice(buffer: &AudioBuffer, config: &PipelineConfig) -> VoiceAnalysis {
    let mut notices = Vec::new();

    // Layer 1: pitch contour
    let contour = match estimate_pitch_contour(
        &buffer.samples,
        buffer.sample_rate,
        config.f0_min_hz,
        config.f0_max_hz,
        config.voicing_threshold,
        config.frame_silence_fraction,
        config.octave_cost,
    ) {
        Ok(contour) => contour,
        Err(e) => {
            log::warn!("Pitch analysis failed, using neutral constants: {}", e);
            notices.push(format!(
                "Pitch analysis fell back to neutral constants: {}",
                e
            ));
            return VoiceAnalysis {
                measurement: AcousticMeasurement {
                    f0_mean_hz: NEUTRAL_F0_MEAN_HZ,
                    f0_max_hz: NEUTRAL_F0_MAX_HZ,
                    f0_min_hz: NEUTRAL_F0_MIN_HZ,
                    jitter: TYPICAL_JITTER,
                    shimmer: TYPICAL_SHIMMER,
                    harmonicity: TYPICAL_HARMONICITY,
                    pitch_measured: false,
                    perturbation_measured: false,
                    notices,
                },
                f0_contour: vec![NEUTRAL_F0_MEAN_HZ],
            };
        }
    };

    log::debug!(
        "Pitch layer: {} voiced frames, mean F0 {:.1} Hz",
        contour.len(),
        contour.mean_f0()
    );

    // Layer 2: perturbation measures, only on top of a measured contour
    let (jitter, shimmer, harmonicity, perturbation_measured) =
        match measure_perturbation(&buffer.samples, &contour, config) {
            Ok((jitter, shimmer, harmonicity)) => (jitter, shimmer, harmonicity, true),
            Err(e) => {
                log::warn!("Perturbation analysis failed, using typical values: {}", e);
                notices.push(format!(
                    "Perturbation analysis fell back to typical values: {}",
                    e
                ));
                (TYPICAL_JITTER, TYPICAL_SHIMMER, TYPICAL_HARMONICITY, false)
            }
        };

    VoiceAnalysis {
        measurement: AcousticMeasurement {
            f0_mean_hz: contour.mean_f0(),
            f0_max_hz: contour.max_f0(),
            f0_min_hz: contour.min_f0(),
            jitter,
            shimmer,
            harmonicity,
            pitch_measured: true,
            perturbation_measured,
            notices,
        },
        f0_contour: contour.f0_values(),
    }
}

/// Layer 2 as one fallible unit: markers, cycle filtering, and all three
/// measure families succeed or fail together
fn measure_perturbation(
    samples: &[f32],
    contour: &PitchContour,
    config: &PipelineConfig,
) -> Result<(JitterMeasures, ShimmerMeasures, HarmonicityMeasures), PipelineError> {
    let markers = extract_markers(samples, contour)?;
    let series = cycle_series(
        samples,
        &markers,
        contour.sample_rate,
        config.period_floor_secs,
        config.period_ceiling_secs,
        config.max_period_factor,
    );

    if series.len() < MIN_CYCLES {
        return Err(PipelineError::ProcessingError(format!(
            "Only {} accepted glottal cycles, need at least {}",
            series.len(),
            MIN_CYCLES
        )));
    }

    let jitter = compute_jitter(&series.periods)?;
    let shimmer = compute_shimmer(&series.amplitudes)?;
    let harmonicity = compute_harmonicity(contour)?;

    Ok((jitter, shimmer, harmonicity))
}
