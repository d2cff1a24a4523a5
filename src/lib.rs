//! # Voxscreen DSP
//!
//! An acoustic feature-extraction and risk-screening engine for sustained-vowel
//! voice recordings, estimating a probabilistic risk indicator for a
//! neurological voice disorder.
//!
//! ## Features
//!
//! - **Signal Conditioning**: resampling, amplitude normalization, and
//!   silence trimming with a no-viable-speech short-circuit
//! - **Acoustic Measurement**: pitch contour, jitter, shimmer, HNR/NHR via a
//!   layered fallback cascade that always completes
//! - **Feature Assembly**: the fixed 22-feature vector matching the
//!   classifier's training schema
//! - **Risk Classification**: pre-trained scaler + tree-ensemble artifacts
//!   mapping probability to an ordered risk category
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use voxscreen_dsp::{screen_recording, ModelArtifacts, PipelineConfig};
//!
//! // Load the pre-trained artifacts once at startup
//! let artifacts = ModelArtifacts::load(Path::new("scaler.json"), Path::new("model.json"))?;
//!
//! // Screen a mono recording (f32 samples at a known rate)
//! let samples: Vec<f32> = vec![]; // Your audio data
//! let result = screen_recording(&samples, 44100, &PipelineConfig::default(), &artifacts)?;
//!
//! println!(
//!     "{} ({:.2}%)",
//!     result.classification.category.label(),
//!     result.classification.probability * 100.0
//! );
//! # Ok::<(), voxscreen_dsp::PipelineError>(())
//! ```
//!
//! ## Architecture
//!
//! The screening pipeline follows this flow:
//!
//! ```text
//! Audio Input → Signal Conditioning → Acoustic Measurement → Feature Assembly → Classification → Report
//! ```
//!
//! Each stage is public, so callers can compose them directly.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod features;
pub mod ml;
pub mod preprocessing;

// Re-export main types
pub use analysis::measurement::{analyze_voice, AcousticMeasurement, VoiceAnalysis};
pub use analysis::result::{
    ClassificationResult, RiskCategory, ScreeningMetadata, ScreeningReport, ScreeningResult,
};
pub use analysis::vector::{assemble, FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use config::PipelineConfig;
pub use error::PipelineError;
pub use ml::artifacts::{FeatureScaler, ModelArtifacts, RiskModel};
pub use ml::classifier::classify;
pub use preprocessing::{condition, AudioBuffer, Conditioned};

/// Screen one recording end-to-end.
///
/// Conditions the signal, measures the acoustic features with graceful
/// degradation, assembles the classifier vector, and classifies it. A
/// recording with no viable speech short-circuits to the sentinel result
/// without invoking the analyzer or classifier.
///
/// # Arguments
///
/// * `samples` - Mono audio samples, nominally in [-1.0, 1.0]
/// * `sample_rate` - Sample rate of `samples` in Hz
/// * `config` - Pipeline configuration parameters
/// * `artifacts` - Pre-loaded scaler and model
///
/// # Returns
///
/// `ScreeningResult` with the classification and screening metadata
///
/// # Errors
///
/// `InvalidInput` for a malformed call (zero sample rate),
/// `VectorShapeMismatch` or `ClassificationError` for structural failures
/// downstream. Degraded analysis never errors; it surfaces as metadata
/// notices instead.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use voxscreen_dsp::{screen_recording, ModelArtifacts, PipelineConfig};
///
/// let artifacts = ModelArtifacts::load(Path::new("scaler.json"), Path::new("model.json"))?;
/// let samples = vec![0.0f32; 44100 * 5]; // 5 seconds of capture
/// let result = screen_recording(&samples, 44100, &PipelineConfig::default(), &artifacts)?;
/// # Ok::<(), voxscreen_dsp::PipelineError>(())
/// ```
pub fn screen_recording(
    samples: &[f32],
    sample_rate: u32,
    config: &PipelineConfig,
    artifacts: &ModelArtifacts,
) -> Result<ScreeningResult, PipelineError> {
    use std::time::Instant;
    let start_time = Instant::now();

    log::debug!(
        "Starting screening: {} samples at {} Hz",
        samples.len(),
        sample_rate
    );

    // Stage 1: signal conditioning
    let buffer = match condition(samples, sample_rate, config)? {
        Conditioned::Usable(buffer) => buffer,
        Conditioned::Insufficient { reason } => {
            log::warn!("No viable speech: {}", reason);
            return Ok(ScreeningResult {
                classification: ClassificationResult::no_viable_speech(),
                metadata: ScreeningMetadata {
                    duration_seconds: samples.len() as f32 / sample_rate as f32,
                    sample_rate,
                    processing_time_ms: start_time.elapsed().as_secs_f32() * 1000.0,
                    engine_version: env!("CARGO_PKG_VERSION").to_string(),
                    pitch_measured: false,
                    perturbation_measured: false,
                    notices: vec![reason],
                },
            });
        }
    };

    // Stage 2: acoustic measurement (degrades, never fails)
    let analysis = analyze_voice(&buffer, config);

    // Stage 3: feature vector assembly
    let vector = assemble(&analysis.measurement, &analysis.f0_contour)?;

    // Stage 4: classification
    let classification = classify(&vector, artifacts)?;

    let processing_time_ms = start_time.elapsed().as_secs_f32() * 1000.0;
    log::debug!(
        "Screening complete in {:.1} ms: {:?} ({:.4})",
        processing_time_ms,
        classification.category,
        classification.probability
    );

    let measurement = analysis.measurement;
    Ok(ScreeningResult {
        classification,
        metadata: ScreeningMetadata {
            duration_seconds: buffer.duration_seconds(),
            sample_rate: buffer.sample_rate,
            processing_time_ms,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            pitch_measured: measurement.pitch_measured,
            perturbation_measured: measurement.perturbation_measured,
            notices: measurement.notices,
        },
    })
}
