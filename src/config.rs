//! Configuration parameters for the screening pipeline

use crate::preprocessing::normalization::NormalizationMethod;

/// Pipeline configuration parameters
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    // Signal conditioning
    /// Sample rate every buffer is resampled to at ingestion (default: 44100)
    pub target_sample_rate: u32,

    /// Nominal capture duration in seconds (default: 5.0)
    /// Used by the trim-discard policy, not enforced on input length
    pub nominal_duration_secs: f32,

    /// Minimum conditioned duration in seconds considered analyzable (default: 0.25)
    pub min_viable_secs: f32,

    /// Normalization method to use (default: Peak)
    pub normalization: NormalizationMethod,

    /// Target RMS level in dBFS for RMS normalization (default: -20.0)
    pub target_rms_db: f32,

    /// Edge-trim threshold in dB relative to peak (default: -20.0)
    /// Frames with RMS below this threshold count as silence
    pub trim_threshold_db: f32,

    /// Frame size for the edge-trim RMS scan (default: 2048)
    pub trim_frame_size: usize,

    /// Hop size for the edge-trim RMS scan (default: 512)
    pub trim_hop_size: usize,

    // Pitch analysis
    /// Lowest fundamental frequency considered, in Hz (default: 75.0)
    pub f0_min_hz: f32,

    /// Highest fundamental frequency considered, in Hz (default: 600.0)
    pub f0_max_hz: f32,

    /// Normalized autocorrelation peak required to call a frame voiced (default: 0.45)
    pub voicing_threshold: f32,

    /// Frames whose peak falls below this fraction of the global peak are
    /// skipped as silence (default: 0.03)
    pub frame_silence_fraction: f32,

    /// Per-octave penalty applied to longer-lag pitch candidates (default: 0.01)
    /// Keeps subharmonic peaks from beating the fundamental
    pub octave_cost: f32,

    // Perturbation analysis
    /// Shortest accepted glottal cycle period in seconds (default: 0.0001)
    pub period_floor_secs: f32,

    /// Longest accepted glottal cycle period in seconds (default: 0.02)
    pub period_ceiling_secs: f32,

    /// Maximum allowed ratio between neighboring cycle periods (default: 1.3)
    pub max_period_factor: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 44100,
            nominal_duration_secs: 5.0,
            min_viable_secs: 0.25,
            normalization: NormalizationMethod::Peak,
            target_rms_db: -20.0,
            trim_threshold_db: -20.0,
            trim_frame_size: 2048,
            trim_hop_size: 512,
            f0_min_hz: 75.0,
            f0_max_hz: 600.0,
            voicing_threshold: 0.45,
            frame_silence_fraction: 0.03,
            octave_cost: 0.01,
            period_floor_secs: 0.0001,
            period_ceiling_secs: 0.02,
            max_period_factor: 1.3,
        }
    }
}
