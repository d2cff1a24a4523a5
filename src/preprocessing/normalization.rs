//! Amplitude normalization utilities
//!
//! Supports two normalization methods:
//! - Peak normalization (scales the buffer to full scale)
//! - RMS normalization (scales to a target RMS level with a clip guard)
//!
//! # Example
//!
//! ```no_run
//! use voxscreen_dsp::preprocessing::normalization::{normalize, NormalizationMethod};
//!
//! let mut samples = vec![0.5f32; 44100];
//! let metadata = normalize(&mut samples, NormalizationMethod::Peak, -20.0)?;
//! println!("Applied gain: {:.2} dB", metadata.gain_db);
//! # Ok::<(), voxscreen_dsp::PipelineError>(())
//! ```

use crate::error::PipelineError;

/// Normalization method
#[derive(Debug, Clone, Copy)]
pub enum NormalizationMethod {
    /// Simple peak normalization (scales to full-scale peak)
    Peak,
    /// RMS-based normalization (scales to target RMS level)
    RMS,
}

/// Gain metadata returned from normalization
#[derive(Debug, Clone)]
pub struct GainMetadata {
    /// Peak level in dB (before normalization)
    pub peak_db: f32,
    /// RMS level in dB (before normalization)
    pub rms_db: f32,
    /// Gain applied in dB
    pub gain_db: f32,
}

impl GainMetadata {
    /// True when the buffer carried no measurable signal and no gain was applied
    pub fn is_silent(&self) -> bool {
        self.peak_db == f32::NEG_INFINITY
    }
}

/// Numerical stability epsilon for divisions
pub(crate) const EPSILON: f32 = 1e-10;

/// Normalize audio samples using peak normalization
fn normalize_peak(samples: &mut [f32]) -> Result<GainMetadata, PipelineError> {
    if samples.is_empty() {
        return Err(PipelineError::InvalidInput(
            "Empty audio samples".to_string(),
        ));
    }

    // Find peak value
    let peak = samples.iter().map(|&x| x.abs()).fold(0.0f32, f32::max);

    if peak <= EPSILON {
        log::warn!("Audio is silent or extremely quiet, cannot normalize");
        return Ok(GainMetadata {
            peak_db: f32::NEG_INFINITY,
            rms_db: f32::NEG_INFINITY,
            gain_db: 0.0,
        });
    }

    let peak_db = 20.0 * peak.log10();

    // Scale so the largest magnitude lands at full scale
    let gain_linear = 1.0 / peak;
    let gain_db = 20.0 * gain_linear.log10();

    for sample in samples.iter_mut() {
        *sample *= gain_linear;
    }

    // Calculate RMS for metadata
    let rms = (samples.iter().map(|&x| x * x).sum::<f32>() / samples.len() as f32).sqrt();
    let rms_db = if rms > EPSILON {
        20.0 * rms.log10()
    } else {
        f32::NEG_INFINITY
    };

    log::debug!(
        "Peak normalization: peak={:.2} dB, gain={:.2} dB",
        peak_db,
        gain_db
    );

    Ok(GainMetadata {
        peak_db,
        rms_db,
        gain_db,
    })
}

/// Normalize audio samples using RMS normalization
fn normalize_rms(samples: &mut [f32], target_rms_db: f32) -> Result<GainMetadata, PipelineError> {
    if samples.is_empty() {
        return Err(PipelineError::InvalidInput(
            "Empty audio samples".to_string(),
        ));
    }

    // Calculate current RMS
    let rms_sq = samples.iter().map(|&x| x * x).sum::<f32>() / samples.len() as f32;
    let rms = rms_sq.sqrt();

    if rms <= EPSILON {
        log::warn!("Audio is silent or extremely quiet, cannot normalize");
        return Ok(GainMetadata {
            peak_db: f32::NEG_INFINITY,
            rms_db: f32::NEG_INFINITY,
            gain_db: 0.0,
        });
    }

    let rms_db = 20.0 * rms.log10();

    // Find peak to check headroom
    let peak = samples.iter().map(|&x| x.abs()).fold(0.0f32, f32::max);
    let peak_db = 20.0 * peak.log10();

    let target_rms_linear = 10.0_f32.powf(target_rms_db / 20.0);
    let gain_linear = target_rms_linear / rms;
    let gain_db = 20.0 * gain_linear.log10();

    // Check if gain would cause clipping
    let new_peak = peak * gain_linear;
    if new_peak > 1.0 {
        log::warn!("RMS normalization would cause clipping, limiting gain");
        let max_gain_linear = 1.0 / peak;
        let max_gain_db = 20.0 * max_gain_linear.log10();

        for sample in samples.iter_mut() {
            *sample *= max_gain_linear;
        }

        return Ok(GainMetadata {
            peak_db,
            rms_db,
            gain_db: max_gain_db,
        });
    }

    for sample in samples.iter_mut() {
        *sample *= gain_linear;
    }

    log::debug!(
        "RMS normalization: rms={:.2} dB, gain={:.2} dB",
        rms_db,
        gain_db
    );

    Ok(GainMetadata {
        peak_db,
        rms_db,
        gain_db,
    })
}

/// Normalize audio samples in-place
///
/// # Arguments
///
/// * `samples` - Audio samples to normalize (modified in-place)
/// * `method` - Normalization method
/// * `target_rms_db` - Target RMS level in dBFS (RMS method only)
///
/// # Returns
///
/// `GainMetadata` with the pre-normalization levels and the applied gain.
/// A silent buffer is not an error: it comes back untouched with
/// `peak_db == -inf` and zero gain, so callers can detect it through
/// [`GainMetadata::is_silent`].
///
/// # Errors
///
/// Returns `PipelineError::InvalidInput` for an empty buffer.
pub fn normalize(
    samples: &mut [f32],
    method: NormalizationMethod,
    target_rms_db: f32,
) -> Result<GainMetadata, PipelineError> {
    log::debug!("Normalizing {} samples using {:?}", samples.len(), method);

    match method {
        NormalizationMethod::Peak => normalize_peak(samples),
        NormalizationMethod::RMS => normalize_rms(samples, target_rms_db),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Generate a test signal: sine wave at 220 Hz
    fn generate_test_signal(length: usize, amplitude: f32, sample_rate: f32) -> Vec<f32> {
        let freq = 220.0;
        (0..length)
            .map(|i| {
                let t = i as f32 / sample_rate;
                amplitude * (2.0 * std::f32::consts::PI * freq * t).sin()
            })
            .collect()
    }

    #[test]
    fn test_peak_normalization_reaches_full_scale() {
        let mut samples = generate_test_signal(44100, 0.5, 44100.0);

        let metadata = normalize(&mut samples, NormalizationMethod::Peak, -20.0).unwrap();

        let new_peak = samples.iter().map(|&x| x.abs()).fold(0.0f32, f32::max);
        assert!(
            (new_peak - 1.0).abs() < 1e-4,
            "Peak normalization failed: expected ~1.0, got {:.4}",
            new_peak
        );
        assert!(
            (metadata.gain_db - 6.02).abs() < 0.1,
            "Doubling a 0.5 peak should apply ~6 dB: got {:.2} dB",
            metadata.gain_db
        );
    }

    #[test]
    fn test_rms_normalization_hits_target() {
        let mut samples = generate_test_signal(44100, 0.3, 44100.0);

        normalize(&mut samples, NormalizationMethod::RMS, -20.0).unwrap();

        let rms = (samples.iter().map(|&x| x * x).sum::<f32>() / samples.len() as f32).sqrt();
        let target_rms = 10.0_f32.powf(-20.0 / 20.0);
        assert!(
            (rms - target_rms).abs() < 0.01,
            "RMS normalization failed: expected ~{:.3}, got {:.3}",
            target_rms,
            rms
        );

        let peak = samples.iter().map(|&x| x.abs()).fold(0.0f32, f32::max);
        assert!(peak <= 1.0, "RMS normalization caused clipping");
    }

    #[test]
    fn test_rms_normalization_limits_gain_at_clipping() {
        // A -3 dB RMS target on a sine needs a peak above full scale
        let mut samples = generate_test_signal(44100, 0.5, 44100.0);

        normalize(&mut samples, NormalizationMethod::RMS, -3.0).unwrap();

        let peak = samples.iter().map(|&x| x.abs()).fold(0.0f32, f32::max);
        assert!(
            peak <= 1.0 + 1e-6,
            "Clip guard failed: peak = {:.4}",
            peak
        );
        assert!(
            (peak - 1.0).abs() < 1e-4,
            "Limited gain should land the peak at full scale, got {:.4}",
            peak
        );
    }

    #[test]
    fn test_silent_audio() {
        let mut samples = vec![0.0f32; 44100];

        let metadata = normalize(&mut samples, NormalizationMethod::Peak, -20.0).unwrap();
        assert_eq!(metadata.gain_db, 0.0, "Silent audio should not apply gain");
        assert_eq!(metadata.peak_db, f32::NEG_INFINITY);
        assert!(metadata.is_silent(), "Silent buffer should report as silent");
    }

    #[test]
    fn test_normalized_audio_is_not_silent() {
        let mut samples = generate_test_signal(4410, 0.2, 44100.0);
        let metadata = normalize(&mut samples, NormalizationMethod::Peak, -20.0).unwrap();
        assert!(!metadata.is_silent());
    }

    #[test]
    fn test_ultra_quiet_audio() {
        // Very quiet but above epsilon: should still normalize
        let mut samples = generate_test_signal(44100, 1e-6, 44100.0);

        let metadata = normalize(&mut samples, NormalizationMethod::Peak, -20.0).unwrap();
        assert!(!metadata.is_silent());
        let peak = samples.iter().map(|&x| x.abs()).fold(0.0f32, f32::max);
        assert!((peak - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_empty_samples() {
        let mut samples = vec![];

        let result = normalize(&mut samples, NormalizationMethod::Peak, -20.0);
        assert!(result.is_err(), "Empty samples should return error");
    }
}
