//! Signal conditioning for raw capture buffers
//!
//! Turns whatever the capture collaborator hands over (any rate, any level,
//! padded with room silence) into the canonical analysis buffer: target
//! sample rate, normalized amplitude, edges trimmed. Buffers without usable
//! voiced content are reported as insufficient rather than failed, so the
//! caller can short-circuit with the no-speech sentinel.

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::preprocessing::normalization::normalize;
use crate::preprocessing::resampler::resample;
use crate::preprocessing::silence::{trim_bounds, SilenceTrimmer};

/// A conditioned, analysis-ready audio buffer
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    /// Mono samples at `sample_rate`
    pub samples: Vec<f32>,
    /// Sample rate in Hz, constant for the rest of the pipeline
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Buffer duration in seconds
    pub fn duration_seconds(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when the buffer holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Outcome of signal conditioning
#[derive(Debug, Clone)]
pub enum Conditioned {
    /// The buffer is ready for acoustic analysis
    Usable(AudioBuffer),
    /// The buffer holds no analyzable speech; the pipeline should answer
    /// with the no-speech sentinel instead of analyzing
    Insufficient {
        /// Human-readable explanation for logs and metadata
        reason: String,
    },
}

/// Condition a raw capture buffer for analysis.
///
/// Steps: resample to the target rate, normalize amplitude, trim edge
/// silence, then judge viability. Trimming is discarded when it would keep
/// less than half the nominal capture duration; marginal recordings must
/// survive conditioning.
///
/// # Errors
///
/// `InvalidInput` for a zero sample rate; `ProcessingError` if resampling
/// fails. An unusable-but-well-formed buffer is not an error: it comes back
/// as [`Conditioned::Insufficient`].
pub fn condition(
    samples: &[f32],
    current_rate: u32,
    config: &PipelineConfig,
) -> Result<Conditioned, PipelineError> {
    if current_rate == 0 || config.target_sample_rate == 0 {
        return Err(PipelineError::InvalidInput(
            "Sample rate must be non-zero".to_string(),
        ));
    }

    log::debug!(
        "Conditioning {} samples at {} Hz (target {} Hz)",
        samples.len(),
        current_rate,
        config.target_sample_rate
    );

    if samples.is_empty() {
        return Ok(Conditioned::Insufficient {
            reason: "Recording is empty".to_string(),
        });
    }

    // 1. Resample to the canonical rate
    let mut conditioned = resample(samples, current_rate, config.target_sample_rate)?;

    // 2. Normalize amplitude
    let gain = normalize(&mut conditioned, config.normalization, config.target_rms_db)?;
    if gain.is_silent() {
        return Ok(Conditioned::Insufficient {
            reason: "Recording contains no measurable signal".to_string(),
        });
    }

    // 3. Trim edge silence, unless trimming would keep less than half the
    //    nominal duration
    let trimmer = SilenceTrimmer {
        threshold_db: config.trim_threshold_db,
        frame_size: config.trim_frame_size,
        hop_size: config.trim_hop_size,
    };
    let (start, end) = trim_bounds(&conditioned, &trimmer);
    let half_nominal =
        (0.5 * config.nominal_duration_secs * config.target_sample_rate as f32) as usize;

    let kept = if end - start >= half_nominal {
        conditioned[start..end].to_vec()
    } else {
        log::debug!(
            "Trim would keep {} of {} samples (below half the nominal duration), keeping untrimmed",
            end - start,
            conditioned.len()
        );
        conditioned
    };

    // 4. Viability
    let duration = kept.len() as f32 / config.target_sample_rate as f32;
    if kept.is_empty() || duration < config.min_viable_secs {
        return Ok(Conditioned::Insufficient {
            reason: format!("Conditioned signal too short to analyze: {:.2} s", duration),
        });
    }

    Ok(Conditioned::Usable(AudioBuffer {
        samples: kept,
        sample_rate: config.target_sample_rate,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vowel_like(duration_secs: f32, sample_rate: u32) -> Vec<f32> {
        let length = (duration_secs * sample_rate as f32) as usize;
        (0..length)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                let mut x = 0.0;
                for (h, a) in [(1.0, 1.0), (2.0, 0.5), (3.0, 0.25)] {
                    x += a * (2.0 * std::f32::consts::PI * 160.0 * h * t).sin();
                }
                0.4 * x
            })
            .collect()
    }

    fn pad(signal: Vec<f32>, pad_secs: f32, sample_rate: u32) -> Vec<f32> {
        let pad_len = (pad_secs * sample_rate as f32) as usize;
        let mut out = vec![0.0f32; pad_len];
        out.extend(signal);
        out.extend(vec![0.0f32; pad_len]);
        out
    }

    #[test]
    fn test_padded_vowel_is_trimmed() {
        let samples = pad(vowel_like(3.0, 44100), 1.0, 44100);
        let config = PipelineConfig::default();

        match condition(&samples, 44100, &config).unwrap() {
            Conditioned::Usable(buffer) => {
                assert_eq!(buffer.sample_rate, 44100);
                assert!(
                    buffer.len() < samples.len(),
                    "padding should have been cut"
                );
                let dur = buffer.duration_seconds();
                assert!(
                    (2.9..=3.2).contains(&dur),
                    "kept duration should be near the vowel: {:.2} s",
                    dur
                );
                let peak = buffer.samples.iter().map(|x| x.abs()).fold(0.0f32, f32::max);
                assert!((peak - 1.0).abs() < 1e-3, "peak should be normalized: {}", peak);
            }
            other => panic!("expected usable buffer, got {:?}", other),
        }
    }

    #[test]
    fn test_short_burst_keeps_untrimmed_buffer() {
        // 1 s of tone inside 5 s of silence: trimming would keep less than
        // half the nominal duration, so the whole buffer survives
        let samples = pad(vowel_like(1.0, 44100), 2.0, 44100);
        let config = PipelineConfig::default();

        match condition(&samples, 44100, &config).unwrap() {
            Conditioned::Usable(buffer) => {
                assert_eq!(
                    buffer.len(),
                    samples.len(),
                    "trim should have been discarded"
                );
            }
            other => panic!("expected usable buffer, got {:?}", other),
        }
    }

    #[test]
    fn test_silent_buffer_is_insufficient() {
        let samples = vec![0.0f32; 44100 * 5];
        let config = PipelineConfig::default();

        match condition(&samples, 44100, &config).unwrap() {
            Conditioned::Insufficient { reason } => {
                assert!(
                    reason.contains("no measurable signal"),
                    "unexpected reason: {}",
                    reason
                );
            }
            other => panic!("expected insufficient, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_buffer_is_insufficient() {
        let config = PipelineConfig::default();
        assert!(matches!(
            condition(&[], 44100, &config).unwrap(),
            Conditioned::Insufficient { .. }
        ));
    }

    #[test]
    fn test_zero_rate_is_invalid() {
        let config = PipelineConfig::default();
        assert!(condition(&[0.1; 1000], 0, &config).is_err());
    }

    #[test]
    fn test_too_short_recording_is_insufficient() {
        let samples = vowel_like(0.1, 44100);
        let config = PipelineConfig::default();

        assert!(matches!(
            condition(&samples, 44100, &config).unwrap(),
            Conditioned::Insufficient { .. }
        ));
    }

    #[test]
    fn test_resamples_to_target_rate() {
        let samples = vowel_like(3.0, 22050);
        let config = PipelineConfig::default();

        match condition(&samples, 22050, &config).unwrap() {
            Conditioned::Usable(buffer) => {
                assert_eq!(buffer.sample_rate, 44100);
                let dur = buffer.duration_seconds();
                assert!(
                    (2.8..=3.2).contains(&dur),
                    "duration should survive resampling: {:.2} s",
                    dur
                );
            }
            other => panic!("expected usable buffer, got {:?}", other),
        }
    }

    #[test]
    fn test_conditioning_is_idempotent() {
        let samples = pad(vowel_like(3.0, 44100), 1.0, 44100);
        let config = PipelineConfig::default();

        let first = match condition(&samples, 44100, &config).unwrap() {
            Conditioned::Usable(buffer) => buffer,
            other => panic!("expected usable buffer, got {:?}", other),
        };
        let second = match condition(&first.samples, first.sample_rate, &config).unwrap() {
            Conditioned::Usable(buffer) => buffer,
            other => panic!("expected usable buffer, got {:?}", other),
        };

        assert_eq!(second.len(), first.len(), "length should be stable");
        let max_diff = first
            .samples
            .iter()
            .zip(second.samples.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0f32, f32::max);
        assert!(
            max_diff < 1e-4,
            "amplitude profile should be stable, max diff = {}",
            max_diff
        );
    }
}
