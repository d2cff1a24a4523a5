//! Edge-silence trimming utilities
//!
//! Scans frame RMS from both ends of a buffer and reports the sample range
//! that carries signal. The threshold is relative to the buffer peak, so the
//! scan behaves the same before and after amplitude normalization.

use crate::preprocessing::normalization::EPSILON;

/// Edge-trim configuration
#[derive(Debug, Clone)]
pub struct SilenceTrimmer {
    /// Threshold in dB relative to peak (default: -20.0)
    pub threshold_db: f32,

    /// Frame size for analysis (default: 2048)
    pub frame_size: usize,

    /// Hop size between frames (default: 512)
    pub hop_size: usize,
}

impl Default for SilenceTrimmer {
    fn default() -> Self {
        Self {
            threshold_db: -20.0,
            frame_size: 2048,
            hop_size: 512,
        }
    }
}

/// Find the sample range `[start, end)` that remains after trimming
/// leading and trailing near-silence.
///
/// A frame counts as signal when its RMS exceeds `peak_db + threshold_db`.
/// The range always falls on the frame grid; an entirely silent buffer
/// (or an empty one) yields `(0, 0)`.
pub fn trim_bounds(samples: &[f32], trimmer: &SilenceTrimmer) -> (usize, usize) {
    if samples.is_empty() || trimmer.frame_size == 0 || trimmer.hop_size == 0 {
        return (0, 0);
    }

    let peak = samples.iter().map(|&x| x.abs()).fold(0.0f32, f32::max);
    if peak <= EPSILON {
        return (0, 0);
    }

    // Threshold relative to the buffer peak
    let threshold_linear = peak * 10.0_f32.powf(trimmer.threshold_db / 20.0);

    let frame_size = trimmer.frame_size.min(samples.len());
    let num_frames = (samples.len() - frame_size) / trimmer.hop_size + 1;

    let mut first_active: Option<usize> = None;
    let mut last_active: Option<usize> = None;

    for i in 0..num_frames {
        let start = i * trimmer.hop_size;
        let frame = &samples[start..start + frame_size];
        let rms = (frame.iter().map(|&x| x * x).sum::<f32>() / frame_size as f32).sqrt();

        if rms > threshold_linear {
            if first_active.is_none() {
                first_active = Some(i);
            }
            last_active = Some(i);
        }
    }

    match (first_active, last_active) {
        (Some(first), Some(last)) => {
            let start = first * trimmer.hop_size;
            let end = (last * trimmer.hop_size + frame_size).min(samples.len());
            log::debug!(
                "Trim scan: {} frames, kept samples {}..{} of {}",
                num_frames,
                start,
                end,
                samples.len()
            );
            (start, end)
        }
        _ => (0, 0),
    }
}
