//! Fundamental-frequency contour estimation
//!
//! Estimates an F0 contour from a conditioned voice buffer using frame-wise
//! normalized autocorrelation.
//!
//! # Algorithm
//!
//! 1. Slice the buffer into analysis windows of three periods of the pitch
//!    floor, hopped by 0.75 periods
//! 2. Skip frames whose peak falls below a fraction of the global peak
//! 3. Compute each frame's autocorrelation with FFT acceleration:
//!    `ACF = IFFT(|FFT(frame)|²)`, then normalize by the zero-lag energy with
//!    a small-lag bias correction
//! 4. Scan the candidate lag range for local maxima above the voicing
//!    threshold, scored with a per-octave penalty so subharmonic peaks do
//!    not beat the fundamental
//! 5. Refine the winning lag with parabolic interpolation and convert to Hz
//!
//! Voiced frames keep their normalized autocorrelation peak; the
//! perturbation stage reuses it as a per-frame harmonicity value.
//!
//! # Reference
//!
//! Boersma, P. (1993). Accurate short-term analysis of the fundamental
//! frequency and the harmonics-to-noise ratio of a sampled sound.
//! *Proceedings of the Institute of Phonetic Sciences*, 17, 97-110.
//!
//! # Example
//!
//! ```no_run
//! use voxscreen_dsp::features::pitch::estimate_pitch_contour;
//!
//! let samples: Vec<f32> = vec![]; // Conditioned voice samples
//! let contour = estimate_pitch_contour(&samples, 44100, 75.0, 600.0, 0.45, 0.03, 0.01)?;
//! println!("Mean F0: {:.1} Hz over {} voiced frames", contour.mean_f0(), contour.len());
//! # Ok::<(), voxscreen_dsp::PipelineError>(())
//! ```

use crate::error::PipelineError;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

const EPSILON: f32 = 1e-10;

/// Analysis window length in periods of the pitch floor
const WINDOW_PERIODS: f32 = 3.0;

/// Hop length in periods of the pitch floor
const HOP_PERIODS: f32 = 0.75;

/// Upper clamp for the stored harmonicity value; keeps the downstream
/// r/(1-r) mapping finite
const MAX_HARMONICITY: f32 = 0.999_999;

/// One voiced analysis frame
#[derive(Debug, Clone)]
pub struct PitchFrame {
    /// Sample index of the frame center
    pub center: usize,
    /// Estimated fundamental frequency in Hz
    pub f0_hz: f32,
    /// Normalized autocorrelation peak in (0, 1)
    pub harmonicity: f32,
}

/// Fundamental-frequency contour over the voiced frames of a buffer
#[derive(Debug, Clone)]
pub struct PitchContour {
    /// Voiced frames in time order
    pub frames: Vec<PitchFrame>,
    /// Sample rate the frame centers refer to
    pub sample_rate: u32,
}

impl PitchContour {
    /// Number of voiced frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True when no frame was voiced
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// F0 values in frame order, in Hz
    pub fn f0_values(&self) -> Vec<f32> {
        self.frames.iter().map(|f| f.f0_hz).collect()
    }

    /// Mean F0 in Hz (0.0 for an empty contour)
    pub fn mean_f0(&self) -> f32 {
        if self.frames.is_empty() {
            return 0.0;
        }
        self.frames.iter().map(|f| f.f0_hz).sum::<f32>() / self.frames.len() as f32
    }

    /// Highest frame F0 in Hz (0.0 for an empty contour)
    pub fn max_f0(&self) -> f32 {
        self.frames.iter().map(|f| f.f0_hz).fold(0.0f32, f32::max)
    }

    /// Lowest frame F0 in Hz (0.0 for an empty contour)
    pub fn min_f0(&self) -> f32 {
        if self.frames.is_empty() {
            return 0.0;
        }
        self.frames
            .iter()
            .map(|f| f.f0_hz)
            .fold(f32::INFINITY, f32::min)
    }
}

/// Estimate the fundamental-frequency contour of a conditioned buffer.
///
/// # Arguments
///
/// * `samples` - Conditioned mono samples
/// * `sample_rate` - Sample rate in Hz
/// * `f0_min_hz` - Pitch floor; also sets the window and hop lengths
/// * `f0_max_hz` - Pitch ceiling
/// * `voicing_threshold` - Normalized autocorrelation peak required to call
///   a frame voiced
/// * `silence_fraction` - Frames peaking below this fraction of the global
///   peak are skipped
/// * `octave_cost` - Per-octave penalty on longer-lag candidates
///
/// # Returns
///
/// The contour of voiced frames. At least two voiced frames are required;
/// sparser outcomes are reported as errors so the analyzer can fall back.
///
/// # Errors
///
/// `InvalidInput` for an empty buffer, zero rate, or a malformed pitch band;
/// `ProcessingError` when the buffer is too short, silent, or yields fewer
/// than two voiced frames.
pub fn estimate_pitch_contour(
    samples: &[f32],
    sample_rate: u32,
    f0_min_hz: f32,
    f0_max_hz: f32,
    voicing_threshold: f32,
    silence_fraction: f32,
    octave_cost: f32,
) -> Result<PitchContour, PipelineError> {
    log::debug!(
        "Estimating pitch contour: {} samples at {} Hz, band [{:.0}, {:.0}] Hz",
        samples.len(),
        sample_rate,
        f0_min_hz,
        f0_max_hz
    );

    // Validate inputs
    if samples.is_empty() {
        return Err(PipelineError::InvalidInput(
            "Empty audio samples".to_string(),
        ));
    }

    if sample_rate == 0 {
        return Err(PipelineError::InvalidInput("Invalid sample rate: 0".to_string()));
    }

    if f0_min_hz <= 0.0 || f0_max_hz <= f0_min_hz {
        return Err(PipelineError::InvalidInput(format!(
            "Invalid pitch band: [{:.1}, {:.1}] Hz",
            f0_min_hz, f0_max_hz
        )));
    }

    if f0_max_hz >= sample_rate as f32 / 2.0 {
        return Err(PipelineError::InvalidInput(format!(
            "Pitch ceiling {:.1} Hz at or above Nyquist for {} Hz",
            f0_max_hz, sample_rate
        )));
    }

    let window = (WINDOW_PERIODS * sample_rate as f32 / f0_min_hz).ceil() as usize;
    let hop = ((HOP_PERIODS * sample_rate as f32 / f0_min_hz).round() as usize).max(1);

    if samples.len() < window {
        return Err(PipelineError::ProcessingError(format!(
            "Buffer too short for pitch analysis: {} samples, window {}",
            samples.len(),
            window
        )));
    }

    let global_peak = samples.iter().map(|&x| x.abs()).fold(0.0f32, f32::max);
    if global_peak <= EPSILON {
        return Err(PipelineError::ProcessingError(
            "Buffer is silent".to_string(),
        ));
    }

    // Candidate lag range; lag_min >= 2 and lag_max <= window - 2 keep the
    // parabolic neighbors in bounds
    let lag_min = ((sample_rate as f32 / f0_max_hz).floor() as usize).max(2);
    let lag_max = ((sample_rate as f32 / f0_min_hz).ceil() as usize).min(window - 2);
    if lag_min >= lag_max {
        return Err(PipelineError::InvalidInput(format!(
            "Degenerate lag range [{}, {}] for band [{:.1}, {:.1}] Hz",
            lag_min, lag_max, f0_min_hz, f0_max_hz
        )));
    }

    // One FFT plan serves every frame
    let fft_size = (2 * window).next_power_of_two();
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(fft_size);
    let ifft = planner.plan_fft_inverse(fft_size);

    let num_frames = (samples.len() - window) / hop + 1;
    let mut frames = Vec::new();

    for i in 0..num_frames {
        let start = i * hop;
        let frame = &samples[start..start + window];

        let frame_peak = frame.iter().map(|&x| x.abs()).fold(0.0f32, f32::max);
        if frame_peak < silence_fraction * global_peak {
            continue;
        }

        let acf = frame_autocorrelation(frame, &fft, &ifft);
        if acf[0] <= EPSILON {
            continue;
        }

        // Normalized autocorrelation with small-lag bias correction: the
        // raw ACF of an unpadded window tapers by (window - lag) / window
        let r = |lag: usize| -> f32 {
            (acf[lag] / acf[0]) * (window as f32 / (window - lag) as f32)
        };

        // Best candidate among local maxima, penalized per octave of lag
        let mut best: Option<(f32, usize)> = None;
        for lag in lag_min..=lag_max {
            let mid = r(lag);
            if mid < voicing_threshold {
                continue;
            }
            if mid <= r(lag - 1) || mid <= r(lag + 1) {
                continue;
            }
            let score = mid - octave_cost * (lag as f32 / lag_min as f32).log2();
            if best.map_or(true, |(s, _)| score > s) {
                best = Some((score, lag));
            }
        }

        let lag = match best {
            Some((_, lag)) => lag,
            None => continue,
        };

        // Parabolic refinement around the winning lag
        let (prev, mid, next) = (r(lag - 1), r(lag), r(lag + 1));
        let denom = prev - 2.0 * mid + next;
        let delta = if denom.abs() > EPSILON {
            (0.5 * (prev - next) / denom).clamp(-1.0, 1.0)
        } else {
            0.0
        };
        let refined_lag = lag as f32 + delta;
        let f0 = sample_rate as f32 / refined_lag;

        if f0 < f0_min_hz || f0 > f0_max_hz {
            continue;
        }

        frames.push(PitchFrame {
            center: start + window / 2,
            f0_hz: f0,
            harmonicity: mid.min(MAX_HARMONICITY),
        });
    }

    log::debug!(
        "Pitch contour: {} voiced of {} frames",
        frames.len(),
        num_frames
    );

    if frames.len() < 2 {
        return Err(PipelineError::ProcessingError(format!(
            "Too few voiced frames for a contour: {}",
            frames.len()
        )));
    }

    Ok(PitchContour {
        frames,
        sample_rate,
    })
}

/// Compute one frame's autocorrelation using FFT acceleration
///
/// Uses the identity: `ACF = IFFT(|FFT(frame)|²)` on the mean-removed,
/// zero-padded frame. Negative values are clamped; only non-negative
/// correlation is meaningful to the voicing decision.
fn frame_autocorrelation(
    frame: &[f32],
    fft: &Arc<dyn Fft<f32>>,
    ifft: &Arc<dyn Fft<f32>>,
) -> Vec<f32> {
    let n = frame.len();
    let fft_size = fft.len();

    let mean = frame.iter().sum::<f32>() / n as f32;

    // Convert to complex, remove DC, zero-pad
    let mut buf: Vec<Complex<f32>> = Vec::with_capacity(fft_size);
    buf.extend(frame.iter().map(|&x| Complex::new(x - mean, 0.0)));
    buf.resize(fft_size, Complex::new(0.0, 0.0));

    fft.process(&mut buf);

    // Compute |FFT|²
    for x in &mut buf {
        *x = *x * x.conj();
    }

    ifft.process(&mut buf);

    // Extract real part and normalize by FFT size
    let scale = 1.0 / (fft_size as f32);
    buf[..n].iter().map(|x| (x.re * scale).max(0.0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, duration_secs: f32, sample_rate: u32) -> Vec<f32> {
        let length = (duration_secs * sample_rate as f32) as usize;
        (0..length)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                0.8 * (2.0 * std::f32::consts::PI * freq * t).sin()
            })
            .collect()
    }

    fn estimate(samples: &[f32], sample_rate: u32) -> Result<PitchContour, PipelineError> {
        estimate_pitch_contour(samples, sample_rate, 75.0, 600.0, 0.45, 0.03, 0.01)
    }

    #[test]
    fn test_detects_220hz_sine() {
        let samples = sine(220.0, 1.0, 44100);
        let contour = estimate(&samples, 44100).unwrap();

        assert!(contour.len() > 50, "1 s should yield many voiced frames");
        assert!(
            (contour.mean_f0() - 220.0).abs() < 2.0,
            "Mean F0 should be ~220 Hz, got {:.2}",
            contour.mean_f0()
        );
        assert!(
            contour.frames.iter().all(|f| f.harmonicity > 0.9),
            "A pure tone should be strongly harmonic"
        );
    }

    #[test]
    fn test_detects_band_edges() {
        for freq in [100.0f32, 400.0] {
            let samples = sine(freq, 1.0, 44100);
            let contour = estimate(&samples, 44100).unwrap();
            assert!(
                (contour.mean_f0() - freq).abs() < freq * 0.02,
                "Mean F0 should be ~{} Hz, got {:.2}",
                freq,
                contour.mean_f0()
            );
        }
    }

    #[test]
    fn test_strong_second_harmonic_keeps_fundamental() {
        let sample_rate = 44100u32;
        let samples: Vec<f32> = (0..44100)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                0.3 * (2.0 * std::f32::consts::PI * 150.0 * t).sin()
                    + 0.6 * (2.0 * std::f32::consts::PI * 300.0 * t).sin()
            })
            .collect();

        let contour = estimate(&samples, sample_rate).unwrap();
        assert!(
            (contour.mean_f0() - 150.0).abs() < 3.0,
            "Fundamental should win over its strong second harmonic, got {:.2}",
            contour.mean_f0()
        );
    }

    #[test]
    fn test_noise_has_no_contour() {
        // Deterministic pseudo-noise via xorshift
        let mut state = 0x2545_f491u32;
        let samples: Vec<f32> = (0..44100)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state as f32 / u32::MAX as f32) - 0.5
            })
            .collect();

        let result = estimate(&samples, 44100);
        assert!(result.is_err(), "Broadband noise should not yield a contour");
    }

    #[test]
    fn test_silent_buffer_fails() {
        let samples = vec![0.0f32; 44100];
        assert!(estimate(&samples, 44100).is_err());
    }

    #[test]
    fn test_too_short_buffer_fails() {
        let samples = sine(220.0, 0.02, 44100);
        assert!(estimate(&samples, 44100).is_err());
    }

    #[test]
    fn test_rejects_bad_band() {
        let samples = sine(220.0, 0.5, 44100);
        assert!(estimate_pitch_contour(&samples, 44100, 600.0, 75.0, 0.45, 0.03, 0.01).is_err());
        assert!(estimate_pitch_contour(&samples, 8000, 75.0, 4000.0, 0.45, 0.03, 0.01).is_err());
    }

    #[test]
    fn test_contour_statistics() {
        let contour = PitchContour {
            frames: vec![
                PitchFrame { center: 0, f0_hz: 100.0, harmonicity: 0.9 },
                PitchFrame { center: 441, f0_hz: 110.0, harmonicity: 0.9 },
                PitchFrame { center: 882, f0_hz: 120.0, harmonicity: 0.9 },
            ],
            sample_rate: 44100,
        };

        assert!((contour.mean_f0() - 110.0).abs() < 1e-4);
        assert_eq!(contour.max_f0(), 120.0);
        assert_eq!(contour.min_f0(), 100.0);
        assert_eq!(contour.f0_values(), vec![100.0, 110.0, 120.0]);
    }
}
