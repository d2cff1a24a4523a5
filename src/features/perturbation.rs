//! Cycle-to-cycle perturbation measures
//!
//! Jitter quantifies period instability and shimmer quantifies amplitude
//! instability across consecutive glottal cycles. Both families average
//! absolute deviations from short moving windows over the cycle series,
//! normalized by the series mean.
//!
//! # Reference
//!
//! Praat voice report definitions (Boersma & Weenink), matching the
//! conventions of the UCI Parkinson's telemonitoring feature set.

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

const EPSILON: f32 = 1e-10;

/// Jitter family computed from cycle periods
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JitterMeasures {
    /// Mean absolute period difference over the mean period
    pub local: f32,
    /// Mean absolute period difference in seconds
    pub local_absolute: f32,
    /// Relative average perturbation (3-period window)
    pub rap: f32,
    /// Five-point period perturbation quotient
    pub ppq5: f32,
    /// Difference of differences of periods, 3 x RAP
    pub ddp: f32,
}

/// Shimmer family computed from cycle peak amplitudes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShimmerMeasures {
    /// Mean absolute amplitude difference over the mean amplitude
    pub local: f32,
    /// Mean absolute base-20 log amplitude ratio in dB
    pub local_db: f32,
    /// Three-point amplitude perturbation quotient
    pub apq3: f32,
    /// Five-point amplitude perturbation quotient
    pub apq5: f32,
    /// Eleven-point amplitude perturbation quotient
    pub apq11: f32,
    /// Difference of differences of amplitudes, 3 x APQ3
    pub dda: f32,
}

/// Compute the jitter family over a cycle period series.
///
/// # Errors
///
/// `InvalidInput` when fewer than 5 periods are supplied (PPQ5 needs a
/// five-cycle window) or when any period is non-positive.
pub fn compute_jitter(periods: &[f32]) -> Result<JitterMeasures, PipelineError> {
    let n = periods.len();
    if n < 5 {
        return Err(PipelineError::InvalidInput(format!(
            "Jitter needs at least 5 cycle periods, got {}",
            n
        )));
    }

    if periods.iter().any(|&p| p <= 0.0) {
        return Err(PipelineError::InvalidInput(
            "Cycle periods must be positive".to_string(),
        ));
    }

    let mean_period = mean(periods);
    if mean_period < EPSILON {
        return Err(PipelineError::ProcessingError(
            "Degenerate mean cycle period".to_string(),
        ));
    }

    let local_absolute = mean_abs_neighbor_diff(periods);
    let local = local_absolute / mean_period;
    let rap = mean_window_deviation(periods, 1) / mean_period;
    let ppq5 = mean_window_deviation(periods, 2) / mean_period;
    let ddp = 3.0 * rap;

    Ok(JitterMeasures {
        local,
        local_absolute,
        rap,
        ppq5,
        ddp,
    })
}

/// Compute the shimmer family over a cycle amplitude series.
///
/// # Errors
///
/// `InvalidInput` when fewer than 11 amplitudes are supplied (APQ11 needs
/// an eleven-cycle window) or when any amplitude is not positive.
pub fn compute_shimmer(amplitudes: &[f32]) -> Result<ShimmerMeasures, PipelineError> {
    let n = amplitudes.len();
    if n < 11 {
        return Err(PipelineError::InvalidInput(format!(
            "Shimmer needs at least 11 cycle amplitudes, got {}",
            n
        )));
    }

    if amplitudes.iter().any(|&a| a <= EPSILON) {
        return Err(PipelineError::InvalidInput(
            "Cycle amplitudes must be positive".to_string(),
        ));
    }

    let mean_amplitude = mean(amplitudes);

    let local = mean_abs_neighbor_diff(amplitudes) / mean_amplitude;
    let local_db = amplitudes
        .windows(2)
        .map(|w| (20.0 * (w[1] / w[0]).log10()).abs())
        .sum::<f32>()
        / (n - 1) as f32;
    let apq3 = mean_window_deviation(amplitudes, 1) / mean_amplitude;
    let apq5 = mean_window_deviation(amplitudes, 2) / mean_amplitude;
    let apq11 = mean_window_deviation(amplitudes, 5) / mean_amplitude;
    let dda = 3.0 * apq3;

    Ok(ShimmerMeasures {
        local,
        local_db,
        apq3,
        apq5,
        apq11,
        dda,
    })
}

fn mean(values: &[f32]) -> f32 {
    values.iter().sum::<f32>() / values.len() as f32
}

/// Mean of `|x[i] - x[i-1]|` over consecutive pairs
fn mean_abs_neighbor_diff(values: &[f32]) -> f32 {
    values
        .windows(2)
        .map(|w| (w[1] - w[0]).abs())
        .sum::<f32>()
        / (values.len() - 1) as f32
}

/// Mean of `|x[i] - mean(x[i-half..=i+half])|` over interior points.
///
/// Callers guarantee `values.len() > 2 * half` via their minimum-length
/// checks.
fn mean_window_deviation(values: &[f32], half: usize) -> f32 {
    let n = values.len();
    let window = 2 * half + 1;

    let sum: f32 = (half..n - half)
        .map(|i| {
            let window_mean = values[i - half..=i + half].iter().sum::<f32>() / window as f32;
            (values[i] - window_mean).abs()
        })
        .sum();

    sum / (n - window + 1) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steady_periods_have_zero_jitter() {
        let periods = vec![0.005f32; 20];
        let jitter = compute_jitter(&periods).unwrap();

        assert!(jitter.local.abs() < 1e-7);
        assert!(jitter.local_absolute.abs() < 1e-9);
        assert!(jitter.rap.abs() < 1e-7);
        assert!(jitter.ppq5.abs() < 1e-7);
        assert!(jitter.ddp.abs() < 1e-7);
    }

    #[test]
    fn test_alternating_periods_match_hand_computation() {
        // Alternate 5.00 ms and 5.05 ms: every neighbor diff is 0.05 ms
        let periods: Vec<f32> = (0..20)
            .map(|i| if i % 2 == 0 { 0.005 } else { 0.00505 })
            .collect();
        let jitter = compute_jitter(&periods).unwrap();

        let mean_period = 0.005025f32;
        assert!(
            (jitter.local_absolute - 0.00005).abs() < 1e-8,
            "local absolute jitter should be 0.05 ms, got {}",
            jitter.local_absolute
        );
        assert!(
            (jitter.local - 0.00005 / mean_period).abs() < 1e-5,
            "local jitter should be ~0.995%, got {}",
            jitter.local
        );
        // Every interior triplet deviates by 2/3 of the step
        let expected_rap = (2.0f32 / 3.0 * 0.00005) / mean_period;
        assert!(
            (jitter.rap - expected_rap).abs() < 1e-5,
            "RAP should be ~0.663%, got {}",
            jitter.rap
        );
        assert!(
            (jitter.ddp - 3.0 * jitter.rap).abs() < 1e-9,
            "DDP is defined as three times RAP"
        );
    }

    #[test]
    fn test_steady_amplitudes_have_zero_shimmer() {
        let amplitudes = vec![0.5f32; 20];
        let shimmer = compute_shimmer(&amplitudes).unwrap();

        assert!(shimmer.local.abs() < 1e-7);
        assert!(shimmer.local_db.abs() < 1e-5);
        assert!(shimmer.apq3.abs() < 1e-7);
        assert!(shimmer.apq5.abs() < 1e-7);
        assert!(shimmer.apq11.abs() < 1e-7);
        assert!(shimmer.dda.abs() < 1e-7);
    }

    #[test]
    fn test_alternating_amplitudes_match_hand_computation() {
        // Alternate 1.0 and 1.1: every neighbor diff is 0.1
        let amplitudes: Vec<f32> = (0..20)
            .map(|i| if i % 2 == 0 { 1.0 } else { 1.1 })
            .collect();
        let shimmer = compute_shimmer(&amplitudes).unwrap();

        assert!(
            (shimmer.local - 0.1 / 1.05).abs() < 1e-4,
            "local shimmer should be ~9.52%, got {}",
            shimmer.local
        );
        let expected_db = 20.0f32 * (1.1f32 / 1.0).log10();
        assert!(
            (shimmer.local_db - expected_db).abs() < 1e-4,
            "dB shimmer should be ~0.828 dB, got {}",
            shimmer.local_db
        );
        assert!(
            (shimmer.dda - 3.0 * shimmer.apq3).abs() < 1e-9,
            "DDA is defined as three times APQ3"
        );
    }

    #[test]
    fn test_jitter_requires_five_periods() {
        let result = compute_jitter(&[0.005; 4]);
        assert!(result.is_err(), "4 periods cannot support PPQ5");
    }

    #[test]
    fn test_shimmer_requires_eleven_amplitudes() {
        let result = compute_shimmer(&[0.5; 10]);
        assert!(result.is_err(), "10 amplitudes cannot support APQ11");
    }

    #[test]
    fn test_nonpositive_values_are_rejected() {
        let mut periods = vec![0.005f32; 10];
        periods[3] = 0.0;
        assert!(compute_jitter(&periods).is_err());

        let mut amplitudes = vec![0.5f32; 12];
        amplitudes[7] = -0.1;
        assert!(compute_shimmer(&amplitudes).is_err());
    }
}
