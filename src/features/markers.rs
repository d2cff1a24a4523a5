//! Periodicity marker extraction
//!
//! Derives one marker per glottal cycle from a buffer and its pitch contour.
//! The contour supplies the expected period; the waveform supplies the exact
//! cycle positions.
//!
//! # Algorithm
//!
//! 1. Group voiced frames into runs (a skipped frame ends a run)
//! 2. Pick each run's polarity from its dominant peak sign
//! 3. Seed a marker on the strongest peak near the first frame center, then
//!    walk forward one local period at a time, snapping each marker to the
//!    strongest peak inside a third-of-a-period search window
//!
//! Snapping to the waveform keeps the walk from drifting when the true
//! period differs slightly from the contour estimate. Consecutive markers
//! then yield the cycle periods and per-cycle peak amplitudes that the
//! perturbation measures summarize.

use crate::error::PipelineError;
use crate::features::pitch::PitchContour;

/// Cycle-to-cycle series derived from the marker sequence
#[derive(Debug, Clone, Default)]
pub struct CycleSeries {
    /// Accepted cycle periods in seconds
    pub periods: Vec<f32>,
    /// Peak amplitude of each accepted cycle
    pub amplitudes: Vec<f32>,
}

impl CycleSeries {
    /// Number of accepted cycles
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    /// True when no cycle survived filtering
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}

/// Extract periodicity markers for each voiced run of the contour.
///
/// # Returns
///
/// Strictly increasing sample indices, one per detected glottal cycle.
///
/// # Errors
///
/// `InvalidInput` when the contour is empty or refers past the buffer,
/// `ProcessingError` when fewer than two markers could be placed.
pub fn extract_markers(
    samples: &[f32],
    contour: &PitchContour,
) -> Result<Vec<usize>, PipelineError> {
    if samples.is_empty() {
        return Err(PipelineError::InvalidInput(
            "Empty audio samples".to_string(),
        ));
    }

    if contour.is_empty() {
        return Err(PipelineError::InvalidInput(
            "Empty pitch contour".to_string(),
        ));
    }

    if contour.frames.iter().any(|f| f.center >= samples.len()) {
        return Err(PipelineError::InvalidInput(
            "Pitch contour refers past the end of the buffer".to_string(),
        ));
    }

    let sample_rate = contour.sample_rate as f32;

    // A run breaks where the contour skipped frames; the base hop is the
    // smallest center spacing observed
    let base_gap = contour
        .frames
        .windows(2)
        .map(|w| w[1].center - w[0].center)
        .min()
        .unwrap_or(usize::MAX);

    let mut markers: Vec<usize> = Vec::new();
    let mut run_start = 0usize;

    for i in 1..=contour.frames.len() {
        let run_ends = i == contour.frames.len()
            || contour.frames[i].center - contour.frames[i - 1].center > 2 * base_gap;
        if !run_ends {
            continue;
        }

        let run = &contour.frames[run_start..i];
        run_start = i;

        walk_run(samples, run, sample_rate, &mut markers);
    }

    log::debug!(
        "Marker extraction: {} markers from {} voiced frames",
        markers.len(),
        contour.len()
    );

    if markers.len() < 2 {
        return Err(PipelineError::ProcessingError(format!(
            "Too few periodicity markers: {}",
            markers.len()
        )));
    }

    Ok(markers)
}

/// Walk one voiced run, appending a marker per cycle
fn walk_run(
    samples: &[f32],
    run: &[crate::features::pitch::PitchFrame],
    sample_rate: f32,
    markers: &mut Vec<usize>,
) {
    let first = &run[0];
    let last_center = run[run.len() - 1].center;
    let first_period = sample_rate / first.f0_hz;

    // Polarity of the run's dominant peaks
    let span_lo = first.center.saturating_sub(first_period as usize);
    let span_hi = (last_center + first_period as usize).min(samples.len());
    let span = &samples[span_lo..span_hi];
    let max = span.iter().copied().fold(f32::MIN, f32::max);
    let min = span.iter().copied().fold(f32::MAX, f32::min);
    let sign = if -min > max { -1.0 } else { 1.0 };

    // Seed on the strongest peak near the first frame center
    let half = (first_period / 2.0) as usize;
    let seed = match peak_in(
        samples,
        first.center.saturating_sub(half),
        first.center + half + 1,
        sign,
    ) {
        Some(idx) => idx,
        None => return,
    };
    markers.push(seed);

    let mut pos = seed;
    let mut frame_idx = 0usize;

    loop {
        // Local period from the latest frame at or before the walk position
        while frame_idx + 1 < run.len() && run[frame_idx + 1].center <= pos {
            frame_idx += 1;
        }
        let period = sample_rate / run[frame_idx].f0_hz;

        let expected = pos as f32 + period;
        if expected > last_center as f32 + period {
            break;
        }

        let slack = (period / 3.0) as usize;
        let expected = expected as usize;
        let next = match peak_in(
            samples,
            expected.saturating_sub(slack),
            expected + slack + 1,
            sign,
        ) {
            Some(idx) if idx > pos => idx,
            _ => break,
        };

        markers.push(next);
        pos = next;
    }
}

/// Index of the strongest signed value in `[lo, hi)`, if the range is valid
fn peak_in(samples: &[f32], lo: usize, hi: usize, sign: f32) -> Option<usize> {
    let hi = hi.min(samples.len());
    if lo >= hi {
        return None;
    }

    let mut best = lo;
    for i in lo + 1..hi {
        if sign * samples[i] > sign * samples[best] {
            best = i;
        }
    }
    Some(best)
}

/// Convert a marker sequence into filtered cycle periods and amplitudes.
///
/// Cycles outside `[period_floor_secs, period_ceiling_secs]` are rejected,
/// as are cycles whose period jumps by more than `max_period_factor`
/// against the previous accepted cycle. Periods and amplitudes stay
/// index-aligned.
pub fn cycle_series(
    samples: &[f32],
    markers: &[usize],
    sample_rate: u32,
    period_floor_secs: f32,
    period_ceiling_secs: f32,
    max_period_factor: f32,
) -> CycleSeries {
    let mut series = CycleSeries::default();

    for pair in markers.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        if end <= start || end > samples.len() {
            continue;
        }

        let period = (end - start) as f32 / sample_rate as f32;
        if period < period_floor_secs || period > period_ceiling_secs {
            continue;
        }

        if let Some(&prev) = series.periods.last() {
            let ratio = if period > prev { period / prev } else { prev / period };
            if ratio > max_period_factor {
                continue;
            }
        }

        let amplitude = samples[start..end]
            .iter()
            .map(|&x| x.abs())
            .fold(0.0f32, f32::max);

        series.periods.push(period);
        series.amplitudes.push(amplitude);
    }

    log::debug!(
        "Cycle series: {} accepted of {} marked cycles",
        series.len(),
        markers.len().saturating_sub(1)
    );

    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::pitch::estimate_pitch_contour;

    fn sine(freq: f32, duration_secs: f32, sample_rate: u32) -> Vec<f32> {
        let length = (duration_secs * sample_rate as f32) as usize;
        (0..length)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                0.8 * (2.0 * std::f32::consts::PI * freq * t).sin()
            })
            .collect()
    }

    #[test]
    fn test_markers_track_cycle_period() {
        let sample_rate = 44100u32;
        let samples = sine(200.0, 1.0, sample_rate);
        let contour =
            estimate_pitch_contour(&samples, sample_rate, 75.0, 600.0, 0.45, 0.03, 0.01).unwrap();

        let markers = extract_markers(&samples, &contour).unwrap();

        // 200 Hz means 220.5 samples per cycle
        assert!(
            markers.len() > 150,
            "a second of voicing should mark most cycles, got {}",
            markers.len()
        );
        for pair in markers.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(
                (218..=223).contains(&gap),
                "marker spacing should stay near one period, got {}",
                gap
            );
        }
    }

    #[test]
    fn test_markers_on_negative_polarity_signal() {
        let sample_rate = 44100u32;
        let samples: Vec<f32> = sine(200.0, 1.0, sample_rate)
            .into_iter()
            .map(|x| -x.max(0.0))
            .collect();
        let contour =
            estimate_pitch_contour(&samples, sample_rate, 75.0, 600.0, 0.45, 0.03, 0.01).unwrap();

        let markers = extract_markers(&samples, &contour).unwrap();
        assert!(markers.len() > 150);
        for pair in markers.windows(2) {
            let gap = pair[1] - pair[0];
            assert!((218..=223).contains(&gap), "spacing {} off-period", gap);
        }
    }

    #[test]
    fn test_cycle_series_from_even_markers() {
        let sample_rate = 44100u32;
        let samples = sine(100.0, 0.2, sample_rate);
        let markers = vec![0usize, 441, 882, 1323, 1764];

        let series = cycle_series(&samples, &markers, sample_rate, 0.0001, 0.02, 1.3);

        assert_eq!(series.len(), 4);
        for &p in &series.periods {
            assert!((p - 0.01).abs() < 1e-6, "period should be 10 ms, got {}", p);
        }
        for &a in &series.amplitudes {
            assert!((a - 0.8).abs() < 0.01, "cycle peak should be ~0.8, got {}", a);
        }
    }

    #[test]
    fn test_cycle_series_rejects_out_of_range_periods() {
        let sample_rate = 44100u32;
        let samples = vec![0.5f32; 6000];
        // Gaps: 441 ok, 1323 (30 ms, above ceiling), 441 ok
        let markers = vec![0usize, 441, 1764, 2205];

        let series = cycle_series(&samples, &markers, sample_rate, 0.0001, 0.02, 1.3);
        assert_eq!(series.len(), 2, "the 30 ms cycle should be rejected");
    }

    #[test]
    fn test_cycle_series_rejects_period_jumps() {
        let sample_rate = 44100u32;
        let samples = vec![0.5f32; 6000];
        // 441-sample cycles with one 662-sample cycle (ratio 1.5)
        let markers = vec![0usize, 441, 882, 1544, 1985];

        let series = cycle_series(&samples, &markers, sample_rate, 0.0001, 0.02, 1.3);
        assert_eq!(series.len(), 3, "the 1.5x period jump should be rejected");
    }

    #[test]
    fn test_empty_contour_is_invalid() {
        let contour = PitchContour {
            frames: vec![],
            sample_rate: 44100,
        };
        assert!(extract_markers(&[0.0; 1000], &contour).is_err());
    }
}
