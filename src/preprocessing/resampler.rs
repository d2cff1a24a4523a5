//! Sample-rate conversion for ingested recordings
//!
//! Every recording is converted once, at ingestion, to the pipeline's target
//! rate. Conversion uses rubato's polynomial resampler over the whole buffer
//! in a single pass; capture buffers are short enough that chunked streaming
//! would only add state.

use crate::error::PipelineError;
use rubato::{FastFixedIn, PolynomialDegree, Resampler};

/// Resample a mono buffer to `output_rate`.
///
/// Returns a copy when the rates already match. An empty input resamples to
/// an empty output.
///
/// # Errors
///
/// `InvalidInput` for a zero input or output rate, `ProcessingError` when the
/// resampler rejects the conversion.
pub fn resample(input: &[f32], input_rate: u32, output_rate: u32) -> Result<Vec<f32>, PipelineError> {
    if input_rate == 0 || output_rate == 0 {
        return Err(PipelineError::InvalidInput(format!(
            "Invalid sample rate: {} -> {}",
            input_rate, output_rate
        )));
    }

    if input_rate == output_rate {
        log::debug!("Sample rate already at {} Hz, skipping resample", output_rate);
        return Ok(input.to_vec());
    }

    if input.is_empty() {
        return Ok(Vec::new());
    }

    log::debug!(
        "Resampling {} samples from {} Hz to {} Hz",
        input.len(),
        input_rate,
        output_rate
    );

    let mut resampler = FastFixedIn::<f32>::new(
        output_rate as f64 / input_rate as f64,
        1.0,
        PolynomialDegree::Septic,
        input.len(),
        1,
    )
    .map_err(|e| PipelineError::ProcessingError(format!("Failed to create resampler: {}", e)))?;

    let planar = vec![input.to_vec()];
    let mut channels = resampler
        .process(&planar, None)
        .map_err(|e| PipelineError::ProcessingError(format!("Resampling failed: {}", e)))?;

    channels
        .pop()
        .ok_or_else(|| PipelineError::ProcessingError("Resampler returned no channels".to_string()))
}
