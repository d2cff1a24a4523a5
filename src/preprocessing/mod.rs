//! Signal conditioning modules
//!
//! Utilities that turn a raw capture buffer into the canonical analysis
//! buffer:
//! - Resampling to the pipeline's target rate
//! - Normalization (peak, RMS)
//! - Edge-silence trimming
//! - The conditioning orchestrator with its viability policy

pub mod conditioner;
pub mod normalization;
pub mod resampler;
pub mod silence;

pub use conditioner::{condition, AudioBuffer, Conditioned};
