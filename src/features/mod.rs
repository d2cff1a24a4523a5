//! Feature extraction modules
//!
//! This module contains all acoustic feature extraction algorithms:
//! - Pitch contour estimation (autocorrelation method)
//! - Periodicity marker extraction (cycle positions and amplitudes)
//! - Perturbation measures (jitter and shimmer families)
//! - Harmonicity measures (HNR and NHR)

pub mod harmonicity;
pub mod markers;
pub mod perturbation;
pub mod pitch;
