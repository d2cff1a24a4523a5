//! Machine learning inference modules
//!
//! Loads the pre-trained scaler and classifier artifacts and runs risk
//! classification over assembled feature vectors.

pub mod artifacts;
pub mod classifier;
