//! Analysis and result aggregation modules
//!
//! Combines the feature extractors into final screening output:
//! - Measurement cascade with layered fallback
//! - Feature vector assembly
//! - Result and report types

pub mod measurement;
pub mod result;
pub mod vector;
