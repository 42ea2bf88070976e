//! Mathematical utilities: equation weighting.

pub mod weighting;

pub use weighting::*;
