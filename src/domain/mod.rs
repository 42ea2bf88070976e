//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the fitting algorithm selector (`Algorithm`, `ExternalVariant`)
//! - the immutable run configuration (`RunConfig`)
//! - loaded inputs (`LoadedSystem`) and fit outputs (`Solution`)

pub mod types;

pub use types::*;
