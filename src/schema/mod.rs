//! Parameter-header parsing.
//!
//! Responsibilities:
//!
//! - scan the semi-structured header text with a tokenizing line scanner
//! - locate the fixed anchor lines and the optional triplet/quadruplet
//!   marker blocks
//! - produce a typed `InteractionSchema`, including the offset table that
//!   the parameter decoder consumes read-only

pub mod parser;
pub mod scan;
pub mod types;

pub use parser::*;
pub use scan::*;
pub use types::*;
