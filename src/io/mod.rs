//! File I/O: numeric input loaders, the predicted-force writer, and the
//! optional JSON report export.

pub mod export;
pub mod matrix;
pub mod predictions;
