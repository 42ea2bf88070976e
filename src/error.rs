//! Fatal error kinds for a fitting run.
//!
//! Every error aborts the run; none are retried. Each variant carries enough
//! state (counts, paths, line numbers, offending content) to diagnose the
//! failure without rerunning, and maps to a distinct process exit code so
//! driver scripts can tell failure classes apart.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Row/length mismatch between the design matrix, target, or weights.
    #[error("dimension mismatch in {context}: expected {expected}, found {found}")]
    DimensionMismatch {
        context: String,
        expected: usize,
        found: usize,
    },

    /// Invalid or inconsistent run configuration (unknown algorithm,
    /// missing required path, incompatible mode flags).
    #[error("configuration error: {0}")]
    Config(String),

    /// A numeric input file contained something unparseable.
    #[error("failed to parse '{}' line {line}: {message}", .path.display())]
    InputParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// File access failure (open/read/write).
    #[error("{context} '{}': {source}", .path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    /// Matrix factorization did not converge.
    #[error("linear algebra failure: {0}")]
    LinearAlgebra(String),

    /// The external solver binary is missing, exited non-zero, or produced
    /// unreadable output.
    #[error("external solver failure: {0}")]
    ExternalSolver(String),

    /// Malformed or incomplete parameter header.
    #[error("header parse error at line {line}: {message}")]
    SchemaParse { line: usize, message: String },

    /// The decoded parameter count is inconsistent with the solution length.
    #[error(
        "parameter count mismatch: solution has {solution_len} entries, schema \
         describes {total_params} structural parameters \
         (pair types: {pair_types}, coefficients per pair: {coeffs_per_pair}, \
         triplet parameters: {triplet_params}, quadruplet parameters: {quadruplet_params}, \
         Coulomb parameters: {coulomb_params}, energy offsets: {energy_offsets})"
    )]
    ParameterCountMismatch {
        solution_len: usize,
        total_params: usize,
        pair_types: usize,
        coeffs_per_pair: usize,
        triplet_params: usize,
        quadruplet_params: usize,
        coulomb_params: usize,
        energy_offsets: usize,
    },
}

impl AppError {
    /// Process exit code for this failure class.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Config(_) => 2,
            AppError::Io { .. } => 2,
            AppError::InputParse { .. } => 3,
            AppError::DimensionMismatch { .. } => 4,
            AppError::LinearAlgebra(_) => 5,
            AppError::ExternalSolver(_) => 6,
            AppError::SchemaParse { .. } => 7,
            AppError::ParameterCountMismatch { .. } => 8,
        }
    }

    /// Wrap an I/O failure with the operation and path that produced it.
    pub fn io(context: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::Io {
            context,
            path: path.into(),
            source,
        }
    }
}
