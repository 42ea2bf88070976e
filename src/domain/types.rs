//! Shared domain types.
//!
//! `RunConfig` is the single source of configuration: it is built once from
//! CLI arguments, validated, and then passed by reference to every component
//! that needs it. Nothing reads ambient state behind the pipeline's back.

use std::path::PathBuf;

use nalgebra::{DMatrix, DVector};

use crate::error::AppError;

/// Fitting algorithm selector.
///
/// `Dlars` and `Dlasso` are the two variants of the distributed external
/// solver; `Lasso` and `LassoLars` run the same external solver locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// Regularized SVD with a singular-value cutoff.
    Svd,
    /// L1-regularized regression, delegated to the external solver.
    Lasso,
    /// LARS-path implementation of the lasso, delegated to the external solver.
    LassoLars,
    /// Distributed LARS run (multi-node external solver).
    Dlars,
    /// Distributed lasso run (multi-node external solver).
    Dlasso,
}

impl Algorithm {
    /// Parse a user-supplied algorithm name.
    ///
    /// Unknown names are a configuration error, not a CLI parse error, so
    /// they surface with the same exit code as any other bad setting.
    pub fn parse(name: &str) -> Result<Self, AppError> {
        match name {
            "svd" => Ok(Algorithm::Svd),
            "lasso" => Ok(Algorithm::Lasso),
            "lassolars" => Ok(Algorithm::LassoLars),
            "dlars" => Ok(Algorithm::Dlars),
            "dlasso" => Ok(Algorithm::Dlasso),
            other => Err(AppError::Config(format!(
                "unrecognized fitting algorithm '{other}' \
                 (expected svd, lasso, lassolars, dlars, or dlasso)"
            ))),
        }
    }

    /// Human-readable label for the report preamble.
    pub fn display_name(self) -> &'static str {
        match self {
            Algorithm::Svd => "svd",
            Algorithm::Lasso => "lasso",
            Algorithm::LassoLars => "lassolars",
            Algorithm::Dlars => "dlars",
            Algorithm::Dlasso => "dlasso",
        }
    }

    /// Whether this algorithm runs the external solver through the cluster
    /// launcher (multi-node) rather than locally.
    pub fn is_distributed(self) -> bool {
        matches!(self, Algorithm::Dlars | Algorithm::Dlasso)
    }

    /// Which external solver variant this algorithm maps to, if any.
    pub fn external_variant(self) -> Option<ExternalVariant> {
        match self {
            Algorithm::Svd => None,
            Algorithm::Lasso | Algorithm::Dlasso => Some(ExternalVariant::Lasso),
            Algorithm::LassoLars | Algorithm::Dlars => Some(ExternalVariant::Lars),
        }
    }
}

/// Algorithm variant understood by the external solver binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalVariant {
    Lars,
    Lasso,
}

impl ExternalVariant {
    /// Value passed on the external solver's `--algorithm=` flag.
    pub fn flag_value(self) -> &'static str {
        match self {
            ExternalVariant::Lars => "lars",
            ExternalVariant::Lasso => "lasso",
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults) and never mutated.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Design (derivative) matrix file.
    pub matrix_path: PathBuf,
    /// Target (force) vector file.
    pub target_path: PathBuf,
    /// Parameter header file describing the interaction topology.
    pub header_path: PathBuf,
    /// Parameter map file, echoed verbatim into the report.
    pub map_path: PathBuf,
    /// Optional per-equation weight file.
    pub weights_path: Option<PathBuf>,
    /// Predicted-force output file.
    pub predictions_path: PathBuf,

    pub algorithm: Algorithm,
    /// SVD regularization fraction: singular values below `eps * dmax` are
    /// treated as numerically zero.
    pub eps: f64,
    /// Lasso/LARS regularization strength.
    pub alpha: f64,

    /// Directory containing the external solver binary.
    pub solver_dir: Option<PathBuf>,
    /// Node count for the distributed launcher.
    pub nodes: usize,
    /// Worker count for the distributed launcher.
    pub cores: usize,
    /// Ask the external solver to normalize columns.
    pub normalize: bool,
    /// The design matrix was written pre-partitioned; skip local loading.
    pub split_files: bool,
    /// Reuse the output files of a prior external run instead of solving.
    pub read_output: bool,
    /// Restart file for resuming a prior external run.
    pub restart_file: Option<String>,
    /// Run driven by the active-learning driver (alters which inputs are read).
    pub active_learning: bool,

    /// Optional machine-readable report export.
    pub export_report: Option<PathBuf>,
}

impl RunConfig {
    /// Check cross-field consistency before any file is touched.
    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.eps.is_finite() && self.eps > 0.0) {
            return Err(AppError::Config(format!(
                "--eps must be a positive finite number, got {}",
                self.eps
            )));
        }
        if !(self.alpha.is_finite() && self.alpha > 0.0) {
            return Err(AppError::Config(format!(
                "--alpha must be a positive finite number, got {}",
                self.alpha
            )));
        }
        if self.algorithm.is_distributed() {
            if self.solver_dir.is_none() {
                return Err(AppError::Config(
                    "distributed algorithms require --solver-path <dir> \
                     pointing at the external solver binary"
                        .to_string(),
                ));
            }
            if self.nodes == 0 || self.cores == 0 {
                return Err(AppError::Config(
                    "--nodes and --cores must be at least 1".to_string(),
                ));
            }
        } else {
            // Local algorithms solve against in-memory matrices; the modes
            // that skip materializing them only make sense for the
            // distributed path.
            if self.read_output {
                return Err(AppError::Config(format!(
                    "--read-output is only valid with dlars/dlasso, not {}",
                    self.algorithm.display_name()
                )));
            }
            if self.active_learning {
                return Err(AppError::Config(format!(
                    "--active is only valid with dlars/dlasso, not {}",
                    self.algorithm.display_name()
                )));
            }
            if self.split_files {
                return Err(AppError::Config(format!(
                    "--split-files is only valid with dlars/dlasso, not {}",
                    self.algorithm.display_name()
                )));
            }
        }
        if matches!(self.algorithm, Algorithm::Lasso | Algorithm::LassoLars)
            && self.solver_dir.is_none()
        {
            return Err(AppError::Config(
                "lasso/lassolars delegate to the external solver; \
                 --solver-path <dir> is required"
                    .to_string(),
            ));
        }
        if self.restart_file.is_some() && !self.algorithm.is_distributed() {
            return Err(AppError::Config(
                "--restart only applies to dlars/dlasso runs".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether this run applies weights locally (the external solver applies
    /// them itself when it is handed the weight-file path).
    pub fn weights_applied_locally(&self) -> bool {
        self.algorithm == Algorithm::Svd && self.weights_path.is_some()
    }
}

/// Inputs loaded for a run.
///
/// The design matrix is absent in split-file, read-output, and
/// active-learning modes, where it is never materialized locally. The
/// variable count is therefore optional rather than a sentinel value: it is
/// known only when the matrix was read or a dimension file supplied it.
#[derive(Debug, Clone)]
pub struct LoadedSystem {
    pub matrix: Option<DMatrix<f64>>,
    pub target: DVector<f64>,
    pub var_count: Option<usize>,
    pub equation_count: usize,
}

/// Output of the solver layer.
///
/// The coefficient vector is created here and consumed read-only by
/// diagnostics and the parameter decoder.
#[derive(Debug, Clone)]
pub struct Solution {
    pub x: DVector<f64>,
    /// Predicted targets for the *unweighted* system.
    pub predicted: DVector<f64>,
    /// Count of variables the algorithm actually used.
    pub active_vars: usize,
    /// Report preamble lines describing how the solve was performed.
    pub notes: Vec<String>,
}
