//! Client for the external LARS/lasso solver.
//!
//! The solver is a separate binary invoked as a blocking subprocess: locally
//! for the `lasso`/`lassolars` algorithms, or through the cluster launcher
//! for distributed runs. The request is a typed record rendered to a command
//! line; the response is read back from the solver's two output files after
//! it exits successfully. No retries: a missing binary, non-zero exit, or
//! unreadable output aborts the run. A prior run's output can be reused via
//! `read_previous_output` (the human-triggered resume path).

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Command;

use nalgebra::DVector;

use crate::domain::{ExternalVariant, RunConfig};
use crate::error::AppError;
use crate::io::matrix::load_vector;

/// Dimension file the solver reads alongside the matrices.
pub const DIMENSION_FILE: &str = "dim.txt";
/// Coefficient vector written by the solver.
pub const COEFFICIENT_FILE: &str = "x.txt";
/// Predicted-target vector written by the solver.
pub const PREDICTION_FILE: &str = "Ax.txt";
/// Captured solver stdout/stderr.
pub const LOG_FILE: &str = "dlars.log";
/// Solver binary name inside the solver directory.
pub const SOLVER_BINARY: &str = "dlars";
/// Cluster launcher used for distributed runs.
const LAUNCHER: &str = "srun";

/// Parallelism settings for a distributed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Launcher {
    pub nodes: usize,
    pub cores: usize,
}

/// One fully specified solver invocation.
#[derive(Debug, Clone)]
pub struct ExternalRequest {
    pub solver_dir: PathBuf,
    pub matrix_path: PathBuf,
    pub target_path: PathBuf,
    pub alpha: f64,
    pub variant: ExternalVariant,
    pub split_files: bool,
    pub weights_path: Option<PathBuf>,
    pub normalize: bool,
    pub restart_file: Option<String>,
    /// `Some` for distributed runs; `None` runs the binary directly.
    pub launcher: Option<Launcher>,
}

impl ExternalRequest {
    pub fn from_config(config: &RunConfig) -> Result<Self, AppError> {
        let variant = config.algorithm.external_variant().ok_or_else(|| {
            AppError::Config(format!(
                "algorithm {} does not delegate to the external solver",
                config.algorithm.display_name()
            ))
        })?;
        let solver_dir = config.solver_dir.clone().ok_or_else(|| {
            AppError::Config("--solver-path is required for external solver runs".to_string())
        })?;
        Ok(Self {
            solver_dir,
            matrix_path: config.matrix_path.clone(),
            target_path: config.target_path.clone(),
            alpha: config.alpha,
            variant,
            split_files: config.split_files,
            weights_path: config.weights_path.clone(),
            normalize: config.normalize,
            restart_file: config.restart_file.clone(),
            launcher: config
                .algorithm
                .is_distributed()
                .then_some(Launcher {
                    nodes: config.nodes,
                    cores: config.cores,
                }),
        })
    }

    /// Full path of the solver binary.
    pub fn binary(&self) -> PathBuf {
        self.solver_dir.join(SOLVER_BINARY)
    }

    /// Render the invocation as `(program, args)`.
    ///
    /// Kept separate from spawning so construction is testable without a
    /// solver installation.
    pub fn command_line(&self) -> (String, Vec<String>) {
        let mut args = Vec::new();
        let program = match self.launcher {
            Some(launcher) => {
                args.extend([
                    "-N".to_string(),
                    launcher.nodes.to_string(),
                    "-n".to_string(),
                    launcher.cores.to_string(),
                    self.binary().display().to_string(),
                ]);
                LAUNCHER.to_string()
            }
            None => self.binary().display().to_string(),
        };

        args.push(self.matrix_path.display().to_string());
        args.push(self.target_path.display().to_string());
        args.push(DIMENSION_FILE.to_string());
        args.push(format!("--lambda={}", self.alpha));
        if self.split_files {
            args.push("--split_files".to_string());
        }
        args.push(format!("--algorithm={}", self.variant.flag_value()));
        if let Some(weights) = &self.weights_path {
            args.push(format!("--weights={}", weights.display()));
        }
        args.push(format!(
            "--normalize={}",
            if self.normalize { "y" } else { "n" }
        ));
        if let Some(restart) = &self.restart_file {
            args.push(format!("--restart={restart}"));
        }

        (program, args)
    }
}

/// The solver's response: coefficients and its own predicted targets.
#[derive(Debug, Clone)]
pub struct ExternalOutput {
    pub x: DVector<f64>,
    pub predicted: DVector<f64>,
}

/// Run the solver and read its output files back.
pub fn run(request: &ExternalRequest) -> Result<ExternalOutput, AppError> {
    let binary = request.binary();
    if !binary.exists() {
        return Err(AppError::ExternalSolver(format!(
            "solver binary '{}' does not exist",
            binary.display()
        )));
    }

    let (program, args) = request.command_line();
    log::info!("external solver: {program} {}", args.join(" "));

    let log_out = File::create(LOG_FILE).map_err(|e| AppError::io("failed to create", LOG_FILE, e))?;
    let log_err = log_out
        .try_clone()
        .map_err(|e| AppError::io("failed to reopen", LOG_FILE, e))?;
    let status = Command::new(&program)
        .args(&args)
        .stdout(log_out)
        .stderr(log_err)
        .status()
        .map_err(|e| AppError::ExternalSolver(format!("failed to launch '{program}': {e}")))?;
    if !status.success() {
        return Err(AppError::ExternalSolver(format!(
            "'{program}' exited with {status}; see {LOG_FILE}"
        )));
    }

    read_previous_output(Path::new("."))
}

/// Read the output files of a prior solver run from `dir`.
pub fn read_previous_output(dir: &Path) -> Result<ExternalOutput, AppError> {
    Ok(ExternalOutput {
        x: load_output_vector(dir, COEFFICIENT_FILE)?,
        predicted: load_output_vector(dir, PREDICTION_FILE)?,
    })
}

fn load_output_vector(dir: &Path, name: &str) -> Result<DVector<f64>, AppError> {
    load_vector(&dir.join(name))
        .map_err(|e| AppError::ExternalSolver(format!("could not read solver output '{name}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use crate::domain::Algorithm;

    fn request() -> ExternalRequest {
        ExternalRequest {
            solver_dir: "contrib/dlars/src".into(),
            matrix_path: "A.txt".into(),
            target_path: "b.txt".into(),
            alpha: 1.0e-4,
            variant: ExternalVariant::Lars,
            split_files: false,
            weights_path: None,
            normalize: false,
            restart_file: None,
            launcher: None,
        }
    }

    #[test]
    fn local_command_runs_binary_directly() {
        let (program, args) = request().command_line();
        assert_eq!(program, "contrib/dlars/src/dlars");
        assert_eq!(
            args,
            vec![
                "A.txt",
                "b.txt",
                "dim.txt",
                "--lambda=0.0001",
                "--algorithm=lars",
                "--normalize=n",
            ]
        );
    }

    #[test]
    fn distributed_command_goes_through_launcher() {
        let mut req = request();
        req.launcher = Some(Launcher { nodes: 2, cores: 16 });
        req.variant = ExternalVariant::Lasso;
        req.split_files = true;
        req.weights_path = Some("w.txt".into());
        req.normalize = true;
        req.restart_file = Some("restart.chk".to_string());

        let (program, args) = req.command_line();
        assert_eq!(program, "srun");
        assert_eq!(
            args,
            vec![
                "-N",
                "2",
                "-n",
                "16",
                "contrib/dlars/src/dlars",
                "A.txt",
                "b.txt",
                "dim.txt",
                "--lambda=0.0001",
                "--split_files",
                "--algorithm=lasso",
                "--weights=w.txt",
                "--normalize=y",
                "--restart=restart.chk",
            ]
        );
    }

    #[test]
    fn from_config_requires_an_external_algorithm() {
        let config = RunConfig {
            matrix_path: "A.txt".into(),
            target_path: "b.txt".into(),
            header_path: "params.header".into(),
            map_path: "ff_groups.map".into(),
            weights_path: None,
            predictions_path: "force.txt".into(),
            algorithm: Algorithm::Svd,
            eps: 1.0e-5,
            alpha: 1.0e-4,
            solver_dir: Some("contrib".into()),
            nodes: 1,
            cores: 8,
            normalize: false,
            split_files: false,
            read_output: false,
            restart_file: None,
            active_learning: false,
            export_report: None,
        };
        assert!(matches!(
            ExternalRequest::from_config(&config),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn missing_binary_is_an_external_solver_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut req = request();
        req.solver_dir = dir.path().join("nowhere");
        let err = run(&req).unwrap_err();
        assert!(matches!(err, AppError::ExternalSolver(_)));
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn reads_previous_output_pair() {
        let dir = tempfile::tempdir().unwrap();
        let mut xf = File::create(dir.path().join(COEFFICIENT_FILE)).unwrap();
        writeln!(xf, "0.5\n-0.25\n").unwrap();
        let mut yf = File::create(dir.path().join(PREDICTION_FILE)).unwrap();
        writeln!(yf, "1.0\n2.0\n3.0\n").unwrap();

        let out = read_previous_output(dir.path()).unwrap();
        assert_eq!(out.x.len(), 2);
        assert_eq!(out.predicted.len(), 3);
        assert_eq!(out.x[1], -0.25);
    }

    #[test]
    fn missing_output_is_an_external_solver_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_previous_output(dir.path()).unwrap_err();
        assert!(matches!(err, AppError::ExternalSolver(_)));
        assert!(err.to_string().contains(COEFFICIENT_FILE));
    }
}
