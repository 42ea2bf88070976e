//! Command-line parsing for the force-field least-squares fitter.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! fitting/decoding code. `--algorithm` is deliberately a plain string here:
//! unknown names are rejected by the domain layer as a configuration error,
//! with the same exit code as any other bad setting.

use std::path::PathBuf;

use clap::Parser;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "ffit",
    version,
    about = "Least-squares force matching for linear force-field models"
)]
pub struct Args {
    /// Design (derivative) matrix file.
    #[arg(long = "a", default_value = "A.txt", value_name = "FILE")]
    pub matrix: PathBuf,

    /// Target (force) file.
    #[arg(long = "b", default_value = "b.txt", value_name = "FILE")]
    pub target: PathBuf,

    /// Fitting algorithm: svd, lasso, lassolars, dlars, or dlasso.
    #[arg(long, default_value = "svd")]
    pub algorithm: String,

    /// Parameter file header.
    #[arg(long, default_value = "params.header", value_name = "FILE")]
    pub header: PathBuf,

    /// Parameter file map (echoed verbatim into the report).
    #[arg(long, default_value = "ff_groups.map", value_name = "FILE")]
    pub map: PathBuf,

    /// Per-equation weight file.
    #[arg(long, value_name = "FILE")]
    pub weights: Option<PathBuf>,

    /// Predicted-force output file.
    #[arg(long = "force-out", default_value = "force.txt", value_name = "FILE")]
    pub force_out: PathBuf,

    /// SVD regularization: fraction of the largest singular value below
    /// which singular values are treated as zero.
    #[arg(long, default_value_t = 1.0e-5)]
    pub eps: f64,

    /// Lasso/LARS regularization strength.
    #[arg(long, default_value_t = 1.0e-4)]
    pub alpha: f64,

    /// Directory containing the external LARS/lasso solver binary.
    #[arg(long = "solver-path", value_name = "DIR")]
    pub solver_path: Option<PathBuf>,

    /// Node count for distributed solver runs.
    #[arg(long, default_value_t = 1)]
    pub nodes: usize,

    /// Worker count for distributed solver runs.
    #[arg(long, default_value_t = 8)]
    pub cores: usize,

    /// Ask the external solver to normalize matrix columns.
    #[arg(long)]
    pub normalize: bool,

    /// The design matrix was written pre-partitioned; skip local loading.
    #[arg(long = "split-files")]
    pub split_files: bool,

    /// Reuse the output files of a previous external run instead of solving.
    #[arg(long = "read-output")]
    pub read_output: bool,

    /// Restart file for resuming a prior external run.
    #[arg(long, value_name = "FILE")]
    pub restart: Option<String>,

    /// Run driven by the active-learning driver (alters which inputs are read).
    #[arg(long)]
    pub active: bool,

    /// Export the run summary and decoded parameters as JSON.
    #[arg(long = "export-report", value_name = "JSON")]
    pub export_report: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_configuration() {
        let args = Args::parse_from(["ffit"]);
        assert_eq!(args.matrix, PathBuf::from("A.txt"));
        assert_eq!(args.target, PathBuf::from("b.txt"));
        assert_eq!(args.algorithm, "svd");
        assert_eq!(args.header, PathBuf::from("params.header"));
        assert_eq!(args.map, PathBuf::from("ff_groups.map"));
        assert_eq!(args.eps, 1.0e-5);
        assert_eq!(args.alpha, 1.0e-4);
        assert_eq!(args.nodes, 1);
        assert_eq!(args.cores, 8);
        assert!(!args.split_files);
        assert!(!args.read_output);
        assert!(!args.active);
        assert!(args.weights.is_none());
    }

    #[test]
    fn flags_parse_into_their_fields() {
        let args = Args::parse_from([
            "ffit",
            "--a",
            "mat.txt",
            "--algorithm",
            "dlasso",
            "--weights",
            "w.txt",
            "--solver-path",
            "contrib/dlars/src",
            "--nodes",
            "4",
            "--cores",
            "32",
            "--split-files",
            "--normalize",
            "--restart",
            "run.chk",
        ]);
        assert_eq!(args.matrix, PathBuf::from("mat.txt"));
        assert_eq!(args.algorithm, "dlasso");
        assert_eq!(args.weights, Some(PathBuf::from("w.txt")));
        assert_eq!(args.solver_path, Some(PathBuf::from("contrib/dlars/src")));
        assert_eq!(args.nodes, 4);
        assert_eq!(args.cores, 32);
        assert!(args.split_files);
        assert!(args.normalize);
        assert_eq!(args.restart, Some("run.chk".to_string()));
    }
}
