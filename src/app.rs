//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments into the run configuration
//! - executes the fitting pipeline
//! - prints the report and writes optional exports

use clap::Parser;

use crate::cli::Args;
use crate::domain::{Algorithm, RunConfig};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `ffit` binary.
pub fn run() -> Result<(), AppError> {
    let _ = pretty_env_logger::try_init();

    let args = Args::parse();
    let config = run_config_from_args(&args)?;
    config.validate()?;

    let output = pipeline::run_fit(&config)?;

    print!(
        "{}",
        crate::report::format_report(
            &config,
            &output.system,
            &output.solution,
            &output.diagnostics,
            &output.schema,
            &output.parameters,
            &output.map_text,
        )
    );

    if let Some(path) = &config.export_report {
        crate::io::export::write_report_json(path, &config, &output.diagnostics, &output.parameters)?;
    }

    Ok(())
}

/// Build the immutable run configuration from parsed arguments.
pub fn run_config_from_args(args: &Args) -> Result<RunConfig, AppError> {
    Ok(RunConfig {
        matrix_path: args.matrix.clone(),
        target_path: args.target.clone(),
        header_path: args.header.clone(),
        map_path: args.map.clone(),
        weights_path: args.weights.clone(),
        predictions_path: args.force_out.clone(),
        algorithm: Algorithm::parse(&args.algorithm)?,
        eps: args.eps,
        alpha: args.alpha,
        solver_dir: args.solver_path.clone(),
        nodes: args.nodes,
        cores: args.cores,
        normalize: args.normalize,
        split_files: args.split_files,
        read_output: args.read_output,
        restart_file: args.restart.clone(),
        active_learning: args.active,
        export_report: args.export_report.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_building_rejects_unknown_algorithms() {
        let args = Args::parse_from(["ffit", "--algorithm", "ridge"]);
        let err = run_config_from_args(&args).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn config_carries_all_paths() {
        let args = Args::parse_from([
            "ffit",
            "--a",
            "mat.txt",
            "--b",
            "forces.txt",
            "--header",
            "h.txt",
            "--map",
            "m.txt",
            "--force-out",
            "out.txt",
        ]);
        let config = run_config_from_args(&args).unwrap();
        assert_eq!(config.matrix_path.to_str(), Some("mat.txt"));
        assert_eq!(config.target_path.to_str(), Some("forces.txt"));
        assert_eq!(config.header_path.to_str(), Some("h.txt"));
        assert_eq!(config.map_path.to_str(), Some("m.txt"));
        assert_eq!(config.predictions_path.to_str(), Some("out.txt"));
        assert!(config.validate().is_ok());
    }
}
