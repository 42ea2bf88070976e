//! Solver layer.
//!
//! Responsibilities:
//!
//! - dispatch on the configured algorithm
//! - run the regularized-SVD solve locally, or delegate to the external
//!   LARS/lasso solver
//! - produce predictions for the *unweighted* system, except where the
//!   solver already emits them (the distributed path, where the design
//!   matrix may never be materialized locally)

use std::path::Path;

use crate::domain::{Algorithm, LoadedSystem, RunConfig, Solution};
use crate::error::AppError;
use crate::math::WeightedSystem;

pub mod diagnostics;
pub mod external;
pub mod svd;

pub use diagnostics::*;
pub use external::*;
pub use svd::*;

/// Solve the loaded system with the configured algorithm.
///
/// `weighted` is the locally weighted copy of the system when this run
/// applies weights in-process; delegating algorithms instead hand the
/// weight-file path to the external solver.
pub fn solve(
    config: &RunConfig,
    system: &LoadedSystem,
    weighted: Option<&WeightedSystem>,
) -> Result<Solution, AppError> {
    match config.algorithm {
        Algorithm::Svd => solve_with_svd(config, system, weighted),
        Algorithm::Lasso | Algorithm::LassoLars => solve_with_local_external(config, system),
        Algorithm::Dlars | Algorithm::Dlasso => solve_with_distributed(config, system),
    }
}

fn require_matrix<'a>(
    system: &'a LoadedSystem,
    algorithm: Algorithm,
) -> Result<&'a nalgebra::DMatrix<f64>, AppError> {
    system.matrix.as_ref().ok_or_else(|| {
        AppError::Config(format!(
            "the {} algorithm requires a locally materialized design matrix",
            algorithm.display_name()
        ))
    })
}

fn solve_with_svd(
    config: &RunConfig,
    system: &LoadedSystem,
    weighted: Option<&WeightedSystem>,
) -> Result<Solution, AppError> {
    let matrix = require_matrix(system, config.algorithm)?;
    let (work_matrix, work_target) = match weighted {
        Some(w) => (&w.matrix, &w.target),
        None => (matrix, &system.target),
    };

    let sol = svd::solve_svd(work_matrix, work_target, config.eps)?;
    let predicted = matrix * &sol.x;

    Ok(Solution {
        notes: vec![
            "! svd algorithm used".to_string(),
            format!("! eps (= eps*dmax) = {}", sol.cutoff),
            format!("! SVD regularization factor = {}", config.eps),
        ],
        x: sol.x,
        predicted,
        active_vars: sol.active_vars,
    })
}

fn solve_with_local_external(
    config: &RunConfig,
    system: &LoadedSystem,
) -> Result<Solution, AppError> {
    let matrix = require_matrix(system, config.algorithm)?;
    let request = external::ExternalRequest::from_config(config)?;
    let output = external::run(&request)?;

    let label = match config.algorithm {
        Algorithm::LassoLars => "! LARS implementation of LASSO used (external solver)",
        _ => "! lasso regression used (external solver)",
    };
    let predicted = matrix * &output.x;
    let active_vars = diagnostics::count_active(&output.x);

    Ok(Solution {
        notes: vec![label.to_string(), format!("! lasso alpha = {}", config.alpha)],
        x: output.x,
        predicted,
        active_vars,
    })
}

fn solve_with_distributed(config: &RunConfig, system: &LoadedSystem) -> Result<Solution, AppError> {
    let request = external::ExternalRequest::from_config(config)?;

    let mut notes = vec![
        match config.algorithm {
            Algorithm::Dlasso => "! distributed solver used for LASSO".to_string(),
            _ => "! distributed solver used for LARS".to_string(),
        },
        format!("! solver alpha = {}", config.alpha),
    ];

    let output = if config.read_output {
        notes.push("! reading output from a prior solver run".to_string());
        external::read_previous_output(Path::new("."))?
    } else {
        let (program, args) = request.command_line();
        notes.push(format!("! solver run: {program} {}", args.join(" ")));
        external::run(&request)?
    };

    let active_vars = diagnostics::count_active(&output.x);
    let _ = system; // predictions come from the solver, not from A·x

    Ok(Solution {
        notes,
        x: output.x,
        predicted: output.predicted,
        active_vars,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{DMatrix, DVector};

    fn svd_config() -> RunConfig {
        RunConfig {
            matrix_path: "A.txt".into(),
            target_path: "b.txt".into(),
            header_path: "params.header".into(),
            map_path: "ff_groups.map".into(),
            weights_path: None,
            predictions_path: "force.txt".into(),
            algorithm: Algorithm::Svd,
            eps: 1.0e-5,
            alpha: 1.0e-4,
            solver_dir: None,
            nodes: 1,
            cores: 8,
            normalize: false,
            split_files: false,
            read_output: false,
            restart_file: None,
            active_learning: false,
            export_report: None,
        }
    }

    #[test]
    fn svd_dispatch_solves_and_predicts() {
        let matrix = DMatrix::from_row_slice(4, 2, &[1.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, -1.0]);
        let target = DVector::from_row_slice(&[1.0, 2.0, 3.0, -1.0]);
        let system = LoadedSystem {
            matrix: Some(matrix.clone()),
            target: target.clone(),
            var_count: Some(2),
            equation_count: 4,
        };

        let solution = solve(&svd_config(), &system, None).unwrap();
        assert_eq!(solution.x.len(), 2);
        assert_eq!(solution.predicted.len(), 4);
        assert_eq!(solution.active_vars, 2);
        assert!(solution.notes.iter().any(|n| n.contains("svd")));

        // The target is exactly representable, so the fit is perfect.
        for i in 0..4 {
            assert!((solution.predicted[i] - target[i]).abs() < 1.0e-10);
        }
    }

    #[test]
    fn svd_predictions_use_the_unweighted_matrix() {
        let matrix = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let target = DVector::from_row_slice(&[2.0, 5.0, 8.0]);
        let weights = DVector::from_row_slice(&[10.0, 1.0, 0.1]);
        let weighted = crate::math::apply_weights(&matrix, &target, &weights).unwrap();

        let system = LoadedSystem {
            matrix: Some(matrix),
            target: target.clone(),
            var_count: Some(2),
            equation_count: 3,
        };
        let solution = solve(&svd_config(), &system, Some(&weighted)).unwrap();

        // Consistent system: weighted solve still reproduces the unweighted
        // targets exactly.
        for i in 0..3 {
            assert!((solution.predicted[i] - target[i]).abs() < 1.0e-9);
        }
    }

    #[test]
    fn svd_without_matrix_is_a_config_error() {
        let system = LoadedSystem {
            matrix: None,
            target: DVector::from_row_slice(&[1.0]),
            var_count: None,
            equation_count: 1,
        };
        let err = solve(&svd_config(), &system, None).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
