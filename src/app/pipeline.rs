//! The fitting pipeline shared by the CLI front-end.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load -> weight -> solve -> diagnostics -> force file -> schema parse ->
//! parameter decode
//!
//! The caller then focuses on presentation (report printing, exports).

use std::fs;

use crate::domain::{LoadedSystem, RunConfig, Solution};
use crate::error::AppError;
use crate::fit::{self, FitDiagnostics};
use crate::io;
use crate::math;
use crate::report::{self, ParameterReport};
use crate::schema::{self, InteractionSchema};

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub system: LoadedSystem,
    pub solution: Solution,
    pub diagnostics: FitDiagnostics,
    pub schema: InteractionSchema,
    pub parameters: ParameterReport,
    pub map_text: String,
}

/// Execute the full fitting pipeline and return the computed outputs.
///
/// The predicted-force file is written as soon as the solve finishes; the
/// report itself is rendered by the caller only after everything below has
/// succeeded, so the terminal sentinel never follows a partial run.
pub fn run_fit(config: &RunConfig) -> Result<RunOutput, AppError> {
    // 1) Load the inputs this run's mode actually needs.
    let system = io::matrix::load_system(config)?;
    log::info!(
        "loaded {} equations, {} variables",
        system.equation_count,
        system
            .var_count
            .map_or_else(|| "?".to_string(), |n| n.to_string())
    );

    // 2) Load and validate weights. Length is checked even when the weights
    //    are only handed through to the external solver.
    let weights = match (&config.weights_path, config.split_files) {
        (Some(path), false) => Some(io::matrix::load_weights(path, system.equation_count)?),
        _ => None,
    };

    // 3) Weight the system locally where this run solves in-process.
    let weighted = match (&weights, &system.matrix) {
        (Some(w), Some(matrix)) if config.weights_applied_locally() => {
            Some(math::apply_weights(matrix, &system.target, w)?)
        }
        _ => None,
    };

    // 4) Solve.
    let solution = fit::solve(config, &system, weighted.as_ref())?;
    log::info!(
        "solved for {} coefficients ({} active)",
        solution.x.len(),
        solution.active_vars
    );

    // 5) Diagnostics against the unweighted observations.
    let diagnostics =
        fit::diagnostics::compute(&solution.predicted, &system.target, solution.active_vars)?;

    // 6) Predicted-force file.
    io::predictions::write_predictions(&config.predictions_path, &solution.predicted)?;

    // 7) Parse the header schema and decode the coefficient vector.
    let header_text = fs::read_to_string(&config.header_path)
        .map_err(|e| AppError::io("failed to read", &config.header_path, e))?;
    let schema = schema::parse_header(&header_text)?;
    let parameters = report::decode_parameters(&solution.x, &schema)?;

    // 8) Map file, echoed verbatim into the report.
    let map_text = fs::read_to_string(&config.map_path)
        .map_err(|e| AppError::io("failed to read", &config.map_path, e))?;

    Ok(RunOutput {
        system,
        solution,
        diagnostics,
        schema,
        parameters,
        map_text,
    })
}
