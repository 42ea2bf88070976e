//! Render the final run report.
//!
//! The report is assembled as one `String` and printed once by the caller:
//! a failed run therefore never emits a partial report, and the terminal
//! `ENDFILE` sentinel only ever follows a complete one. Layout, in order:
//! solver preamble, header echo, per-pair / per-triplet / per-quadruplet
//! parameter listings, map-file echo, energy offsets, summary statistics,
//! sentinel.

use chrono::Local;

use crate::domain::{LoadedSystem, RunConfig, Solution};
use crate::fit::FitDiagnostics;
use crate::report::decode::{ClusterBlock, ParameterReport};
use crate::schema::{ClusterKind, InteractionSchema};

/// Terminal sentinel marking a complete report.
pub const END_SENTINEL: &str = "ENDFILE";

/// Render the full report.
pub fn format_report(
    config: &RunConfig,
    system: &LoadedSystem,
    solution: &Solution,
    diagnostics: &FitDiagnostics,
    schema: &InteractionSchema,
    parameters: &ParameterReport,
    map_text: &str,
) -> String {
    let mut out = String::new();

    for note in &solution.notes {
        out.push_str(note);
        out.push('\n');
    }

    for line in &schema.echo_lines {
        out.push_str(line);
        out.push('\n');
    }
    out.push('\n');

    out.push_str(&format!("PAIR {} PARAMS \n\n", parameters.potential_family));
    for pair in &parameters.pair_blocks {
        out.push_str(&format!(
            "PAIRTYPE PARAMS: {} {} {}\n\n",
            pair.index, pair.species_a, pair.species_b
        ));
        for (j, value) in pair.coefficients.iter().enumerate() {
            out.push_str(&format!("{j} {value}\n"));
        }
        if let Some(charge) = pair.charge_product {
            out.push_str(&format!(
                "q_{} x q_{} {}\n",
                pair.species_a, pair.species_b, charge
            ));
        }
        out.push_str(" \n");
    }

    out.push_str(&format_cluster_section(
        &parameters.triplet_blocks,
        ClusterKind::Triplet,
        &parameters.potential_family,
    ));
    out.push_str(&format_cluster_section(
        &parameters.quadruplet_blocks,
        ClusterKind::Quadruplet,
        &parameters.potential_family,
    ));

    out.push('\n');
    for line in map_text.lines() {
        out.push_str(line);
        out.push('\n');
    }
    out.push('\n');

    if !parameters.energy_offsets.is_empty() {
        out.push_str(&format!(
            "ENERGY OFFSETS: {}\n",
            parameters.energy_offsets.len()
        ));
        for (i, value) in parameters.energy_offsets.iter().enumerate() {
            out.push_str(&format!("ENERGY OFFSET {} {}\n", i + 1, value));
        }
        out.push('\n');
    }

    out.push_str(&format_summary(config, system, solution, diagnostics));

    out.push_str(END_SENTINEL);
    out.push('\n');
    out
}

/// The closing summary-statistics block.
fn format_summary(
    config: &RunConfig,
    system: &LoadedSystem,
    solution: &Solution,
    diagnostics: &FitDiagnostics,
) -> String {
    let mut out = String::new();

    out.push_str(&format!("! Date {}\n", Local::now().date_naive()));
    out.push_str("!\n");
    let var_count = match system.var_count {
        Some(n) => n.to_string(),
        None => "undefined".to_string(),
    };
    out.push_str(&format!("! Number of variables            = {var_count}\n"));
    out.push_str(&format!(
        "! Number of equations            = {}\n",
        system.equation_count
    ));
    out.push_str(&format!(
        "! RMS force error                = {}\n",
        diagnostics.rms
    ));
    let max_abs = solution.x.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    out.push_str(&format!("! max abs variable               = {max_abs}\n"));
    out.push_str(&format!(
        "! number of fitting vars         = {}\n",
        solution.active_vars
    ));
    out.push_str(&format!(
        "! Bayesian Information Criterion = {}\n",
        diagnostics.bic
    ));
    if let Some(weights) = &config.weights_path {
        out.push_str(&format!(
            "! Using weighting file:            {}\n",
            weights.display()
        ));
    }
    out.push_str("!\n");
    out
}

fn format_cluster_section(blocks: &[ClusterBlock], kind: ClusterKind, family: &str) -> String {
    if blocks.is_empty() {
        return String::new();
    }

    let mut out = format!("{} {} PARAMS \n\n", kind.section_label(), family);
    for block in blocks {
        out.push_str(&format!("{} PARAMS:\n", kind.type_label()));
        out.push_str(&format!("  {}\n", block.header));

        let species = block.species.join(" ");
        if block.excluded {
            out.push_str(&format!("   PAIRS: {species} EXCLUDED:\n"));
        } else {
            out.push_str(&format!(
                "   PAIRS: {species} UNIQUE: {} TOTAL: {}\n",
                block.unique_params, block.expansion_total
            ));
            out.push_str(
                "     index  |  powers  |  equiv index  |  param index  |       parameter       \n",
            );
            out.push_str(
                "   ----------------------------------------------------------------------------\n",
            );
            for row in &block.rows {
                out.push_str(&format!("{} {}\n", row.line, row.value));
            }
        }
        out.push('\n');
    }
    out
}
