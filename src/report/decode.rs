//! Decode the coefficient vector into structured interaction parameters.
//!
//! All index arithmetic goes through the schema's offset table; this module
//! never re-derives counts from the header. The parameter count is validated
//! before anything is read, so a schema/solution mismatch can never produce
//! a silently misaligned report.

use nalgebra::DVector;
use serde::Serialize;

use crate::error::AppError;
use crate::schema::{ClusterKind, InteractionSchema};

/// Resolved 2-body parameters for one pair type.
#[derive(Debug, Clone, Serialize)]
pub struct PairBlock {
    pub index: usize,
    pub species_a: String,
    pub species_b: String,
    pub coefficients: Vec<f64>,
    /// Product-charge coefficient when Coulomb fitting is enabled.
    pub charge_product: Option<f64>,
}

/// One expansion detail row with its resolved value.
#[derive(Debug, Clone, Serialize)]
pub struct RowValue {
    pub line: String,
    pub value: f64,
}

/// Resolved parameters for one triplet/quadruplet type.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterBlock {
    pub header: String,
    pub species: Vec<String>,
    pub excluded: bool,
    pub unique_params: usize,
    pub expansion_total: usize,
    pub rows: Vec<RowValue>,
}

/// Structured listing of every resolved parameter, in schema order.
/// Generated once; never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct ParameterReport {
    pub potential_family: String,
    pub pair_blocks: Vec<PairBlock>,
    pub triplet_blocks: Vec<ClusterBlock>,
    pub quadruplet_blocks: Vec<ClusterBlock>,
    /// Trailing per-atom-type constants; empty when energies were not fit.
    pub energy_offsets: Vec<f64>,
}

/// Map the coefficient vector onto the schema.
pub fn decode_parameters(
    x: &DVector<f64>,
    schema: &InteractionSchema,
) -> Result<ParameterReport, AppError> {
    let offsets = &schema.offsets;
    let present_offsets = offsets.check_solution_len(x.len())?;
    let total_params = offsets.total_params();

    let pair_blocks = schema
        .pair_types
        .iter()
        .map(|pair| PairBlock {
            index: pair.index,
            species_a: pair.species_a.clone(),
            species_b: pair.species_b.clone(),
            coefficients: (0..schema.coeffs_per_pair)
                .map(|j| x[offsets.pair_param(pair.index, j)])
                .collect(),
            charge_product: schema
                .coulomb_enabled
                .then(|| x[offsets.coulomb_param(pair.index)]),
        })
        .collect();

    let triplet_blocks = decode_clusters(x, schema, ClusterKind::Triplet);
    let quadruplet_blocks = decode_clusters(x, schema, ClusterKind::Quadruplet);

    let energy_offsets = (0..present_offsets).map(|i| x[total_params + i]).collect();

    Ok(ParameterReport {
        potential_family: schema.potential_family.clone(),
        pair_blocks,
        triplet_blocks,
        quadruplet_blocks,
        energy_offsets,
    })
}

fn decode_clusters(
    x: &DVector<f64>,
    schema: &InteractionSchema,
    kind: ClusterKind,
) -> Vec<ClusterBlock> {
    let types = match kind {
        ClusterKind::Triplet => &schema.triplet_types,
        ClusterKind::Quadruplet => &schema.quadruplet_types,
    };

    types
        .iter()
        .enumerate()
        .map(|(t, cluster)| {
            // Excluded types carry no rows, so the base-offset lookup only
            // happens where the table has an entry.
            let rows = cluster
                .rows
                .iter()
                .filter_map(|row| {
                    let index = match kind {
                        ClusterKind::Triplet => schema.offsets.triplet_param(t, row.param_index),
                        ClusterKind::Quadruplet => {
                            schema.offsets.quadruplet_param(t, row.param_index)
                        }
                    }?;
                    Some(RowValue {
                        line: row.text.clone(),
                        value: x[index],
                    })
                })
                .collect();

            ClusterBlock {
                header: cluster.header.clone(),
                species: cluster.species.clone(),
                excluded: cluster.excluded,
                unique_params: cluster.unique_params,
                expansion_total: cluster.expansion_total,
                rows,
            }
        })
        .collect()
}
