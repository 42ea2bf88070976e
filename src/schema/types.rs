//! Typed representation of the interaction topology described by the header.

use crate::error::AppError;

/// A distinct 2-body interaction class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairType {
    pub index: usize,
    pub species_a: String,
    pub species_b: String,
}

/// One symmetry-expansion detail row of a triplet/quadruplet block.
///
/// The header encodes, per expansion row, which unique-parameter slot the
/// row maps to; that indirection is preserved verbatim. The raw line is kept
/// because the report echoes it with the resolved value appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionRow {
    pub text: String,
    pub param_index: usize,
}

/// Which body order a cluster block describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterKind {
    Triplet,
    Quadruplet,
}

impl ClusterKind {
    /// Literal marker token anchoring this block in the header.
    pub fn marker(self) -> &'static str {
        match self {
            ClusterKind::Triplet => "TRIPLETS:",
            ClusterKind::Quadruplet => "QUADRUPLETS:",
        }
    }

    /// Number of species-pair names on the metadata line.
    pub fn species_count(self) -> usize {
        match self {
            ClusterKind::Triplet => 3,
            ClusterKind::Quadruplet => 6,
        }
    }

    /// Field index of the unique-parameter slot on a detail line.
    pub fn param_index_field(self) -> usize {
        // Layout: row index, one power per species pair, equivalence index,
        // parameter index.
        self.species_count() + 2
    }

    /// Section title used in the report.
    pub fn section_label(self) -> &'static str {
        match self {
            ClusterKind::Triplet => "TRIPLET",
            ClusterKind::Quadruplet => "QUADRUPLET",
        }
    }

    /// Type-header label used in the report.
    pub fn type_label(self) -> &'static str {
        match self {
            ClusterKind::Triplet => "TRIPLETTYPE",
            ClusterKind::Quadruplet => "QUADRUPLETYPE",
        }
    }
}

/// A 3-body or 4-body interaction class.
///
/// Excluded types occupy a block in the header but contribute no parameters
/// and no offset-table entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterType {
    /// The echoed type-header line (species listing), trailing whitespace
    /// trimmed.
    pub header: String,
    /// Species-pair names from the metadata line (3 for triplets, 6 for
    /// quadruplets).
    pub species: Vec<String>,
    pub excluded: bool,
    /// Independent coefficients for this type; 0 when excluded.
    pub unique_params: usize,
    /// Symmetry-equivalent detail rows; 0 when excluded.
    pub expansion_total: usize,
    pub rows: Vec<ExpansionRow>,
}

/// Index arithmetic for the flat coefficient vector, built once by the
/// parser and consumed read-only by the decoder.
///
/// Vector layout: all 2-body blocks (one contiguous block per pair type),
/// then triplet unique parameters (non-excluded types in schema order),
/// then quadruplet unique parameters, then one Coulomb coefficient per pair
/// type when enabled, then optional trailing energy offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetTable {
    pub pair_count: usize,
    pub coeffs_per_pair: usize,
    /// Per triplet type: base offset within the 3-body region, `None` when
    /// excluded.
    pub triplet_bases: Vec<Option<usize>>,
    pub triplet_total: usize,
    /// Per quadruplet type: base offset within the 4-body region.
    pub quadruplet_bases: Vec<Option<usize>>,
    pub quadruplet_total: usize,
    /// Pair count when Coulomb fitting is enabled, otherwise 0.
    pub coulomb_count: usize,
    pub energy_offset_count: usize,
}

impl OffsetTable {
    /// Size of the 2-body region.
    pub fn two_body_total(&self) -> usize {
        self.pair_count * self.coeffs_per_pair
    }

    /// Absolute index of a 2-body coefficient.
    pub fn pair_param(&self, pair: usize, coeff: usize) -> usize {
        pair * self.coeffs_per_pair + coeff
    }

    /// Absolute index for a triplet detail row's unique-parameter slot.
    /// `None` for excluded types.
    pub fn triplet_param(&self, type_index: usize, param_index: usize) -> Option<usize> {
        self.triplet_bases[type_index].map(|base| self.two_body_total() + base + param_index)
    }

    /// Absolute index for a quadruplet detail row's unique-parameter slot.
    pub fn quadruplet_param(&self, type_index: usize, param_index: usize) -> Option<usize> {
        self.quadruplet_bases[type_index]
            .map(|base| self.two_body_total() + self.triplet_total + base + param_index)
    }

    /// Absolute index of a pair's product-charge coefficient in the Coulomb
    /// tail region.
    pub fn coulomb_param(&self, pair: usize) -> usize {
        self.two_body_total() + self.triplet_total + self.quadruplet_total + pair
    }

    /// Total structural parameter count (everything except energy offsets).
    pub fn total_params(&self) -> usize {
        self.two_body_total() + self.triplet_total + self.quadruplet_total + self.coulomb_count
    }

    /// Check the solution length against the schema.
    ///
    /// Returns the number of trailing energy offsets actually present in the
    /// solution (0 or `energy_offset_count`); any other relation is fatal.
    pub fn check_solution_len(&self, solution_len: usize) -> Result<usize, AppError> {
        let total = self.total_params();
        if solution_len == total {
            Ok(0)
        } else if solution_len == total + self.energy_offset_count {
            Ok(self.energy_offset_count)
        } else {
            Err(AppError::ParameterCountMismatch {
                solution_len,
                total_params: total,
                pair_types: self.pair_count,
                coeffs_per_pair: self.coeffs_per_pair,
                triplet_params: self.triplet_total,
                quadruplet_params: self.quadruplet_total,
                coulomb_params: self.coulomb_count,
                energy_offsets: self.energy_offset_count,
            })
        }
    }
}

/// Fully parsed interaction topology.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionSchema {
    /// Polynomial family name from the potential-kind line.
    pub potential_family: String,
    /// Per-pair 2-body coefficient count.
    pub coeffs_per_pair: usize,
    pub coulomb_enabled: bool,
    pub atom_type_count: usize,
    /// One energy offset per atom type.
    pub energy_offset_count: usize,
    pub pair_types: Vec<PairType>,
    pub triplet_types: Vec<ClusterType>,
    pub quadruplet_types: Vec<ClusterType>,
    pub offsets: OffsetTable,
    /// Header lines echoed at the top of the report.
    pub echo_lines: Vec<String>,
}
