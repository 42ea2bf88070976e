//! Header parsing: fixed anchors plus marker-located cluster blocks.
//!
//! The header places the Coulomb flag, potential kind, and atom-type count
//! at fixed line positions; the pair-count line position is derived from the
//! atom-type count; triplet and quadruplet blocks are located by literal
//! marker tokens. Parsing is a single linear scan — the same block geometry
//! drives both the offset accumulation and the detail rows kept for the
//! decoder, so the two can never disagree.

use crate::error::AppError;
use crate::schema::scan::HeaderScanner;
use crate::schema::types::{
    ClusterKind, ClusterType, ExpansionRow, InteractionSchema, OffsetTable, PairType,
};

/// 0-based anchor positions in the header.
pub const COULOMB_LINE: usize = 1;
pub const POTENTIAL_LINE: usize = 5;
pub const ATOM_TYPES_LINE: usize = 7;

/// The polynomial family whose kind line carries per-pair coefficient counts.
const CHEBYSHEV_FAMILY: &str = "CHEBYSHEV";

const EXCLUDED_MARKER: &str = "EXCLUDED:";
const TOTAL_LABEL: &str = "TOTAL:";

/// Parse the header text into a typed interaction schema.
pub fn parse_header(text: &str) -> Result<InteractionSchema, AppError> {
    let scanner = HeaderScanner::new(text);

    let coulomb_enabled = parse_flag(&scanner, COULOMB_LINE, 1, "Coulomb fit flag")?;

    let potential_family = scanner
        .field(POTENTIAL_LINE, 1, "potential family")?
        .to_string();
    // Only the polynomial family carries the per-pair coefficient count on
    // its kind line. The trailing body-order fields are accepted but unused:
    // 3-body and 4-body totals come from the marker blocks alone.
    let coeffs_per_pair = if potential_family == CHEBYSHEV_FAMILY {
        scanner.numeric_field::<usize>(POTENTIAL_LINE, 2, "2-body coefficient count")?
    } else {
        0
    };

    let atom_type_count: usize = scanner.numeric_field(ATOM_TYPES_LINE, 2, "atom type count")?;
    // One trailing energy offset per atom type, when energies are in the fit.
    let energy_offset_count = atom_type_count;

    let pair_count_line = ATOM_TYPES_LINE + 2 + atom_type_count + 2;
    let pair_count: usize = scanner.numeric_field(pair_count_line, 2, "pair type count")?;

    let mut pair_types = Vec::with_capacity(pair_count);
    for i in 0..pair_count {
        let line = pair_count_line + 3 + i;
        pair_types.push(PairType {
            index: i,
            species_a: scanner.field(line, 1, "first pair species")?.to_string(),
            species_b: scanner.field(line, 2, "second pair species")?.to_string(),
        });
    }

    // Cluster blocks are optional. Quadruplets are only searched for past
    // the triplet anchor, matching the layout the header writer produces.
    let triplet_anchor = scanner.find_marker(ClusterKind::Triplet.marker(), 0);
    let quadruplet_anchor =
        triplet_anchor.and_then(|at| scanner.find_marker(ClusterKind::Quadruplet.marker(), at));

    let triplet_types = match triplet_anchor {
        Some(anchor) => parse_cluster_blocks(&scanner, anchor, ClusterKind::Triplet)?,
        None => Vec::new(),
    };
    let quadruplet_types = match quadruplet_anchor {
        Some(anchor) => parse_cluster_blocks(&scanner, anchor, ClusterKind::Quadruplet)?,
        None => Vec::new(),
    };

    let offsets = build_offsets(
        pair_count,
        coeffs_per_pair,
        &triplet_types,
        &quadruplet_types,
        coulomb_enabled,
        energy_offset_count,
    );
    let echo_lines = echo_lines(&scanner, triplet_anchor, quadruplet_anchor);

    Ok(InteractionSchema {
        potential_family,
        coeffs_per_pair,
        coulomb_enabled,
        atom_type_count,
        energy_offset_count,
        pair_types,
        triplet_types,
        quadruplet_types,
        offsets,
        echo_lines,
    })
}

fn parse_flag(
    scanner: &HeaderScanner,
    line: usize,
    field: usize,
    what: &str,
) -> Result<bool, AppError> {
    match scanner.field(line, field, what)? {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(AppError::SchemaParse {
            line: line + 1,
            message: format!("expected 'true' or 'false' for {what}, found '{other}'"),
        }),
    }
}

/// Walk the cluster blocks under a marker line.
///
/// Block geometry, relative to each type's header line: metadata on the next
/// line; excluded types span 3 lines (header, metadata, blank); non-excluded
/// types span `5 + total` lines (header, metadata, two caption lines, the
/// detail rows, blank).
fn parse_cluster_blocks(
    scanner: &HeaderScanner,
    anchor: usize,
    kind: ClusterKind,
) -> Result<Vec<ClusterType>, AppError> {
    let count: usize = scanner.numeric_field(anchor, 3, "cluster type count")?;
    let species_count = kind.species_count();
    let status_field = species_count + 1;

    let mut types = Vec::with_capacity(count);
    let mut cursor = anchor + 2;

    for _ in 0..count {
        let header = scanner.line(cursor)?.trim_end().to_string();
        let meta = cursor + 1;

        let mut species = Vec::with_capacity(species_count);
        for s in 0..species_count {
            species.push(scanner.field(meta, 1 + s, "species pair name")?.to_string());
        }

        let status = scanner.field(meta, status_field, "unique count or exclusion marker")?;
        if status == EXCLUDED_MARKER {
            types.push(ClusterType {
                header,
                species,
                excluded: true,
                unique_params: 0,
                expansion_total: 0,
                rows: Vec::new(),
            });
            cursor += 3;
            continue;
        }

        let unique_params: usize = status.parse().map_err(|_| AppError::SchemaParse {
            line: meta + 1,
            message: format!(
                "expected a unique parameter count or '{EXCLUDED_MARKER}', found '{status}'"
            ),
        })?;
        let total_label = scanner.field(meta, status_field + 1, "TOTAL: label")?;
        if total_label != TOTAL_LABEL {
            return Err(AppError::SchemaParse {
                line: meta + 1,
                message: format!("expected '{TOTAL_LABEL}' after the unique count, found '{total_label}'"),
            });
        }
        let expansion_total: usize =
            scanner.numeric_field(meta, status_field + 2, "total expansion count")?;

        let mut rows = Vec::with_capacity(expansion_total);
        for r in 0..expansion_total {
            let line_idx = cursor + 4 + r;
            let text = scanner.line(line_idx)?.trim_end().to_string();
            let param_index: usize =
                scanner.numeric_field(line_idx, kind.param_index_field(), "parameter index")?;
            if param_index >= unique_params {
                return Err(AppError::SchemaParse {
                    line: line_idx + 1,
                    message: format!(
                        "parameter index {param_index} out of range: this type has only \
                         {unique_params} unique parameters"
                    ),
                });
            }
            rows.push(ExpansionRow { text, param_index });
        }

        types.push(ClusterType {
            header,
            species,
            excluded: false,
            unique_params,
            expansion_total,
            rows,
        });
        cursor += 5 + expansion_total;
    }

    Ok(types)
}

/// Accumulate per-type base offsets; excluded types contribute zero.
fn build_offsets(
    pair_count: usize,
    coeffs_per_pair: usize,
    triplet_types: &[ClusterType],
    quadruplet_types: &[ClusterType],
    coulomb_enabled: bool,
    energy_offset_count: usize,
) -> OffsetTable {
    let mut triplet_bases = Vec::with_capacity(triplet_types.len());
    let mut triplet_total = 0usize;
    for t in triplet_types {
        if t.excluded {
            triplet_bases.push(None);
        } else {
            triplet_bases.push(Some(triplet_total));
            triplet_total += t.unique_params;
        }
    }

    let mut quadruplet_bases = Vec::with_capacity(quadruplet_types.len());
    let mut quadruplet_total = 0usize;
    for q in quadruplet_types {
        if q.excluded {
            quadruplet_bases.push(None);
        } else {
            quadruplet_bases.push(Some(quadruplet_total));
            quadruplet_total += q.unique_params;
        }
    }

    OffsetTable {
        pair_count,
        coeffs_per_pair,
        triplet_bases,
        triplet_total,
        quadruplet_bases,
        quadruplet_total,
        coulomb_count: if coulomb_enabled { pair_count } else { 0 },
        energy_offset_count,
    }
}

/// Header lines echoed at the top of the report: everything through the
/// triplet anchor plus the quadruplet anchor line, or the entire header when
/// the markers are absent.
fn echo_lines(
    scanner: &HeaderScanner,
    triplet_anchor: Option<usize>,
    quadruplet_anchor: Option<usize>,
) -> Vec<String> {
    match (triplet_anchor, quadruplet_anchor) {
        (Some(t), Some(q)) => {
            let mut lines: Vec<String> = scanner.raw_lines()[..=t].to_vec();
            lines.push(scanner.raw_lines()[q].clone());
            lines
        }
        _ => scanner.raw_lines().to_vec(),
    }
}

/// A complete header fixture: 2 atom types, 2 pair types with 3
/// coefficients each, Coulomb fitting on, one live + one excluded triplet
/// type, one quadruplet type.
#[cfg(test)]
pub(crate) fn sample_header() -> String {
    [
        "! Parameter file header",                                                         // 0
        "FITCOUL: true",                                                                   // 1
        "FITPOVR: false",                                                                  // 2
        "USE3BCH: true",                                                                   // 3
        "USE4BCH: true",                                                                   // 4
        "PAIRTYP: CHEBYSHEV 3 4 2",                                                        // 5
        "",                                                                                // 6
        "ATOM TYPES: 2",                                                                   // 7
        "",                                                                                // 8
        "# TYPEIDX #   # ATM_TYP #   # ATMCHRG #   # ATMMASS #",                           // 9
        "0             O             0.0           15.999",                                // 10
        "1             H             0.0           1.008",                                 // 11
        "",                                                                                // 12
        "ATOM PAIRS: 2",                                                                   // 13
        "",                                                                                // 14
        "# PAIRIDX #   # ATM_TY1 #   # ATM_TY2 #   # S_MINIM #   # S_MAXIM #",             // 15
        "0             O             O             0.75          6.0",                     // 16
        "1             O             H             0.75          6.0",                     // 17
        "",                                                                                // 18
        "FCUT TYPE: CUBIC",                                                                // 19
        "",                                                                                // 20
        "ATOM PAIR TRIPLETS: 2",                                                           // 21
        "",                                                                                // 22
        "TRIPLETTYPE: 1 ATM1 O ATM2 O ATM3 H",                                             // 23
        "PAIRS: OO OO OH 2 TOTAL: 3",                                                      // 24
        "     index  |  powers  |  equiv index  |  param index  |       parameter",        // 25
        "   -------------------------------------------------------------------",         // 26
        "      0       0  0  1       0       0",                                           // 27
        "      1       0  1  0       0       0",                                           // 28
        "      2       1  1  1       2       1",                                           // 29
        "",                                                                                // 30
        "TRIPLETTYPE: 2 ATM1 H ATM2 H ATM3 H",                                             // 31
        "PAIRS: HH HH HH EXCLUDED:",                                                       // 32
        "",                                                                                // 33
        "ATOM PAIR QUADRUPLETS: 1",                                                        // 34
        "",                                                                                // 35
        "QUADRUPLETYPE: 1 ATM1 O ATM2 O ATM3 H ATM4 H",                                    // 36
        "PAIRS: OO OO OH OO OH HH 2 TOTAL: 2",                                             // 37
        "     index  |  powers  |  equiv index  |  param index  |       parameter",        // 38
        "   -------------------------------------------------------------------",         // 39
        "      0       0 0 0 0 0 1       0       0",                                       // 40
        "      1       0 0 1 0 0 0       1       1",                                       // 41
        "",                                                                                // 42
    ]
    .join("\n")
}

/// A minimal header fixture: 2 atom types, 2 single-coefficient pair types,
/// no Coulomb, no triplets or quadruplets.
#[cfg(test)]
pub(crate) fn minimal_header() -> String {
    [
        "! Parameter file header",
        "FITCOUL: false",
        "FITPOVR: false",
        "USE3BCH: false",
        "USE4BCH: false",
        "PAIRTYP: CHEBYSHEV 1 0 0",
        "",
        "ATOM TYPES: 2",
        "",
        "# TYPEIDX #   # ATM_TYP #",
        "0             A",
        "1             B",
        "",
        "ATOM PAIRS: 2",
        "",
        "# PAIRIDX #   # ATM_TY1 #   # ATM_TY2 #",
        "0             A             A",
        "1             A             B",
        "",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fixed_anchors() {
        let schema = parse_header(&sample_header()).unwrap();
        assert!(schema.coulomb_enabled);
        assert_eq!(schema.potential_family, "CHEBYSHEV");
        assert_eq!(schema.coeffs_per_pair, 3);
        assert_eq!(schema.atom_type_count, 2);
        assert_eq!(schema.energy_offset_count, 2);
        assert_eq!(schema.pair_types.len(), 2);
        assert_eq!(schema.pair_types[0].species_a, "O");
        assert_eq!(schema.pair_types[0].species_b, "O");
        assert_eq!(schema.pair_types[1].species_a, "O");
        assert_eq!(schema.pair_types[1].species_b, "H");
    }

    #[test]
    fn parses_cluster_blocks_with_exclusions() {
        let schema = parse_header(&sample_header()).unwrap();

        assert_eq!(schema.triplet_types.len(), 2);
        let live = &schema.triplet_types[0];
        assert!(!live.excluded);
        assert_eq!(live.species, vec!["OO", "OO", "OH"]);
        assert_eq!(live.unique_params, 2);
        assert_eq!(live.expansion_total, 3);
        let params: Vec<usize> = live.rows.iter().map(|r| r.param_index).collect();
        assert_eq!(params, vec![0, 0, 1]);

        let excluded = &schema.triplet_types[1];
        assert!(excluded.excluded);
        assert_eq!(excluded.unique_params, 0);
        assert!(excluded.rows.is_empty());

        assert_eq!(schema.quadruplet_types.len(), 1);
        let quad = &schema.quadruplet_types[0];
        assert_eq!(quad.species.len(), 6);
        assert_eq!(quad.unique_params, 2);
        assert_eq!(quad.expansion_total, 2);
    }

    #[test]
    fn offsets_skip_excluded_types() {
        let schema = parse_header(&sample_header()).unwrap();
        let offsets = &schema.offsets;
        assert_eq!(offsets.pair_count, 2);
        assert_eq!(offsets.coeffs_per_pair, 3);
        assert_eq!(offsets.triplet_bases, vec![Some(0), None]);
        assert_eq!(offsets.triplet_total, 2);
        assert_eq!(offsets.quadruplet_bases, vec![Some(0)]);
        assert_eq!(offsets.quadruplet_total, 2);
        assert_eq!(offsets.coulomb_count, 2);
        // 2 pairs x 3 coeffs + 2 triplet + 2 quadruplet + 2 Coulomb.
        assert_eq!(offsets.total_params(), 12);
    }

    #[test]
    fn echo_covers_header_through_markers() {
        let schema = parse_header(&sample_header()).unwrap();
        // Lines 0..=21 plus the quadruplet marker line.
        assert_eq!(schema.echo_lines.len(), 23);
        assert_eq!(schema.echo_lines[0], "! Parameter file header");
        assert_eq!(schema.echo_lines[21], "ATOM PAIR TRIPLETS: 2");
        assert_eq!(schema.echo_lines[22], "ATOM PAIR QUADRUPLETS: 1");
    }

    #[test]
    fn minimal_header_has_no_cluster_blocks_and_echoes_everything() {
        let schema = parse_header(&minimal_header()).unwrap();
        assert!(!schema.coulomb_enabled);
        assert_eq!(schema.coeffs_per_pair, 1);
        assert!(schema.triplet_types.is_empty());
        assert!(schema.quadruplet_types.is_empty());
        assert_eq!(schema.offsets.total_params(), 2);
        assert_eq!(
            schema.echo_lines.len(),
            minimal_header().lines().count()
        );
    }

    #[test]
    fn truncated_header_fails_with_line_number() {
        // The Coulomb line parses, then the potential-kind anchor (line 6,
        // 1-based) is past the end of the text.
        let err = parse_header("x\nFITCOUL: true\n").unwrap_err();
        match err {
            AppError::SchemaParse { line, message } => {
                assert_eq!(line, 6);
                assert!(message.contains("ends early"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_numeric_atom_count_is_a_schema_error() {
        let mut lines: Vec<String> = sample_header().lines().map(str::to_string).collect();
        lines[7] = "ATOM TYPES: two".to_string();
        let err = parse_header(&lines.join("\n")).unwrap_err();
        match err {
            AppError::SchemaParse { line, message } => {
                assert_eq!(line, 8);
                assert!(message.contains("two"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn malformed_coulomb_flag_is_a_schema_error() {
        let mut lines: Vec<String> = sample_header().lines().map(str::to_string).collect();
        lines[1] = "FITCOUL: maybe".to_string();
        let err = parse_header(&lines.join("\n")).unwrap_err();
        assert!(err.to_string().contains("maybe"));
    }

    #[test]
    fn out_of_range_parameter_index_is_rejected() {
        let mut lines: Vec<String> = sample_header().lines().map(str::to_string).collect();
        // Type 0 has 2 unique parameters; point a row at slot 5.
        lines[29] = "      2       1  1  1       2       5".to_string();
        let err = parse_header(&lines.join("\n")).unwrap_err();
        match err {
            AppError::SchemaParse { line, message } => {
                assert_eq!(line, 30);
                assert!(message.contains("out of range"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_total_label_is_rejected() {
        let mut lines: Vec<String> = sample_header().lines().map(str::to_string).collect();
        lines[24] = "PAIRS: OO OO OH 2 COUNT: 3".to_string();
        let err = parse_header(&lines.join("\n")).unwrap_err();
        assert!(err.to_string().contains("TOTAL:"));
    }
}
