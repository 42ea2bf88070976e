//! Whitespace-delimited numeric input loaders.
//!
//! Design goals:
//! - **Fail fast with located errors**: every parse failure names the file
//!   and 1-based line, every dimension check runs before any solve
//! - **Mode-aware loading**: split-file, read-output, and active-learning
//!   runs never materialize the design matrix locally
//! - **Separation of concerns**: no solving logic here

use std::fs;
use std::path::Path;

use nalgebra::{DMatrix, DVector};

use crate::domain::{Algorithm, LoadedSystem, RunConfig};
use crate::error::AppError;

/// Per-chunk dimension file written alongside a pre-partitioned matrix.
pub const SPLIT_DIMENSION_FILE: &str = "dim.0000.txt";

/// Load a whitespace-delimited matrix, one equation per row.
///
/// Blank lines are skipped; every remaining row must have the same width.
pub fn load_matrix(path: &Path) -> Result<DMatrix<f64>, AppError> {
    let text = fs::read_to_string(path).map_err(|e| AppError::io("failed to read", path, e))?;

    let mut values = Vec::new();
    let mut ncols: Option<usize> = None;
    let mut nrows = 0usize;
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut row_len = 0usize;
        for token in line.split_whitespace() {
            values.push(parse_value(token, path, idx + 1)?);
            row_len += 1;
        }
        match ncols {
            None => ncols = Some(row_len),
            Some(expected) if expected != row_len => {
                return Err(AppError::DimensionMismatch {
                    context: format!("row width at '{}' line {}", path.display(), idx + 1),
                    expected,
                    found: row_len,
                });
            }
            Some(_) => {}
        }
        nrows += 1;
    }

    let Some(ncols) = ncols else {
        return Err(AppError::InputParse {
            path: path.into(),
            line: 1,
            message: "no numeric rows found".to_string(),
        });
    };
    Ok(DMatrix::from_row_iterator(nrows, ncols, values))
}

/// Load a numeric vector, one value per line.
pub fn load_vector(path: &Path) -> Result<DVector<f64>, AppError> {
    let text = fs::read_to_string(path).map_err(|e| AppError::io("failed to read", path, e))?;

    let mut values = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        for token in line.split_whitespace() {
            values.push(parse_value(token, path, idx + 1)?);
        }
    }
    if values.is_empty() {
        return Err(AppError::InputParse {
            path: path.into(),
            line: 1,
            message: "no numeric values found".to_string(),
        });
    }
    Ok(DVector::from_vec(values))
}

/// Load the per-equation weight file: one positive value per line, exactly
/// one entry per equation.
pub fn load_weights(path: &Path, equation_count: usize) -> Result<DVector<f64>, AppError> {
    let text = fs::read_to_string(path).map_err(|e| AppError::io("failed to read", path, e))?;

    let mut values = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        for token in line.split_whitespace() {
            let value = parse_value(token, path, idx + 1)?;
            if !(value.is_finite() && value > 0.0) {
                return Err(AppError::InputParse {
                    path: path.into(),
                    line: idx + 1,
                    message: format!("weights must be positive and finite, found {value}"),
                });
            }
            values.push(value);
        }
    }
    if values.len() != equation_count {
        return Err(AppError::DimensionMismatch {
            context: format!("weight file '{}' vs equations", path.display()),
            expected: equation_count,
            found: values.len(),
        });
    }
    Ok(DVector::from_vec(values))
}

/// Dimensions of a pre-partitioned matrix, read from the first line of the
/// local dimension file: variable count, first row, last row, equation count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitDimensions {
    pub var_count: usize,
    pub row_start: usize,
    pub row_end: usize,
    pub equation_count: usize,
}

pub fn load_split_dimensions(path: &Path) -> Result<SplitDimensions, AppError> {
    let text = fs::read_to_string(path).map_err(|e| AppError::io("failed to read", path, e))?;
    let line = text
        .lines()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| AppError::InputParse {
            path: path.into(),
            line: 1,
            message: "dimension file is empty".to_string(),
        })?;

    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 4 {
        return Err(AppError::InputParse {
            path: path.into(),
            line: 1,
            message: format!("expected 4 dimension fields, found {}", fields.len()),
        });
    }
    let parse = |token: &str| -> Result<usize, AppError> {
        token.parse().map_err(|_| AppError::InputParse {
            path: path.into(),
            line: 1,
            message: format!("invalid dimension '{token}'"),
        })
    };
    Ok(SplitDimensions {
        var_count: parse(fields[0])?,
        row_start: parse(fields[1])?,
        row_end: parse(fields[2])?,
        equation_count: parse(fields[3])?,
    })
}

/// Load the inputs this run actually needs.
///
/// The design matrix is read only when the algorithm solves in-process on
/// non-partitioned inputs; distributed and resume modes work from the target
/// vector plus, for split files, the dimension file.
pub fn load_system(config: &RunConfig) -> Result<LoadedSystem, AppError> {
    let skip_matrix =
        (config.active_learning || config.algorithm == Algorithm::Dlasso) && !config.split_files;

    if skip_matrix {
        let target = load_vector(&config.target_path)?;
        return Ok(LoadedSystem {
            matrix: None,
            var_count: None,
            equation_count: target.len(),
            target,
        });
    }

    if !config.split_files && !config.read_output {
        let matrix = load_matrix(&config.matrix_path)?;
        let target = load_vector(&config.target_path)?;
        if matrix.nrows() != target.len() {
            return Err(AppError::DimensionMismatch {
                context: format!(
                    "'{}' rows vs '{}' entries",
                    config.matrix_path.display(),
                    config.target_path.display()
                ),
                expected: matrix.nrows(),
                found: target.len(),
            });
        }
        if matrix.ncols() > matrix.nrows() {
            log::warn!(
                "more fit variables ({}) than equations ({}): the system is underdetermined",
                matrix.ncols(),
                matrix.nrows()
            );
        }
        return Ok(LoadedSystem {
            var_count: Some(matrix.ncols()),
            equation_count: matrix.nrows(),
            matrix: Some(matrix),
            target,
        });
    }

    if !config.read_output {
        // Split files: the matrix stays on disk for the external solver.
        let dims = load_split_dimensions(Path::new(SPLIT_DIMENSION_FILE))?;
        let target = load_vector(&config.target_path)?;
        return Ok(LoadedSystem {
            matrix: None,
            var_count: Some(dims.var_count),
            equation_count: dims.equation_count,
            target,
        });
    }

    // Resuming from a prior external run: only the observed targets are
    // needed for diagnostics.
    let target = load_vector(&config.target_path)?;
    Ok(LoadedSystem {
        matrix: None,
        var_count: None,
        equation_count: target.len(),
        target,
    })
}

fn parse_value(token: &str, path: &Path, line: usize) -> Result<f64, AppError> {
    let value: f64 = token.parse().map_err(|_| AppError::InputParse {
        path: path.into(),
        line,
        message: format!("invalid number '{token}'"),
    })?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        write!(file, "{content}").unwrap();
        path
    }

    #[test]
    fn loads_matrix_with_consistent_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "A.txt", "1.0 2.0\n3.0 4.0\n\n5.0 6.0\n");

        let matrix = load_matrix(&path).unwrap();
        assert_eq!(matrix.nrows(), 3);
        assert_eq!(matrix.ncols(), 2);
        assert_eq!(matrix[(2, 1)], 6.0);
    }

    #[test]
    fn ragged_matrix_rows_are_a_dimension_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "A.txt", "1.0 2.0\n3.0\n");

        let err = load_matrix(&path).unwrap_err();
        match err {
            AppError::DimensionMismatch {
                expected, found, ..
            } => {
                assert_eq!(expected, 2);
                assert_eq!(found, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn bad_number_reports_file_and_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "b.txt", "1.0\noops\n");

        let err = load_vector(&path).unwrap_err();
        match err {
            AppError::InputParse { line, message, .. } => {
                assert_eq!(line, 2);
                assert!(message.contains("oops"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn weights_must_be_positive() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "w.txt", "1.0\n-2.0\n");

        let err = load_weights(&path, 2).unwrap_err();
        assert!(matches!(err, AppError::InputParse { line: 2, .. }));
    }

    #[test]
    fn weights_length_is_checked_against_equations() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "w.txt", "1.0\n2.0\n");

        let err = load_weights(&path, 3).unwrap_err();
        assert!(matches!(
            err,
            AppError::DimensionMismatch {
                expected: 3,
                found: 2,
                ..
            }
        ));
    }

    #[test]
    fn split_dimensions_come_from_the_first_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "dim.0000.txt", "12 0 499 2000\n");

        let dims = load_split_dimensions(&path).unwrap();
        assert_eq!(
            dims,
            SplitDimensions {
                var_count: 12,
                row_start: 0,
                row_end: 499,
                equation_count: 2000,
            }
        );
    }

    #[test]
    fn system_load_rejects_row_count_mismatch_before_solving() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_file(dir.path(), "A.txt", "1.0\n2.0\n3.0\n");
        let b = write_file(dir.path(), "b.txt", "1.0\n2.0\n");

        let config = RunConfig {
            matrix_path: a,
            target_path: b,
            header_path: dir.path().join("params.header"),
            map_path: dir.path().join("ff_groups.map"),
            weights_path: None,
            predictions_path: dir.path().join("force.txt"),
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
        };
        let err = load_system(&config).unwrap_err();
        assert!(matches!(
            err,
            AppError::DimensionMismatch {
                expected: 3,
                found: 2,
                ..
            }
        ));
    }
}
