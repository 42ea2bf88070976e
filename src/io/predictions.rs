//! Predicted-force output file.
//!
//! One value per equation, in the fixed `%13.6e` layout downstream tooling
//! expects: width 13, six fractional digits, two-digit signed exponent.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use nalgebra::DVector;

use crate::error::AppError;

/// Write the predicted targets, one per line.
pub fn write_predictions(path: &Path, predicted: &DVector<f64>) -> Result<(), AppError> {
    let mut file =
        File::create(path).map_err(|e| AppError::io("failed to create", path, e))?;
    for value in predicted.iter() {
        writeln!(file, "{}", format_force(*value))
            .map_err(|e| AppError::io("failed to write", path, e))?;
    }
    Ok(())
}

/// Format a value like C's `%13.6e`.
pub fn format_force(value: f64) -> String {
    if !value.is_finite() {
        return format!("{value:>13}");
    }
    let formatted = format!("{value:.6e}");
    let Some((mantissa, exponent)) = formatted.split_once('e') else {
        return format!("{value:>13.6}");
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{:>13}", format!("{mantissa}e{sign}{:02}", exponent.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_c_scientific_layout() {
        assert_eq!(format_force(1.25), " 1.250000e+00");
        assert_eq!(format_force(-0.0005), "-5.000000e-04");
        assert_eq!(format_force(0.0), " 0.000000e+00");
        assert_eq!(format_force(12345.678), " 1.234568e+04");
    }

    #[test]
    fn three_digit_exponents_widen_the_field() {
        assert_eq!(format_force(1.0e100), "1.000000e+100");
    }

    #[test]
    fn writes_one_value_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("force.txt");
        let predicted = DVector::from_row_slice(&[1.0, -2.5]);

        write_predictions(&path, &predicted).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, " 1.000000e+00\n-2.500000e+00\n");
    }
}
