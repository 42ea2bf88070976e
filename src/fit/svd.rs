//! Regularized least squares via singular value decomposition.
//!
//! Following the usual prescription, singular values below a fraction of the
//! largest one are treated as numerically zero: with `A = U·D·Vᵗ` and
//! cutoff `τ = eps·max|Dᵢ|`, the pseudo-inverse keeps `1/Dᵢ` only where
//! `|Dᵢ| > τ` (a value exactly at the cutoff is dropped). The number of
//! retained singular values is reported as the active-variable count.

use nalgebra::{DMatrix, DVector};

use crate::error::AppError;

/// Iteration budget for the SVD; exceeding it is a factorization failure.
const MAX_SVD_ITERATIONS: usize = 1000;

#[derive(Debug, Clone)]
pub struct SvdSolution {
    pub x: DVector<f64>,
    /// Count of singular values above the cutoff.
    pub active_vars: usize,
    /// The effective cutoff `eps * dmax`.
    pub cutoff: f64,
}

/// Solve `A x ≈ b` with a singular-value cutoff at `eps * dmax`.
pub fn solve_svd(
    matrix: &DMatrix<f64>,
    target: &DVector<f64>,
    eps: f64,
) -> Result<SvdSolution, AppError> {
    if target.len() != matrix.nrows() {
        return Err(AppError::DimensionMismatch {
            context: "target vector vs design matrix rows".to_string(),
            expected: matrix.nrows(),
            found: target.len(),
        });
    }

    let svd = matrix
        .clone()
        .try_svd(true, true, f64::EPSILON, MAX_SVD_ITERATIONS)
        .ok_or_else(|| {
            AppError::LinearAlgebra(format!(
                "SVD of the {}x{} design matrix did not converge",
                matrix.nrows(),
                matrix.ncols()
            ))
        })?;
    let u = svd
        .u
        .ok_or_else(|| AppError::LinearAlgebra("SVD did not produce U".to_string()))?;
    let v_t = svd
        .v_t
        .ok_or_else(|| AppError::LinearAlgebra("SVD did not produce Vᵗ".to_string()))?;
    let singular_values = svd.singular_values;

    let dmax = singular_values
        .iter()
        .fold(0.0_f64, |acc, &d| acc.max(d.abs()));
    let cutoff = eps * dmax;

    // x = V · D⁺ · Uᵗ · b, applied vector-by-vector.
    let mut projected = u.transpose() * target;
    let mut active_vars = 0usize;
    for i in 0..singular_values.len() {
        if singular_values[i].abs() > cutoff {
            projected[i] /= singular_values[i];
            active_vars += 1;
        } else {
            projected[i] = 0.0;
        }
    }
    let x = v_t.transpose() * projected;

    Ok(SvdSolution {
        x,
        active_vars,
        cutoff,
    })
}
