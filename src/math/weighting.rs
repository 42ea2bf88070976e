//! Per-equation weighting of the linear system.
//!
//! Row `i` of both the design matrix and the target vector is scaled by
//! `w[i]`. The inputs are never mutated: the unweighted matrix is still
//! needed afterwards to compute predictions against the original system.

use nalgebra::{DMatrix, DVector};

use crate::error::AppError;

/// A weighted copy of the linear system.
#[derive(Debug, Clone)]
pub struct WeightedSystem {
    pub matrix: DMatrix<f64>,
    pub target: DVector<f64>,
}

/// Scale each equation of `(matrix, target)` by its weight.
///
/// Fails with a dimension mismatch unless the weight vector has exactly one
/// entry per equation.
pub fn apply_weights(
    matrix: &DMatrix<f64>,
    target: &DVector<f64>,
    weights: &DVector<f64>,
) -> Result<WeightedSystem, AppError> {
    if weights.len() != matrix.nrows() {
        return Err(AppError::DimensionMismatch {
            context: "weight vector vs design matrix rows".to_string(),
            expected: matrix.nrows(),
            found: weights.len(),
        });
    }
    if target.len() != matrix.nrows() {
        return Err(AppError::DimensionMismatch {
            context: "target vector vs design matrix rows".to_string(),
            expected: matrix.nrows(),
            found: target.len(),
        });
    }

    let mut weighted_matrix = matrix.clone();
    let mut weighted_target = target.clone();
    for i in 0..matrix.nrows() {
        let w = weights[i];
        for j in 0..matrix.ncols() {
            weighted_matrix[(i, j)] *= w;
        }
        weighted_target[i] *= w;
    }

    Ok(WeightedSystem {
        matrix: weighted_matrix,
        target: weighted_target,
    })
}
