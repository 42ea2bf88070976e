//! Fit quality diagnostics: RSS, RMS error, and BIC.

use nalgebra::DVector;
use serde::Serialize;

use crate::error::AppError;

/// Coefficients at or below this magnitude are counted as unused.
pub const ACTIVE_THRESHOLD: f64 = 1.0e-5;

/// Summary statistics for a solved system.
#[derive(Debug, Clone, Serialize)]
pub struct FitDiagnostics {
    /// Residual sum of squares.
    pub rss: f64,
    /// Root-mean-square error.
    pub rms: f64,
    /// Bayesian Information Criterion.
    pub bic: f64,
    pub equations: usize,
    pub active_vars: usize,
}

/// Compute diagnostics from predicted and observed targets.
pub fn compute(
    predicted: &DVector<f64>,
    observed: &DVector<f64>,
    active_vars: usize,
) -> Result<FitDiagnostics, AppError> {
    if predicted.len() != observed.len() {
        return Err(AppError::DimensionMismatch {
            context: "predicted vs observed targets".to_string(),
            expected: observed.len(),
            found: predicted.len(),
        });
    }
    let n = observed.len();
    if n == 0 {
        return Err(AppError::DimensionMismatch {
            context: "observed targets".to_string(),
            expected: 1,
            found: 0,
        });
    }

    let rss: f64 = predicted
        .iter()
        .zip(observed.iter())
        .map(|(y, b)| (y - b) * (y - b))
        .sum();
    let rms = (rss / n as f64).sqrt();

    Ok(FitDiagnostics {
        rss,
        rms,
        bic: bic(n, rss, active_vars),
        equations: n,
        active_vars,
    })
}

/// Count coefficients whose magnitude exceeds the active threshold.
pub fn count_active(x: &DVector<f64>) -> usize {
    x.iter().filter(|v| v.abs() > ACTIVE_THRESHOLD).count()
}

/// `BIC = n·ln(rss/n) + k·ln(n)`.
///
/// The mean squared residual is floored at 1e-12 so a perfect fit yields a
/// large negative score instead of negative infinity.
fn bic(n: usize, rss: f64, k: usize) -> f64 {
    let n_f = n as f64;
    let rss_per = (rss / n_f).max(1.0e-12);
    n_f * rss_per.ln() + (k as f64) * n_f.ln()
}
