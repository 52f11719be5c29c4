//! Ordinary least squares regression
//!
//! Solves the normal equations with a Cholesky factorization; near-singular
//! Gram matrices get a small ridge added to the diagonal, and a Gauss-Jordan
//! inverse is the last resort. Data is centered so the intercept falls out of
//! the column means.

use crate::error::{CoolsenseError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Linear regression fitted via normal equations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    coefficients: Option<Array1<f64>>,
    intercept: f64,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: 0.0,
        }
    }

    /// Fit on centered data: (Xᵀ X) w = Xᵀ y, intercept = ȳ − w·x̄.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(CoolsenseError::ShapeError {
                expected: format!("{} targets", n_samples),
                actual: format!("{} targets", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(CoolsenseError::ValidationError(
                "cannot fit linear regression on an empty matrix".to_string(),
            ));
        }

        let x_mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| CoolsenseError::ValidationError("empty feature matrix".to_string()))?;
        let y_mean = y.sum() / n_samples as f64;

        let x_centered = x - &x_mean.clone().insert_axis(Axis(0));
        let y_centered = y - y_mean;

        let gram = x_centered.t().dot(&x_centered);
        let moment = x_centered.t().dot(&y_centered);

        let coefficients = solve_spd(&gram, &moment)
            .or_else(|| gauss_jordan_inverse(&gram).map(|inv| inv.dot(&moment)))
            .ok_or_else(|| {
                CoolsenseError::ValidationError(
                    "singular feature matrix, cannot solve least squares".to_string(),
                )
            })?;

        self.intercept = y_mean - coefficients.dot(&x_mean);
        self.coefficients = Some(coefficients);
        Ok(())
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self
            .coefficients
            .as_ref()
            .ok_or(CoolsenseError::ModelNotFitted)?;
        Ok(x.dot(coefficients) + self.intercept)
    }

    /// Fitted weights per feature, in training column order.
    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.coefficients.as_ref()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

/// Cholesky solve for a symmetric positive-definite system. If the matrix is
/// not positive definite, retries once with a scale-relative ridge on the
/// diagonal before giving up.
fn solve_spd(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    match try_cholesky(a) {
        Some(l) => Some(back_substitute(&l, b)),
        None => {
            let n = a.nrows();
            let ridge = 1e-8 * a.diag().iter().map(|v| v.abs()).sum::<f64>() / n as f64;
            let mut regularized = a.clone();
            for i in 0..n {
                regularized[[i, i]] += ridge;
            }
            try_cholesky(&regularized).map(|l| back_substitute(&l, b))
        }
    }
}

/// Lower-triangular factor L with A = L·Lᵀ, or None if A is not PD.
fn try_cholesky(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    let mut l: Array2<f64> = Array2::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let dot: f64 = (0..j).map(|k| l[[i, k]] * l[[j, k]]).sum();
            if i == j {
                let diag = a[[i, i]] - dot;
                if diag <= 0.0 {
                    return None;
                }
                l[[i, i]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - dot) / l[[j, j]];
            }
        }
    }
    Some(l)
}

/// Solve L·Lᵀ·x = b by forward then backward substitution.
fn back_substitute(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = b.len();

    let mut y = Array1::zeros(n);
    for i in 0..n {
        let partial: f64 = (0..i).map(|j| l[[i, j]] * y[j]).sum();
        y[i] = (b[i] - partial) / l[[i, i]];
    }

    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let partial: f64 = ((i + 1)..n).map(|j| l[[j, i]] * x[j]).sum();
        x[i] = (y[i] - partial) / l[[i, i]];
    }
    x
}

/// Gauss-Jordan inverse with partial pivoting; fallback for matrices the
/// Cholesky path rejects.
fn gauss_jordan_inverse(m: &Array2<f64>) -> Option<Array2<f64>> {
    let n = m.nrows();
    if n != m.ncols() {
        return None;
    }

    let mut aug = Array2::zeros((n, 2 * n));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = m[[i, j]];
        }
        aug[[i, n + i]] = 1.0;
    }

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&a, &b| {
                aug[[a, col]]
                    .abs()
                    .partial_cmp(&aug[[b, col]].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(col);

        if aug[[pivot_row, col]].abs() < 1e-10 {
            return None;
        }
        if pivot_row != col {
            for j in 0..2 * n {
                aug.swap([col, j], [pivot_row, j]);
            }
        }

        let pivot = aug[[col, col]];
        for j in 0..2 * n {
            aug[[col, j]] /= pivot;
        }
        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = aug[[row, col]];
            for j in 0..2 * n {
                aug[[row, j]] -= factor * aug[[col, j]];
            }
        }
    }

    let mut inv = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..n {
            inv[[i, j]] = aug[[i, n + j]];
        }
    }
    Some(inv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_recovers_linear_relationship() {
        // y = 2*x1 + 0.5*x2 + 1
        let x = array![
            [1.0, 2.0],
            [2.0, 1.0],
            [3.0, 4.0],
            [4.0, 3.0],
            [5.0, 6.0],
            [6.0, 5.0],
        ];
        let y: Array1<f64> = x.rows().into_iter().map(|r| 2.0 * r[0] + 0.5 * r[1] + 1.0).collect();

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();

        let coefs = model.coefficients().unwrap();
        assert!((coefs[0] - 2.0).abs() < 1e-6);
        assert!((coefs[1] - 0.5).abs() < 1e-6);
        assert!((model.intercept() - 1.0).abs() < 1e-6);

        let preds = model.predict(&x).unwrap();
        for (p, t) in preds.iter().zip(y.iter()) {
            assert!((p - t).abs() < 1e-6);
        }
    }

    #[test]
    fn test_predict_before_fit_errors() {
        let model = LinearRegression::new();
        let err = model.predict(&array![[1.0, 2.0]]).unwrap_err();
        assert!(matches!(err, CoolsenseError::ModelNotFitted));
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let mut model = LinearRegression::new();
        let x = array![[1.0], [2.0]];
        let y = array![1.0, 2.0, 3.0];
        assert!(model.fit(&x, &y).is_err());
    }

    #[test]
    fn test_collinear_columns_still_solve() {
        // Second column is an exact copy of the first; the ridge retry or the
        // Gauss-Jordan fallback must produce some solution.
        let x = array![
            [1.0, 1.0],
            [2.0, 2.0],
            [3.0, 3.0],
            [4.0, 4.0],
        ];
        let y = array![2.0, 4.0, 6.0, 8.0];
        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();
        let preds = model.predict(&x).unwrap();
        for (p, t) in preds.iter().zip(y.iter()) {
            assert!((p - t).abs() < 1e-3);
        }
    }
}
