//! Utility functions for the airbnb-forecast crate

use crate::error::{ForecastError, Result};

/// Solve ordinary least squares `min ||X b - y||` via the normal equations.
///
/// `rows` holds one feature vector per observation. Returns the coefficient
/// vector, or a math error when the system is singular.
pub fn solve_least_squares(rows: &[Vec<f64>], y: &[f64]) -> Result<Vec<f64>> {
    if rows.is_empty() || rows.len() != y.len() {
        return Err(ForecastError::MathError(
            "Least squares requires matching non-empty inputs".to_string(),
        ));
    }
    let k = rows[0].len();
    if k == 0 || rows.iter().any(|r| r.len() != k) {
        return Err(ForecastError::MathError(
            "Least squares feature rows must share a non-zero width".to_string(),
        ));
    }

    // Normal equations: (X^T X) b = X^T y
    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for (row, &target) in rows.iter().zip(y.iter()) {
        for i in 0..k {
            xty[i] += row[i] * target;
            for j in 0..k {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }

    solve_linear_system(&mut xtx, &mut xty)
}

/// Gaussian elimination with partial pivoting
fn solve_linear_system(a: &mut [Vec<f64>], b: &mut [f64]) -> Result<Vec<f64>> {
    let n = b.len();

    for col in 0..n {
        // Pivot on the largest remaining entry in this column
        let pivot = (col..n)
            .max_by(|&i, &j| {
                a[i][col]
                    .abs()
                    .partial_cmp(&a[j][col].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(col);

        if a[pivot][col].abs() < 1e-12 {
            return Err(ForecastError::MathError(
                "Singular system in least squares fit".to_string(),
            ));
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            for j in col..n {
                a[row][j] -= factor * a[col][j];
            }
            b[row] -= factor * b[col];
        }
    }

    // Back substitution
    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let mut sum = b[row];
        for j in (row + 1)..n {
            sum -= a[row][j] * x[j];
        }
        x[row] = sum / a[row][row];
    }

    Ok(x)
}

/// Fit a straight line `y = intercept + slope * t` over t = 0..n
pub fn fit_linear_trend(values: &[f64]) -> Result<(f64, f64)> {
    let rows: Vec<Vec<f64>> = (0..values.len()).map(|t| vec![1.0, t as f64]).collect();
    let coef = solve_least_squares(&rows, values)?;
    Ok((coef[0], coef[1]))
}

/// Standard deviation of residuals, used for interval width
pub fn residual_std_dev(residuals: &[f64]) -> f64 {
    if residuals.is_empty() {
        return 0.0;
    }
    let mean = residuals.iter().sum::<f64>() / residuals.len() as f64;
    let variance = residuals
        .iter()
        .map(|r| (r - mean).powi(2))
        .sum::<f64>()
        / residuals.len() as f64;
    variance.sqrt()
}

/// Z-score for a two-sided confidence level (e.g. 0.95 -> 1.96)
pub fn z_score(confidence_level: f64) -> Result<f64> {
    use statrs::distribution::{ContinuousCDF, Normal};

    if confidence_level <= 0.0 || confidence_level >= 1.0 {
        return Err(ForecastError::ValidationError(
            "Confidence level must be between 0 and 1".to_string(),
        ));
    }
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| ForecastError::MathError(format!("Normal distribution: {}", e)))?;
    Ok(normal.inverse_cdf(0.5 + confidence_level / 2.0))
}
