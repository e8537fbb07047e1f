use crate::errors::{BasisHedgeError, Result};

use super::{validate_prediction_rows, validate_training_set, Regressor};

const DEFAULT_RIDGE: f64 = 1e-8;

/// Ordinary least squares with an intercept.
///
/// The default feature set is exactly collinear (`Basis = Spot - Futures`), so
/// the normal equations carry a tiny ridge term scaled to the mean diagonal of
/// the Gram matrix. Well-conditioned fits are not visibly moved by it.
#[derive(Debug, Clone)]
pub struct LinearRegression {
    ridge: f64,
    intercept: f64,
    coefficients: Vec<f64>,
    fitted: bool,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    pub fn new() -> Self {
        Self {
            ridge: DEFAULT_RIDGE,
            intercept: 0.0,
            coefficients: Vec::new(),
            fitted: false,
        }
    }

    /// Relative ridge strength; zero gives plain OLS
    pub fn with_ridge(mut self, ridge: f64) -> Self {
        self.ridge = ridge.max(0.0);
        self
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }
}

impl Regressor for LinearRegression {
    fn name(&self) -> &'static str {
        "linear_regression"
    }

    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<()> {
        let width = validate_training_set(x, y)?;
        let n = x.len() as f64;

        let mut x_mean = vec![0.0; width];
        for row in x {
            for (j, value) in row.iter().enumerate() {
                x_mean[j] += value / n;
            }
        }
        let y_mean = y.iter().sum::<f64>() / n;

        // centred normal equations: (Xc'Xc + λI) β = Xc'yc
        let mut gram = vec![vec![0.0; width]; width];
        let mut rhs = vec![0.0; width];
        for (row, target) in x.iter().zip(y.iter()) {
            let yc = target - y_mean;
            for a in 0..width {
                let xa = row[a] - x_mean[a];
                rhs[a] += xa * yc;
                for b in a..width {
                    gram[a][b] += xa * (row[b] - x_mean[b]);
                }
            }
        }
        for a in 0..width {
            for b in 0..a {
                gram[a][b] = gram[b][a];
            }
        }

        let trace = (0..width).map(|j| gram[j][j]).sum::<f64>();
        let lambda = self.ridge * (trace / width as f64).max(1.0);
        for (j, row) in gram.iter_mut().enumerate() {
            row[j] += lambda;
        }

        let coefficients = solve(gram, rhs)?;
        self.intercept = y_mean
            - coefficients
                .iter()
                .zip(x_mean.iter())
                .map(|(beta, mean)| beta * mean)
                .sum::<f64>();
        self.coefficients = coefficients;
        self.fitted = true;
        Ok(())
    }

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>> {
        if !self.fitted {
            return Err(BasisHedgeError::validation("linear regression is not fitted"));
        }
        validate_prediction_rows(x, self.coefficients.len())?;
        Ok(x.iter()
            .map(|row| {
                self.intercept
                    + row
                        .iter()
                        .zip(self.coefficients.iter())
                        .map(|(value, beta)| value * beta)
                        .sum::<f64>()
            })
            .collect())
    }
}

/// Gaussian elimination with partial pivoting
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| {
                a[i][col]
                    .abs()
                    .partial_cmp(&a[j][col].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(col);
        if a[pivot][col].abs() < 1e-300 || !a[pivot][col].is_finite() {
            return Err(BasisHedgeError::validation(
                "normal equations are singular; features are degenerate",
            ));
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut solution = vec![0.0; n];
    for row in (0..n).rev() {
        let tail = ((row + 1)..n).map(|k| a[row][k] * solution[k]).sum::<f64>();
        solution[row] = (b[row] - tail) / a[row][row];
    }
    Ok(solution)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_known_plane() {
        let x: Vec<Vec<f64>> = (0..20)
            .map(|i| vec![i as f64, ((i * 7) % 5) as f64])
            .collect();
        let y: Vec<f64> = x.iter().map(|r| 1.0 + 2.0 * r[0] - 3.0 * r[1]).collect();

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();

        assert!((model.intercept() - 1.0).abs() < 1e-4);
        assert!((model.coefficients()[0] - 2.0).abs() < 1e-4);
        assert!((model.coefficients()[1] + 3.0).abs() < 1e-4);

        let predicted = model.predict(&[vec![10.0, 2.0]]).unwrap();
        assert!((predicted[0] - 15.0).abs() < 1e-3);
    }

    #[test]
    fn collinear_features_still_fit() {
        let x: Vec<Vec<f64>> = (0..15)
            .map(|i| {
                let spot = 50.0 + i as f64;
                let futures = 48.0 + (i as f64 * 1.3).sin();
                vec![spot - futures, spot, futures]
            })
            .collect();
        let y: Vec<f64> = x.iter().map(|r| 0.5 * r[0] - 1.0).collect();

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();
        let predicted = model.predict(&x).unwrap();
        for (p, actual) in predicted.iter().zip(y.iter()) {
            assert!((p - actual).abs() < 1e-3);
        }
    }

    #[test]
    fn predict_before_fit_fails() {
        assert!(LinearRegression::new().predict(&[vec![1.0]]).is_err());
    }

    #[test]
    fn width_mismatch_is_rejected() {
        let mut model = LinearRegression::new();
        model.fit(&[vec![1.0], vec![2.0]], &[1.0, 2.0]).unwrap();
        assert!(model.predict(&[vec![1.0, 2.0]]).is_err());
    }
}
