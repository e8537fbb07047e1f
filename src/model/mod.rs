//! Regression learners for basis-change prediction.
//!
//! The predictive pipeline only needs three things from a learner: fit on a
//! feature matrix, predict on another, and an error metric. [`Regressor`]
//! captures the first two; [`mean_squared_error`] is the third.
//!
//! Two learners are provided: [`LinearRegression`] (ordinary least squares) and
//! [`RandomForestRegressor`] (bagged regression trees, deterministic for a fixed
//! seed).

mod forest;
mod linear;

pub use forest::RandomForestRegressor;
pub use linear::LinearRegression;

use std::fmt;

use crate::config::{AnalysisConfig, ModelKind};
use crate::errors::{BasisHedgeError, Result};

/// Trait implemented by regression learners
pub trait Regressor: fmt::Debug + Send + Sync {
    /// Model name used in reports
    fn name(&self) -> &'static str;

    /// Fit the model to rows of `x` and targets `y`
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<()>;

    /// Predict one value per row of `x`
    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>>;
}

/// Construct the learner selected in `config`
pub fn build_regressor(config: &AnalysisConfig) -> Box<dyn Regressor> {
    match config.model {
        ModelKind::Linear => Box::new(LinearRegression::new()),
        ModelKind::RandomForest => Box::new(forest_from_config(config)),
    }
}

fn forest_from_config(config: &AnalysisConfig) -> RandomForestRegressor {
    RandomForestRegressor::new(config.seed)
        .with_trees(config.forest.n_trees)
        .with_max_depth(config.forest.max_depth)
        .with_min_samples_split(config.forest.min_samples_split)
        .with_max_features(config.forest.max_features)
}

/// Check that `x` and `y` describe the same non-empty, rectangular sample set
pub(crate) fn validate_training_set(x: &[Vec<f64>], y: &[f64]) -> Result<usize> {
    if x.is_empty() {
        return Err(BasisHedgeError::insufficient_data(1, 0));
    }
    if x.len() != y.len() {
        return Err(BasisHedgeError::validation(format!(
            "feature rows ({}) and targets ({}) differ in length",
            x.len(),
            y.len()
        )));
    }
    let width = x[0].len();
    if width == 0 {
        return Err(BasisHedgeError::validation("feature rows must not be empty"));
    }
    if x.iter().any(|row| row.len() != width) {
        return Err(BasisHedgeError::validation(
            "all feature rows must have the same width",
        ));
    }
    Ok(width)
}

/// Check that every row in `x` has `width` columns
pub(crate) fn validate_prediction_rows(x: &[Vec<f64>], width: usize) -> Result<()> {
    if let Some(row) = x.iter().find(|row| row.len() != width) {
        return Err(BasisHedgeError::validation(format!(
            "expected {} features per row, got {}",
            width,
            row.len()
        )));
    }
    Ok(())
}

/// Mean of squared differences between `actual` and `predicted`
pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    if actual.len() != predicted.len() {
        return Err(BasisHedgeError::validation(format!(
            "cannot score {} predictions against {} actual values",
            predicted.len(),
            actual.len()
        )));
    }
    if actual.is_empty() {
        return Err(BasisHedgeError::empty_series(
            "mean squared error needs at least one value",
        ));
    }
    let sum = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>();
    Ok(sum / actual.len() as f64)
}

/// Positional train/test split lengths.
///
/// The test block is `ceil(len * (1 - train_fraction))` rows at the end of the
/// sequence, the same rounding used by common ML toolkits. Either side being
/// empty is an [`BasisHedgeError::InsufficientData`] error.
pub fn chronological_split(len: usize, train_fraction: f64) -> Result<(usize, usize)> {
    if !(train_fraction > 0.0 && train_fraction < 1.0) {
        return Err(BasisHedgeError::validation(format!(
            "train fraction must lie strictly between 0 and 1, got {}",
            train_fraction
        )));
    }

    let test_fraction = 1.0 - train_fraction;
    let raw = len as f64 * test_fraction;
    // snap float noise (100 * 0.2 = 20.000000000000004) relative to the size itself
    let nearest = raw.round();
    let raw = if (raw - nearest).abs() <= raw * 1e-9 { nearest } else { raw };
    let test_len = (raw.ceil() as usize).min(len);
    let train_len = len - test_len;

    if test_len == 0 || train_len == 0 {
        // smallest length whose ceiling still leaves one training row
        let required = ((1.0 / train_fraction).ceil() as usize).max(2);
        return Err(BasisHedgeError::insufficient_data(required, len));
    }

    Ok((train_len, test_len))
}
