//! Basis metrics engine.
//!
//! Derives the basis (`spot - futures`) and two rolling risk statistics from an
//! [`AlignedTable`]:
//!
//! - **volatility**: sample standard deviation of the basis over the trailing
//!   `window` rows
//! - **correlation**: Pearson correlation of spot and futures over the same
//!   trailing rows
//!
//! Windows count rows, not calendar days, so a holiday gap does not widen the
//! span. The first `window - 1` rows of each rolling column are `None`, as is
//! any correlation whose window has zero variance in either leg.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::align::AlignedTable;

/// Default rolling window length in rows
pub const DEFAULT_WINDOW: usize = 30;

/// [`AlignedTable`] extended with computed columns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedTable {
    pub dates: Vec<NaiveDate>,
    pub spot: Vec<f64>,
    pub futures: Vec<f64>,
    pub max_temp: Option<Vec<f64>>,
    /// `spot - futures` for every row
    pub basis: Vec<f64>,
    /// Rolling sample standard deviation of `basis`
    pub volatility: Vec<Option<f64>>,
    /// Rolling Pearson correlation of `spot` and `futures`
    pub correlation: Vec<Option<f64>>,
    /// Cumulative 1:1 hedge P&L, filled in by the hedge simulator
    pub hedged_pnl: Option<Vec<f64>>,
    /// Next-step basis change, filled in on the predictive path
    #[serde(default)]
    pub basis_change: Option<Vec<Option<f64>>>,
    /// Window used for the rolling columns
    pub window: usize,
}

impl DerivedTable {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Most recent basis value
    pub fn last_basis(&self) -> Option<f64> {
        self.basis.last().copied()
    }

    /// Fill the `basis_change` column from `basis`
    pub fn with_basis_change(mut self) -> Self {
        self.basis_change = Some(basis_change(&self.basis));
        self
    }

    /// Rebuild the aligned view (without derived columns)
    pub fn aligned(&self) -> AlignedTable {
        AlignedTable {
            dates: self.dates.clone(),
            spot: self.spot.clone(),
            futures: self.futures.clone(),
            max_temp: self.max_temp.clone(),
        }
    }
}

/// Computes basis, rolling volatility and rolling correlation
#[derive(Debug, Clone, Copy)]
pub struct MetricsEngine {
    /// Rolling window length in rows (values below 2 are raised to 2)
    pub window: usize,
}

impl Default for MetricsEngine {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
        }
    }
}

impl MetricsEngine {
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    /// Derive all metric columns for `table`
    pub fn compute(&self, table: &AlignedTable) -> DerivedTable {
        let window = self.window.max(2);
        let basis = basis(&table.spot, &table.futures);
        let volatility = rolling_std(&basis, window);
        let correlation = rolling_correlation(&table.spot, &table.futures, window);

        debug!(
            rows = table.len(),
            window,
            defined = volatility.iter().filter(|v| v.is_some()).count(),
            "computed basis metrics"
        );

        DerivedTable {
            dates: table.dates.clone(),
            spot: table.spot.clone(),
            futures: table.futures.clone(),
            max_temp: table.max_temp.clone(),
            basis,
            volatility,
            correlation,
            hedged_pnl: None,
            basis_change: None,
            window,
        }
    }
}

/// Element-wise `spot - futures`
pub fn basis(spot: &[f64], futures: &[f64]) -> Vec<f64> {
    spot.iter().zip(futures.iter()).map(|(s, f)| s - f).collect()
}

/// Next-step basis change: `basis[i + 1] - basis[i]`, absent on the final row
pub fn basis_change(basis: &[f64]) -> Vec<Option<f64>> {
    let mut values: Vec<Option<f64>> = basis.windows(2).map(|w| Some(w[1] - w[0])).collect();
    if !basis.is_empty() {
        values.push(None);
    }
    values
}

fn trailing(values: &[f64], end_idx: usize, window: usize) -> Option<&[f64]> {
    if window == 0 || end_idx + 1 < window || end_idx >= values.len() {
        None
    } else {
        Some(&values[end_idx + 1 - window..=end_idx])
    }
}

fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values
        .iter()
        .map(|value| {
            let diff = value - mean;
            diff * diff
        })
        .sum::<f64>()
        / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut denom_x = 0.0;
    let mut denom_y = 0.0;
    for (a, b) in x.iter().zip(y.iter()) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        numerator += dx * dy;
        denom_x += dx * dx;
        denom_y += dy * dy;
    }

    // a flat leg has zero variance; checked on the raw values so the test is scale-free
    if is_flat(x) || is_flat(y) {
        return None;
    }
    let denominator = (denom_x * denom_y).sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return None;
    }
    Some((numerator / denominator).clamp(-1.0, 1.0))
}

fn is_flat(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

/// Trailing sample standard deviation; `None` until `window` rows are available
pub fn rolling_std(values: &[f64], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|idx| trailing(values, idx, window).and_then(sample_std))
        .collect()
}

/// Trailing Pearson correlation; `None` until `window` rows are available or
/// when either leg is flat over the window
pub fn rolling_correlation(x: &[f64], y: &[f64], window: usize) -> Vec<Option<f64>> {
    let len = x.len().min(y.len());
    (0..len)
        .map(|idx| {
            let xs = trailing(x, idx, window)?;
            let ys = trailing(y, idx, window)?;
            pearson(xs, ys)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(spot: Vec<f64>, futures: Vec<f64>) -> AlignedTable {
        let dates = (0..spot.len())
            .map(|i| NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i as u64))
            .collect();
        AlignedTable::from_columns(dates, spot, futures).unwrap()
    }

    #[test]
    fn basis_is_exact_difference() {
        let derived = MetricsEngine::new(2).compute(&table(vec![10.0, 11.0, 9.0], vec![12.0, 12.0, 13.0]));
        assert_eq!(derived.basis, vec![-2.0, -1.0, -4.0]);
    }

    #[test]
    fn rolling_std_matches_sample_definition() {
        let values = [1.0, 2.0, 3.0, 4.0];
        let result = rolling_std(&values, 3);
        assert_eq!(result[0], None);
        assert_eq!(result[1], None);
        assert!((result[2].unwrap() - 1.0).abs() < 1e-12);
        assert!((result[3].unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn correlation_of_linear_legs_is_one() {
        let spot = vec![1.0, 2.0, 3.0, 5.0, 8.0];
        let futures: Vec<f64> = spot.iter().map(|v| 2.0 * v + 1.0).collect();
        let result = rolling_correlation(&spot, &futures, 3);
        assert_eq!(result[..2], [None, None]);
        for value in &result[2..] {
            assert!((value.unwrap() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn flat_window_has_no_correlation() {
        let spot = vec![5.0, 5.0, 5.0, 6.0];
        let futures = vec![1.0, 2.0, 3.0, 4.0];
        let result = rolling_correlation(&spot, &futures, 3);
        assert_eq!(result[2], None);
        assert!(result[3].is_some());
    }

    #[test]
    fn correlation_does_not_depend_on_price_scale() {
        let spot = [1e-7, 2e-7, 3e-7];
        let futures = [2e-7, 4e-7, 6e-7];
        let small = rolling_correlation(&spot, &futures, 3);
        assert!((small[2].unwrap() - 1.0).abs() < 1e-9);

        let scaled_spot: Vec<f64> = spot.iter().map(|v| v * 1e7).collect();
        let scaled_futures: Vec<f64> = futures.iter().map(|v| v * 1e7).collect();
        let large = rolling_correlation(&scaled_spot, &scaled_futures, 3);
        assert!((large[2].unwrap() - small[2].unwrap()).abs() < 1e-9);
    }

    #[test]
    fn flat_leg_with_inexact_mean_has_no_correlation() {
        // the mean of repeated 0.1 is not exactly 0.1, but the leg is still flat
        let result = rolling_correlation(&[0.1, 0.1, 0.1], &[1.0, 2.0, 4.0], 3);
        assert_eq!(result[2], None);
    }

    #[test]
    fn basis_change_column_is_forward_difference() {
        let derived = MetricsEngine::new(2)
            .compute(&table(vec![10.0, 11.0, 9.0], vec![12.0, 12.0, 13.0]))
            .with_basis_change();
        assert_eq!(derived.basis_change, Some(vec![Some(1.0), Some(-3.0), None]));
        assert!(basis_change(&[]).is_empty());
    }

    #[test]
    fn short_table_has_all_rolling_values_missing() {
        let derived = MetricsEngine::default().compute(&table(vec![1.0; 5], vec![2.0; 5]));
        assert_eq!(derived.len(), 5);
        assert!(derived.volatility.iter().all(Option::is_none));
        assert!(derived.correlation.iter().all(Option::is_none));
    }
}
