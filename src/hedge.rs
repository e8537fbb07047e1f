//! 1:1 hedge simulation.
//!
//! The hedger holds one unit of spot and is short one futures contract of the
//! same size for the whole period: no rebalancing, no costs. Each day the hedge
//! earns the futures move and loses the spot move, so the running P&L is
//!
//! ```text
//! pnl[0] = 0
//! pnl[t] = pnl[t-1] + (futures[t] - futures[t-1]) - (spot[t] - spot[t-1])
//! ```
//!
//! which is the negated change in basis since the first row.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::metrics::DerivedTable;

/// Day-over-day deltas of a price column; the first delta is zero
pub fn daily_changes(values: &[f64]) -> Vec<f64> {
    let mut changes = Vec::with_capacity(values.len());
    if values.is_empty() {
        return changes;
    }
    changes.push(0.0);
    for w in values.windows(2) {
        changes.push(w[1] - w[0]);
    }
    changes
}

/// Cumulative P&L of the 1:1 short-futures hedge
pub fn hedged_pnl(spot: &[f64], futures: &[f64]) -> Vec<f64> {
    let spot_moves = daily_changes(spot);
    let futures_moves = daily_changes(futures);

    let mut running = 0.0;
    futures_moves
        .iter()
        .zip(spot_moves.iter())
        .map(|(f, s)| {
            running += f - s;
            running
        })
        .collect()
}

/// Appends the `Hedged_PnL` column to derived tables
#[derive(Debug, Default, Clone, Copy)]
pub struct HedgeSimulator;

impl HedgeSimulator {
    /// Return `table` with its `hedged_pnl` column filled in
    pub fn apply(&self, mut table: DerivedTable) -> DerivedTable {
        let pnl = hedged_pnl(&table.spot, &table.futures);
        debug!(rows = pnl.len(), final_pnl = pnl.last().copied(), "simulated hedge");
        table.hedged_pnl = Some(pnl);
        table
    }
}

/// Summary statistics of a simulated hedge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HedgeSummary {
    /// Final cumulative hedged P&L
    pub final_hedged_pnl: f64,
    /// Final cumulative P&L of the unhedged spot position
    pub final_unhedged_pnl: f64,
    /// `1 - var(hedged daily P&L) / var(spot daily P&L)`
    pub effectiveness: Option<f64>,
    /// Largest peak-to-trough decline of the hedged P&L curve
    pub max_drawdown: f64,
    /// Number of rows the hedge ran over
    pub periods: usize,
}

impl HedgeSummary {
    /// Summarise the hedge on `table`, simulating it if the column is absent
    pub fn from_table(table: &DerivedTable) -> Self {
        let pnl = match &table.hedged_pnl {
            Some(pnl) => pnl.clone(),
            None => hedged_pnl(&table.spot, &table.futures),
        };

        let spot_moves = daily_changes(&table.spot);
        let hedged_moves = daily_changes(&pnl);

        let final_unhedged_pnl = match (table.spot.first(), table.spot.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        };

        // deltas after the first row; the leading zero is not an observation
        let effectiveness = match (
            variance(spot_moves.get(1..).unwrap_or(&[])),
            variance(hedged_moves.get(1..).unwrap_or(&[])),
        ) {
            (Some(spot_var), Some(hedged_var)) if spot_var > 0.0 => {
                Some(1.0 - hedged_var / spot_var)
            }
            _ => None,
        };

        Self {
            final_hedged_pnl: pnl.last().copied().unwrap_or(0.0),
            final_unhedged_pnl,
            effectiveness,
            max_drawdown: max_drawdown(&pnl),
            periods: pnl.len(),
        }
    }
}

fn variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    Some(
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64,
    )
}

fn max_drawdown(curve: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0;
    for &value in curve {
        peak = peak.max(value);
        worst = f64::max(worst, peak - value);
    }
    worst
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_row_is_zero_and_recurrence_holds() {
        let spot = [10.0, 11.0, 9.0];
        let futures = [12.0, 12.0, 13.0];
        let pnl = hedged_pnl(&spot, &futures);

        assert_eq!(pnl[0], 0.0);
        for t in 1..pnl.len() {
            let expected = (futures[t] - futures[t - 1]) - (spot[t] - spot[t - 1]);
            assert!((pnl[t] - pnl[t - 1] - expected).abs() < 1e-12);
        }
        assert_eq!(pnl, vec![0.0, -1.0, 2.0]);
    }

    #[test]
    fn empty_input_gives_empty_pnl() {
        assert!(hedged_pnl(&[], &[]).is_empty());
        assert!(daily_changes(&[]).is_empty());
    }

    #[test]
    fn perfect_hedge_is_fully_effective() {
        let table = DerivedTable {
            spot: vec![10.0, 12.0, 11.0, 15.0],
            futures: vec![11.0, 13.0, 12.0, 16.0],
            ..DerivedTable::default()
        };
        let summary = HedgeSummary::from_table(&table);
        assert_eq!(summary.final_hedged_pnl, 0.0);
        assert_eq!(summary.final_unhedged_pnl, 5.0);
        assert_eq!(summary.effectiveness, Some(1.0));
        assert_eq!(summary.max_drawdown, 0.0);
    }

    #[test]
    fn drawdown_tracks_peak_to_trough() {
        assert_eq!(max_drawdown(&[0.0, 3.0, 1.0, 4.0, -2.0]), 6.0);
    }
}
