//! CSV output for analysis results.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::errors::Result;
use crate::metrics::DerivedTable;
use crate::pipeline::{CommodityRun, CommodityStatus, PredictionOutcome};

const OUTPUT_SUFFIX: &str = "_basis_hedge_output.csv";

const DERIVED_HEADER: [&str; 9] = [
    "Date",
    "Spot",
    "Futures",
    "Basis",
    "Volatility",
    "Correlation",
    "Hedged_PnL",
    "MaxTemp",
    "Basis_Change",
];

const SUMMARY_HEADER: [&str; 9] = [
    "commodity",
    "status",
    "rows",
    "last_basis",
    "alert",
    "final_hedged_pnl",
    "hedge_effectiveness",
    "mse",
    "note",
];

/// Output file name for a commodity, e.g. `wti_crude_basis_hedge_output.csv`
pub fn csv_file_name(commodity: &str) -> String {
    format!("{}{}", commodity.to_lowercase().replace(' ', "_"), OUTPUT_SUFFIX)
}

#[derive(Debug, Serialize)]
struct DerivedRow {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Spot")]
    spot: f64,
    #[serde(rename = "Futures")]
    futures: f64,
    #[serde(rename = "Basis")]
    basis: f64,
    #[serde(rename = "Volatility")]
    volatility: Option<f64>,
    #[serde(rename = "Correlation")]
    correlation: Option<f64>,
    #[serde(rename = "Hedged_PnL")]
    hedged_pnl: Option<f64>,
    #[serde(rename = "MaxTemp")]
    max_temp: Option<f64>,
    #[serde(rename = "Basis_Change")]
    basis_change: Option<f64>,
}

/// Write every row of `table`; undefined values become empty cells
pub fn write_derived_csv<P: AsRef<Path>>(table: &DerivedTable, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_writer(BufWriter::new(File::create(path)?));

    for idx in 0..table.len() {
        writer.serialize(DerivedRow {
            date: table.dates[idx],
            spot: table.spot[idx],
            futures: table.futures[idx],
            basis: table.basis[idx],
            volatility: table.volatility.get(idx).copied().flatten(),
            correlation: table.correlation.get(idx).copied().flatten(),
            hedged_pnl: table.hedged_pnl.as_ref().and_then(|pnl| pnl.get(idx).copied()),
            max_temp: table.max_temp.as_ref().and_then(|temps| temps.get(idx).copied()),
            basis_change: table
                .basis_change
                .as_ref()
                .and_then(|changes| changes.get(idx).copied().flatten()),
        })?;
    }
    if table.is_empty() {
        writer.write_record(DERIVED_HEADER)?;
    }

    writer.flush()?;
    debug!(path = %path.display(), rows = table.len(), "wrote derived table");
    Ok(())
}

#[derive(Debug, Serialize)]
struct PredictionRow {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Actual")]
    actual: f64,
    #[serde(rename = "Predicted")]
    predicted: f64,
}

/// Write the held-out dates with actual and predicted basis changes
pub fn write_predictions_csv<P: AsRef<Path>>(outcome: &PredictionOutcome, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_writer(BufWriter::new(File::create(path)?));
    for ((date, actual), predicted) in outcome
        .test_dates
        .iter()
        .zip(outcome.actual.iter())
        .zip(outcome.predicted.iter())
    {
        writer.serialize(PredictionRow {
            date: *date,
            actual: *actual,
            predicted: *predicted,
        })?;
    }
    writer.flush()?;
    debug!(path = %path.display(), rows = outcome.test_len(), "wrote predictions");
    Ok(())
}

/// One line of the batch summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummaryRow {
    pub commodity: String,
    /// `completed`, `skipped` or `failed`
    pub status: String,
    pub rows: usize,
    pub last_basis: Option<f64>,
    pub alert: Option<String>,
    pub final_hedged_pnl: Option<f64>,
    pub hedge_effectiveness: Option<f64>,
    pub mse: Option<f64>,
    /// Skip reason or error message
    pub note: Option<String>,
}

/// Summary of a batch run across commodities
#[derive(Debug)]
pub struct AnalysisReport<'a> {
    runs: &'a [CommodityRun],
}

impl<'a> AnalysisReport<'a> {
    pub fn new(runs: &'a [CommodityRun]) -> Self {
        Self { runs }
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Commodities whose latest basis breached the threshold
    pub fn triggered(&self) -> Vec<&str> {
        self.runs
            .iter()
            .filter(|run| {
                run.analysis()
                    .and_then(|a| a.analysis.alert)
                    .is_some_and(|alert| alert.is_triggered())
            })
            .map(|run| run.commodity.as_str())
            .collect()
    }

    pub fn summary_rows(&self) -> Vec<AnalysisSummaryRow> {
        self.runs
            .iter()
            .map(|run| match &run.status {
                CommodityStatus::Completed(result) => {
                    let outcome = &result.analysis;
                    let (mse, note) = match &result.prediction {
                        Some(Ok(prediction)) => (Some(prediction.mse), None),
                        Some(Err(err)) => (None, Some(err.to_string())),
                        None => (None, None),
                    };
                    AnalysisSummaryRow {
                        commodity: run.commodity.clone(),
                        status: "completed".to_string(),
                        rows: outcome.table.len(),
                        last_basis: outcome.table.last_basis(),
                        alert: outcome.alert.map(|alert| alert.status.to_string()),
                        final_hedged_pnl: Some(outcome.hedge.final_hedged_pnl),
                        hedge_effectiveness: outcome.hedge.effectiveness,
                        mse,
                        note,
                    }
                }
                CommodityStatus::Skipped(reason) => {
                    Self::bare_row(&run.commodity, "skipped", reason.clone())
                }
                CommodityStatus::Failed(err) => {
                    Self::bare_row(&run.commodity, "failed", err.to_string())
                }
            })
            .collect()
    }

    fn bare_row(commodity: &str, status: &str, note: String) -> AnalysisSummaryRow {
        AnalysisSummaryRow {
            commodity: commodity.to_string(),
            status: status.to_string(),
            rows: 0,
            last_basis: None,
            alert: None,
            final_hedged_pnl: None,
            hedge_effectiveness: None,
            mse: None,
            note: Some(note),
        }
    }

    /// Write the summary as a CSV file
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_writer(BufWriter::new(File::create(path)?));
        let rows = self.summary_rows();
        for row in &rows {
            writer.serialize(row)?;
        }
        if rows.is_empty() {
            writer.write_record(SUMMARY_HEADER)?;
        }
        writer.flush()?;
        Ok(())
    }
}
