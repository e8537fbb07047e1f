//! basis-hedge: basis-risk analysis for commodity spot/futures pairs.
//!
//! Usage:
//!   basis-hedge [OPTIONS]
//!
//! Options:
//!   -c, --config <FILE>         Analysis config JSON (defaults apply when absent)
//!   --commodities <FILE>        Commodity table JSON (built-in table when absent)
//!   --commodity <NAMES>         Comma-separated commodities to analyse (default: all)
//!   --predict                   Train the basis-change model where weather is configured

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use basis_hedge::config::{AnalysisConfig, CommodityTable, ModelKind};
use basis_hedge::data::parse_date;
use basis_hedge::pipeline::{BatchRunner, CommodityStatus};
use basis_hedge::providers::{OpenMeteoWeatherProvider, YahooPriceProvider};
use basis_hedge::report::{csv_file_name, write_derived_csv, write_predictions_csv, AnalysisReport};

/// CLI arguments for basis-hedge.
#[derive(Parser, Debug)]
#[command(name = "basis-hedge")]
#[command(about = "Basis-risk analytics and 1:1 hedge simulation for commodity futures")]
#[command(version)]
struct Args {
    /// Analysis config file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Commodity table file (JSON list of commodity specs)
    #[arg(long)]
    commodities: Option<PathBuf>,

    /// Comma-separated commodity names (e.g. "WTI Crude,Gold")
    #[arg(long, value_delimiter = ',')]
    commodity: Option<Vec<String>>,

    /// Last date of the analysis period (YYYY-MM-DD, default today)
    #[arg(long)]
    end: Option<String>,

    /// Rolling window length in rows
    #[arg(long)]
    window: Option<usize>,

    /// Absolute basis that triggers an alert
    #[arg(long)]
    threshold: Option<f64>,

    /// Days of history to fetch
    #[arg(long)]
    lookback_days: Option<i64>,

    /// Directory for CSV output
    #[arg(short, long)]
    output_dir: Option<String>,

    /// Train and score the basis-change model
    #[arg(long)]
    predict: bool,

    /// Use linear regression instead of the random forest
    #[arg(long)]
    linear: bool,

    /// Log filter when RUST_LOG is unset
    #[arg(long, env = "BASIS_HEDGE_LOG", default_value = "info")]
    log_level: String,
}

impl Args {
    fn apply_overrides(&self, config: &mut AnalysisConfig) {
        if let Some(window) = self.window {
            config.window = window;
        }
        if let Some(threshold) = self.threshold {
            config.alert_threshold = threshold;
        }
        if let Some(days) = self.lookback_days {
            config.lookback_days = days;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if self.linear {
            config.model = ModelKind::Linear;
        }
    }

    fn end_date(&self) -> Result<NaiveDate> {
        match &self.end {
            Some(value) => parse_date(value).with_context(|| format!("invalid --end '{}'", value)),
            None => Ok(Utc::now().date_naive()),
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_commodities(args: &Args) -> Result<CommodityTable> {
    let table = match &args.commodities {
        Some(path) => CommodityTable::from_json_file(path)
            .with_context(|| format!("loading commodity table from {}", path.display()))?,
        None => CommodityTable::builtin(),
    };

    let Some(names) = &args.commodity else {
        return Ok(table);
    };
    let mut selected = Vec::with_capacity(names.len());
    for name in names {
        match table.get(name.trim()) {
            Some(spec) => selected.push(spec.clone()),
            None => bail!("unknown commodity '{}'", name),
        }
    }
    Ok(CommodityTable::new(selected)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_json_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    args.apply_overrides(&mut config);
    config.validate()?;

    let commodities = load_commodities(&args)?;
    let end = args.end_date()?;
    let output_dir = PathBuf::from(&config.output_dir);
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;

    info!(
        commodities = commodities.len(),
        window = config.window,
        threshold = config.alert_threshold,
        predict = args.predict,
        "starting basis-hedge"
    );

    let runner = BatchRunner::new(
        YahooPriceProvider::new()?,
        OpenMeteoWeatherProvider::new()?,
        config,
    )
    .with_prediction(args.predict);
    let runs = runner.run(&commodities, end).await?;

    for run in &runs {
        match &run.status {
            CommodityStatus::Completed(result) => {
                write_outputs(&output_dir, &run.commodity, result)?;
            }
            CommodityStatus::Skipped(reason) => {
                info!(commodity = %run.commodity, reason = %reason, "skipped");
            }
            CommodityStatus::Failed(err) => {
                error!(commodity = %run.commodity, "{}", err.user_message());
            }
        }
    }

    let report = AnalysisReport::new(&runs);
    let summary_path = output_dir.join("basis_hedge_summary.csv");
    report.write_csv(&summary_path)?;
    let triggered = report.triggered();
    if !triggered.is_empty() {
        warn!(commodities = ?triggered, "basis alerts triggered");
    }
    info!(path = %summary_path.display(), "summary written");

    Ok(())
}

fn write_outputs(
    dir: &Path,
    commodity: &str,
    result: &basis_hedge::pipeline::CommodityAnalysis,
) -> Result<()> {
    let table_path = dir.join(csv_file_name(commodity));
    write_derived_csv(&result.analysis.table, &table_path)?;
    info!(commodity, path = %table_path.display(), "derived table written");

    if let Some(Ok(prediction)) = &result.prediction {
        let stem = csv_file_name(commodity).replace(".csv", "_predictions.csv");
        let path = dir.join(stem);
        write_predictions_csv(prediction, &path)?;
        info!(
            commodity,
            mse = prediction.mse,
            path = %path.display(),
            "predictions written"
        );
    }
    Ok(())
}
