//! End-to-end analysis pipelines.
//!
//! [`BasisAnalysis`] chains alignment, metrics, the hedge simulation and the
//! alert check for one spot/futures pair. [`PredictivePipeline`] trains and
//! scores the basis-change model on a derived table plus weather.
//! [`BatchRunner`] drives both across a [`CommodityTable`], fetching data
//! through the provider traits and isolating per-commodity failures.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::align::{align, AlignedTable};
use crate::alerts::{AlertEvaluator, AlertResult};
use crate::config::{AnalysisConfig, CommoditySpec, CommodityTable};
use crate::data::TimeSeries;
use crate::errors::{BasisHedgeError, Result};
use crate::features::{FeatureDataset, FeatureRegistry};
use crate::hedge::{HedgeSimulator, HedgeSummary};
use crate::metrics::{DerivedTable, MetricsEngine};
use crate::model::{build_regressor, chronological_split, mean_squared_error, Regressor};
use crate::providers::{PriceProvider, WeatherProvider};

/// Result of analysing one spot/futures pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    /// Aligned prices with basis, rolling metrics and hedge P&L
    pub table: DerivedTable,
    /// `None` when the pair shared no trading days
    pub alert: Option<AlertResult>,
    pub hedge: HedgeSummary,
}

/// Descriptive analysis of a spot/futures pair
#[derive(Debug, Clone)]
pub struct BasisAnalysis {
    metrics: MetricsEngine,
    alerts: AlertEvaluator,
    hedge: HedgeSimulator,
}

impl BasisAnalysis {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            metrics: MetricsEngine::new(config.window),
            alerts: AlertEvaluator::new(config.alert_threshold),
            hedge: HedgeSimulator,
        }
    }

    /// Metrics and hedge P&L for an already aligned table
    pub fn derive(&self, aligned: &AlignedTable) -> DerivedTable {
        self.hedge.apply(self.metrics.compute(aligned))
    }

    /// Check the latest basis of `table` against the threshold
    pub fn evaluate_alert(&self, table: &DerivedTable) -> Result<AlertResult> {
        self.alerts.evaluate(&table.basis)
    }

    /// Align `spot` and `futures` and run every descriptive step.
    ///
    /// Disjoint inputs give an empty table and no alert rather than an error.
    pub fn run(&self, spot: &TimeSeries, futures: &TimeSeries) -> Result<AnalysisOutcome> {
        let aligned = align(spot, futures);
        let table = self.derive(&aligned);

        let alert = if table.is_empty() {
            warn!(spot = %spot.name, futures = %futures.name, "no common dates, skipping alert");
            None
        } else {
            Some(self.evaluate_alert(&table)?)
        };

        let hedge = HedgeSummary::from_table(&table);
        info!(
            spot = %spot.name,
            futures = %futures.name,
            rows = table.len(),
            last_basis = table.last_basis(),
            hedged_pnl = hedge.final_hedged_pnl,
            "basis analysis complete"
        );

        Ok(AnalysisOutcome {
            table,
            alert,
            hedge,
        })
    }
}

impl Default for BasisAnalysis {
    fn default() -> Self {
        Self::new(&AnalysisConfig::default())
    }
}

/// Held-out evaluation of a fitted basis-change model
#[derive(Debug)]
pub struct PredictionOutcome {
    pub model_name: &'static str,
    pub feature_names: Vec<String>,
    pub train_len: usize,
    /// Dates of the held-out rows, in order
    pub test_dates: Vec<NaiveDate>,
    pub actual: Vec<f64>,
    pub predicted: Vec<f64>,
    /// Mean squared error of `predicted` against `actual`
    pub mse: f64,
    /// The fitted model, for scoring further rows
    pub model: Box<dyn Regressor>,
}

impl PredictionOutcome {
    pub fn test_len(&self) -> usize {
        self.test_dates.len()
    }
}

/// Trains and scores the next-step basis-change model
#[derive(Debug, Clone)]
pub struct PredictivePipeline {
    config: AnalysisConfig,
}

impl PredictivePipeline {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Fit on the first chronological block of `derived` and score the rest.
    ///
    /// Weather is left-joined by date: the target is computed on the full
    /// table, then rows missing any feature are dropped.
    pub fn run(&self, derived: &DerivedTable, weather: &TimeSeries) -> Result<PredictionOutcome> {
        let registry = FeatureRegistry::basis_model_features_with_weather(weather.clone());
        let dataset = FeatureDataset::build(derived, &registry);
        self.fit_and_score(&dataset)
    }

    /// Fit and score a prepared dataset
    pub fn fit_and_score(&self, dataset: &FeatureDataset) -> Result<PredictionOutcome> {
        let (train_len, test_len) = chronological_split(dataset.len(), self.config.train_fraction)?;
        let train = 0..train_len;
        let test = train_len..train_len + test_len;

        let mut model = build_regressor(&self.config);
        model.fit(&dataset.matrix(train.clone()), &dataset.targets(train))?;

        let actual = dataset.targets(test.clone());
        let predicted = model.predict(&dataset.matrix(test.clone()))?;
        let mse = mean_squared_error(&actual, &predicted)?;

        info!(
            model = model.name(),
            train = train_len,
            test = test_len,
            mse,
            "basis-change model evaluated"
        );

        Ok(PredictionOutcome {
            model_name: model.name(),
            feature_names: dataset.feature_names().to_vec(),
            train_len,
            test_dates: dataset.dates(test),
            actual,
            predicted,
            mse,
            model,
        })
    }
}

/// Everything computed for one commodity
#[derive(Debug)]
pub struct CommodityAnalysis {
    pub analysis: AnalysisOutcome,
    /// `None` when prediction was disabled or the commodity has no weather location
    pub prediction: Option<Result<PredictionOutcome>>,
}

/// How a commodity fared in a batch run
#[derive(Debug)]
pub enum CommodityStatus {
    Completed(Box<CommodityAnalysis>),
    /// Not analysed, with the reason
    Skipped(String),
    Failed(BasisHedgeError),
}

/// Per-commodity entry of a batch run
#[derive(Debug)]
pub struct CommodityRun {
    pub commodity: String,
    pub status: CommodityStatus,
}

impl CommodityRun {
    pub fn analysis(&self) -> Option<&CommodityAnalysis> {
        match &self.status {
            CommodityStatus::Completed(analysis) => Some(analysis.as_ref()),
            _ => None,
        }
    }
}

/// Runs the analysis for every commodity in a table
pub struct BatchRunner<P, W> {
    prices: P,
    weather: W,
    config: AnalysisConfig,
    predict: bool,
}

impl<P, W> BatchRunner<P, W>
where
    P: PriceProvider,
    W: WeatherProvider,
{
    pub fn new(prices: P, weather: W, config: AnalysisConfig) -> Self {
        Self {
            prices,
            weather,
            config,
            predict: false,
        }
    }

    /// Also train the basis-change model for commodities with a weather location
    pub fn with_prediction(mut self, predict: bool) -> Self {
        self.predict = predict;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyse every commodity over the configured lookback ending at `end`
    pub async fn run(&self, commodities: &CommodityTable, end: NaiveDate) -> Result<Vec<CommodityRun>> {
        let lookback = u64::try_from(self.config.lookback_days)
            .map_err(|_| BasisHedgeError::config_error("lookback_days must be positive"))?;
        let start = end
            .checked_sub_days(Days::new(lookback))
            .ok_or_else(|| BasisHedgeError::validation(format!("lookback from {} out of range", end)))?;

        info!(commodities = commodities.len(), %start, %end, "starting batch run");

        let mut runs = Vec::with_capacity(commodities.len());
        for spec in commodities.iter() {
            let status = match self.run_one(spec, start, end).await {
                Ok(Some(analysis)) => CommodityStatus::Completed(Box::new(analysis)),
                Ok(None) => CommodityStatus::Skipped("no futures ticker".to_string()),
                Err(err) => {
                    warn!(
                        commodity = %spec.name,
                        category = err.category(),
                        error = %err,
                        "commodity analysis failed"
                    );
                    CommodityStatus::Failed(err)
                }
            };
            runs.push(CommodityRun {
                commodity: spec.name.clone(),
                status,
            });
        }

        Ok(runs)
    }

    /// Analyse one commodity; `Ok(None)` when it cannot be hedged
    pub async fn run_one(
        &self,
        spec: &CommoditySpec,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<CommodityAnalysis>> {
        let Some(futures_ticker) = spec.futures_ticker.as_deref() else {
            warn!(commodity = %spec.name, "no futures ticker, skipping");
            return Ok(None);
        };

        let spot = self.prices.fetch(&spec.spot_ticker, start, end).await?;
        let futures = self.prices.fetch(futures_ticker, start, end).await?;
        debug!(
            commodity = %spec.name,
            spot_rows = spot.len(),
            futures_rows = futures.len(),
            "fetched prices"
        );

        let mut analysis = BasisAnalysis::new(&self.config).run(&spot, &futures)?;
        if let Some(alert) = &analysis.alert {
            if alert.is_triggered() {
                warn!(
                    commodity = %spec.name,
                    basis = alert.value,
                    threshold = alert.threshold,
                    "basis alert: {}",
                    alert.status
                );
            } else {
                info!(commodity = %spec.name, basis = alert.value, "basis {}", alert.status);
            }
        }

        let prediction = match (&spec.weather, self.predict) {
            (Some(location), true) => {
                analysis.table = std::mem::take(&mut analysis.table).with_basis_change();
                let outcome: Result<PredictionOutcome> = async {
                    let weather = self
                        .weather
                        .fetch(start, end, location.latitude, location.longitude)
                        .await?;
                    PredictivePipeline::new(self.config.clone()).run(&analysis.table, &weather)
                }
                .await;
                if let Err(err) = &outcome {
                    warn!(commodity = %spec.name, error = %err, "prediction skipped");
                }
                Some(outcome)
            }
            (None, true) => {
                debug!(commodity = %spec.name, "no weather location, prediction skipped");
                None
            }
            (_, false) => None,
        };

        Ok(Some(CommodityAnalysis {
            analysis,
            prediction,
        }))
    }
}
