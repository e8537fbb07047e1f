//! Static commodity table and analysis parameters.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{BasisHedgeError, Result};

/// Geographic coordinate used to fetch weather for a commodity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherLocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// Spot/futures ticker pair for one commodity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommoditySpec {
    /// Display name, e.g. "WTI Crude"
    pub name: String,
    /// Ticker used as the spot proxy (usually an ETF)
    pub spot_ticker: String,
    /// Front-month futures ticker; `None` when no futures contract is available
    pub futures_ticker: Option<String>,
    /// Weather station used by the predictive pipeline
    pub weather: Option<WeatherLocation>,
}

impl CommoditySpec {
    pub fn new(
        name: impl Into<String>,
        spot_ticker: impl Into<String>,
        futures_ticker: Option<&str>,
    ) -> Self {
        Self {
            name: name.into(),
            spot_ticker: spot_ticker.into(),
            futures_ticker: futures_ticker.map(str::to_string),
            weather: None,
        }
    }

    pub fn with_weather(mut self, latitude: f64, longitude: f64) -> Self {
        self.weather = Some(WeatherLocation {
            latitude,
            longitude,
        });
        self
    }

    /// Whether both legs of the hedge can be fetched
    pub fn is_hedgeable(&self) -> bool {
        self.futures_ticker.is_some()
    }
}

/// Immutable commodity → ticker mapping.
///
/// Built once at startup and only read afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommodityTable {
    entries: Vec<CommoditySpec>,
}

impl CommodityTable {
    pub fn new(entries: Vec<CommoditySpec>) -> Result<Self> {
        for (i, entry) in entries.iter().enumerate() {
            if entry.name.trim().is_empty() {
                return Err(BasisHedgeError::config_error(format!(
                    "Commodity at index {} has an empty name",
                    i
                )));
            }
            if entries[..i].iter().any(|other| other.name == entry.name) {
                return Err(BasisHedgeError::config_error(format!(
                    "Duplicate commodity '{}'",
                    entry.name
                )));
            }
        }
        Ok(Self { entries })
    }

    /// The built-in table of tracked commodities
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                CommoditySpec::new("WTI Crude", "USO", Some("CL=F")).with_weather(35.98, -96.77),
                CommoditySpec::new("Gold", "GLD", Some("GC=F")),
                CommoditySpec::new("Corn", "CORN", Some("ZC=F")).with_weather(41.88, -93.10),
                CommoditySpec::new("Natural Gas", "UNG", Some("NG=F")).with_weather(29.90, -92.06),
            ],
        }
    }

    /// Look up a commodity by name, ignoring ASCII case
    pub fn get(&self, name: &str) -> Option<&CommoditySpec> {
        self.entries
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommoditySpec> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load a table from a JSON array of [`CommoditySpec`] values
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let entries: Vec<CommoditySpec> = serde_json::from_str(&text)?;
        Self::new(entries)
    }
}

impl Default for CommodityTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Regression learner used by the predictive pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    RandomForest,
    Linear,
}

/// Parameters for the random forest learner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    /// Features drawn at random for each split; `None` considers all of them
    pub max_features: Option<usize>,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 8,
            min_samples_split: 2,
            max_features: None,
        }
    }
}

/// Configuration values used by every pipeline stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Rolling window length in rows
    pub window: usize,
    /// Absolute basis above which an alert fires
    pub alert_threshold: f64,
    /// Leading fraction of samples used for training
    pub train_fraction: f64,
    /// Seed passed to the learner
    pub seed: u64,
    /// Days of history to fetch
    pub lookback_days: i64,
    /// Directory CSV output is written into
    pub output_dir: String,
    pub model: ModelKind,
    pub forest: ForestConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window: 30,
            alert_threshold: 2.0,
            train_fraction: 0.8,
            seed: 42,
            lookback_days: 365,
            output_dir: ".".to_string(),
            model: ModelKind::RandomForest,
            forest: ForestConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load a configuration from JSON; absent fields keep their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.window < 2 {
            return Err(BasisHedgeError::config_error(format!(
                "window must be at least 2, got {}",
                self.window
            )));
        }
        if !(self.alert_threshold.is_finite() && self.alert_threshold > 0.0) {
            return Err(BasisHedgeError::config_error(format!(
                "alert_threshold must be positive, got {}",
                self.alert_threshold
            )));
        }
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return Err(BasisHedgeError::config_error(format!(
                "train_fraction must lie strictly between 0 and 1, got {}",
                self.train_fraction
            )));
        }
        if self.lookback_days <= 0 {
            return Err(BasisHedgeError::config_error(format!(
                "lookback_days must be positive, got {}",
                self.lookback_days
            )));
        }
        if self.forest.n_trees == 0 || self.forest.max_depth == 0 {
            return Err(BasisHedgeError::config_error(
                "forest needs at least one tree of depth one",
            ));
        }
        if self.forest.max_features == Some(0) {
            return Err(BasisHedgeError::config_error(
                "forest max_features must be at least 1",
            ));
        }
        Ok(())
    }
}
