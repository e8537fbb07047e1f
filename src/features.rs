//! Feature engineering for the basis-change model.
//!
//! Each [`Feature`] turns a [`DerivedTable`] into one column of optional
//! values. A [`FeatureRegistry`] collects the columns, and
//! [`FeatureDataset::build`] pairs every row with the next-step basis change,
//! keeping only rows where all features and the target are present.
//!
//! The default feature set is `Basis`, `Spot`, `Futures` and `MaxTemp`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::TimeSeries;
pub use crate::metrics::basis_change;
use crate::metrics::DerivedTable;

/// Column of optional values produced by a feature
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSeries {
    name: String,
    values: Vec<Option<f64>>,
}

impl FeatureSeries {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Trait implemented by all feature columns
pub trait Feature {
    /// Column name
    fn name(&self) -> &'static str;

    /// Compute the column for every row of `table`
    fn compute(&self, table: &DerivedTable) -> FeatureSeries;
}

/// Ordered collection of features
#[derive(Default)]
pub struct FeatureRegistry {
    features: Vec<Box<dyn Feature + Send + Sync>>,
}

impl FeatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Basis`, `Spot`, `Futures`, `MaxTemp` (from the table's joined column)
    pub fn basis_model_features() -> Self {
        Self::with_temperature(MaxTempFeature::from_table())
    }

    /// `Basis`, `Spot`, `Futures`, `MaxTemp` (left-joined from `weather`)
    pub fn basis_model_features_with_weather(weather: TimeSeries) -> Self {
        Self::with_temperature(MaxTempFeature::lookup(weather))
    }

    fn with_temperature(temperature: MaxTempFeature) -> Self {
        let mut registry = Self::new();
        registry.register(BasisFeature);
        registry.register(SpotFeature);
        registry.register(FuturesFeature);
        registry.register(temperature);
        registry
    }

    pub fn register<F>(&mut self, feature: F)
    where
        F: Feature + Send + Sync + 'static,
    {
        self.features.push(Box::new(feature));
    }

    pub fn compute(&self, table: &DerivedTable) -> Vec<FeatureSeries> {
        self.features
            .iter()
            .map(|feature| feature.compute(table))
            .collect()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.features.iter().map(|feature| feature.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Basis level
pub struct BasisFeature;

impl Feature for BasisFeature {
    fn name(&self) -> &'static str {
        "Basis"
    }

    fn compute(&self, table: &DerivedTable) -> FeatureSeries {
        FeatureSeries::new(self.name(), table.basis.iter().copied().map(Some).collect())
    }
}

/// Spot price level
pub struct SpotFeature;

impl Feature for SpotFeature {
    fn name(&self) -> &'static str {
        "Spot"
    }

    fn compute(&self, table: &DerivedTable) -> FeatureSeries {
        FeatureSeries::new(self.name(), table.spot.iter().copied().map(Some).collect())
    }
}

/// Futures price level
pub struct FuturesFeature;

impl Feature for FuturesFeature {
    fn name(&self) -> &'static str {
        "Futures"
    }

    fn compute(&self, table: &DerivedTable) -> FeatureSeries {
        FeatureSeries::new(self.name(), table.futures.iter().copied().map(Some).collect())
    }
}

/// Daily maximum temperature.
///
/// With a lookup series the column is a left join on the table's dates, so a
/// date without a reading is `None`. Without one the column comes from the
/// table's own joined `max_temp`, or is `None` everywhere.
#[derive(Default)]
pub struct MaxTempFeature {
    weather: Option<TimeSeries>,
}

impl MaxTempFeature {
    /// Use the table's joined `max_temp` column
    pub fn from_table() -> Self {
        Self { weather: None }
    }

    /// Look readings up in `weather` by date
    pub fn lookup(weather: TimeSeries) -> Self {
        Self {
            weather: Some(weather),
        }
    }
}

impl Feature for MaxTempFeature {
    fn name(&self) -> &'static str {
        "MaxTemp"
    }

    fn compute(&self, table: &DerivedTable) -> FeatureSeries {
        let values = match (&self.weather, &table.max_temp) {
            (Some(weather), _) => table.dates.iter().map(|d| weather.value_on(*d)).collect(),
            (None, Some(temps)) => temps.iter().copied().map(Some).collect(),
            (None, None) => vec![None; table.len()],
        };
        FeatureSeries::new(self.name(), values)
    }
}

/// Rolling basis volatility, available as an optional extra feature
pub struct VolatilityFeature;

impl Feature for VolatilityFeature {
    fn name(&self) -> &'static str {
        "Volatility"
    }

    fn compute(&self, table: &DerivedTable) -> FeatureSeries {
        FeatureSeries::new(self.name(), table.volatility.clone())
    }
}

/// One supervised row: features at `date` and the basis change that follows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSample {
    pub date: NaiveDate,
    pub features: Vec<f64>,
    pub target: f64,
}

/// Chronologically ordered supervised dataset
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureDataset {
    feature_names: Vec<String>,
    samples: Vec<FeatureSample>,
}

impl FeatureDataset {
    /// Build samples from `table`, dropping any row with a missing feature or target
    pub fn build(table: &DerivedTable, registry: &FeatureRegistry) -> Self {
        let columns = registry.compute(table);
        let target = match &table.basis_change {
            Some(column) if column.len() == table.len() => column.clone(),
            _ => basis_change(&table.basis),
        };

        let mut samples = Vec::with_capacity(table.len().saturating_sub(1));
        'rows: for (idx, date) in table.dates.iter().enumerate() {
            let Some(target_value) = target.get(idx).copied().flatten() else {
                continue;
            };
            let mut features = Vec::with_capacity(columns.len());
            for column in &columns {
                match column.values().get(idx).copied().flatten() {
                    Some(value) if value.is_finite() => features.push(value),
                    _ => continue 'rows,
                }
            }
            samples.push(FeatureSample {
                date: *date,
                features,
                target: target_value,
            });
        }

        debug!(
            rows = table.len(),
            samples = samples.len(),
            features = columns.len(),
            "built feature dataset"
        );

        Self {
            feature_names: columns.iter().map(|c| c.name().to_string()).collect(),
            samples,
        }
    }

    /// Wrap pre-built samples
    pub fn from_samples(feature_names: Vec<String>, samples: Vec<FeatureSample>) -> Self {
        Self {
            feature_names,
            samples,
        }
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn samples(&self) -> &[FeatureSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Feature matrix for rows in `range`
    pub fn matrix(&self, range: std::ops::Range<usize>) -> Vec<Vec<f64>> {
        self.samples[range]
            .iter()
            .map(|s| s.features.clone())
            .collect()
    }

    /// Target vector for rows in `range`
    pub fn targets(&self, range: std::ops::Range<usize>) -> Vec<f64> {
        self.samples[range].iter().map(|s| s.target).collect()
    }

    /// Dates for rows in `range`
    pub fn dates(&self, range: std::ops::Range<usize>) -> Vec<NaiveDate> {
        self.samples[range].iter().map(|s| s.date).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::AlignedTable;
    use crate::metrics::MetricsEngine;

    fn derived(with_weather: bool) -> DerivedTable {
        let dates: Vec<NaiveDate> = (1..=5)
            .map(|day| NaiveDate::from_ymd_opt(2024, 2, day).unwrap())
            .collect();
        let mut table = AlignedTable::from_columns(
            dates,
            vec![10.0, 11.0, 9.0, 10.0, 12.0],
            vec![12.0, 12.0, 13.0, 11.0, 11.5],
        )
        .unwrap();
        if with_weather {
            table.max_temp = Some(vec![20.0, 21.0, 22.0, 23.0, 24.0]);
        }
        MetricsEngine::new(2).compute(&table)
    }

    #[test]
    fn basis_change_is_forward_difference() {
        assert_eq!(
            basis_change(&[-2.0, -1.0, -4.0]),
            vec![Some(1.0), Some(-3.0), None]
        );
        assert!(basis_change(&[]).is_empty());
    }

    #[test]
    fn dataset_drops_final_row() {
        let table = derived(true);
        let dataset = FeatureDataset::build(&table, &FeatureRegistry::basis_model_features());
        assert_eq!(dataset.len(), 4);
        assert_eq!(dataset.feature_names(), ["Basis", "Spot", "Futures", "MaxTemp"]);

        let first = &dataset.samples()[0];
        assert_eq!(first.features, vec![-2.0, 10.0, 12.0, 20.0]);
        assert_eq!(first.target, 1.0);
        assert_eq!(dataset.samples().last().unwrap().date, table.dates[3]);
    }

    #[test]
    fn missing_weather_excludes_every_row() {
        let dataset = FeatureDataset::build(&derived(false), &FeatureRegistry::basis_model_features());
        assert!(dataset.is_empty());
    }

    #[test]
    fn unmatched_weather_dates_are_excluded_but_targets_come_from_full_table() {
        let table = derived(false);
        let weather = TimeSeries::from_pairs(
            "MaxTemp",
            vec![(table.dates[0], 20.0), (table.dates[2], 22.0), (table.dates[3], 23.0)],
        )
        .unwrap();
        let dataset = FeatureDataset::build(
            &table,
            &FeatureRegistry::basis_model_features_with_weather(weather),
        );

        let dates: Vec<NaiveDate> = dataset.samples().iter().map(|s| s.date).collect();
        assert_eq!(dates, vec![table.dates[0], table.dates[2], table.dates[3]]);
        // row 0 targets row 1 even though row 1 has no weather reading
        assert_eq!(dataset.samples()[0].target, 1.0);
        assert_eq!(dataset.samples()[2].target, 1.5);
    }

    #[test]
    fn optional_volatility_feature_drops_warmup_rows() {
        let mut registry = FeatureRegistry::basis_model_features();
        registry.register(VolatilityFeature);
        let dataset = FeatureDataset::build(&derived(true), &registry);
        // window 2 leaves row 0 undefined, final row has no target
        assert_eq!(dataset.len(), 3);
        assert_eq!(registry.names().len(), 5);
    }
}
