//! Mock series and providers shared by the scenario tests

use std::collections::HashMap;

use chrono::{Days, NaiveDate};

use crate::data::TimeSeries;
use crate::errors::{BasisHedgeError, Result};
use crate::providers::{PriceProvider, WeatherProvider};

pub fn day(offset: u64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 2).unwrap() + Days::new(offset)
}

/// Series on consecutive days starting at `day(0)`
pub fn daily_series(name: &str, values: &[f64]) -> TimeSeries {
    TimeSeries::from_pairs(
        name,
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (day(i as u64), *v))
            .collect(),
    )
    .unwrap()
}

/// Trending price path with a slow cycle, offset by `level`
pub fn price_path(len: usize, level: f64, phase: f64) -> Vec<f64> {
    (0..len)
        .map(|i| {
            let t = i as f64;
            level + t * 0.04 + ((t + phase) * 0.2).sin() * 1.5
        })
        .collect()
}

/// Price provider serving canned series by ticker
#[derive(Default)]
pub struct MockPriceProvider {
    series: HashMap<String, TimeSeries>,
}

impl MockPriceProvider {
    pub fn with_series(mut self, ticker: &str, values: &[f64]) -> Self {
        self.series
            .insert(ticker.to_string(), daily_series(ticker, values));
        self
    }
}

impl PriceProvider for MockPriceProvider {
    async fn fetch(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<TimeSeries> {
        let series = self
            .series
            .get(ticker)
            .ok_or_else(|| BasisHedgeError::data_unavailable(format!("no data for {}", ticker)))?;
        let points = series
            .points()
            .iter()
            .copied()
            .filter(|p| p.date >= start && p.date <= end)
            .collect();
        TimeSeries::new(ticker, points)
    }
}

/// Weather provider returning one canned series, or failing when unset
#[derive(Default)]
pub struct MockWeatherProvider {
    series: Option<TimeSeries>,
}

impl MockWeatherProvider {
    pub fn with_temperatures(values: &[f64]) -> Self {
        Self {
            series: Some(daily_series("MaxTemp", values)),
        }
    }
}

impl WeatherProvider for MockWeatherProvider {
    async fn fetch(
        &self,
        _start: NaiveDate,
        _end: NaiveDate,
        _latitude: f64,
        _longitude: f64,
    ) -> Result<TimeSeries> {
        self.series
            .clone()
            .ok_or_else(|| BasisHedgeError::data_unavailable("weather archive offline"))
    }
}
