//! # Time series primitives
//!
//! Every input to the analysis, whether a spot price, a futures price or a daily
//! temperature reading, arrives as a [`TimeSeries`]: an ordered run of
//! `(date, value)` observations with strictly increasing, unique dates.
//!
//! ## Dates
//!
//! Observations are keyed by calendar [`NaiveDate`]. Providers are responsible
//! for reducing their native timestamps to a date before building a series:
//! price bars use the exchange's local trading day, weather readings use the
//! UTC archive day. Alignment then matches on exact date equality.
//!
//! Gaps (weekends, holidays, missing readings) are allowed and expected.
//!
//! ## Example
//!
//! ```rust
//! use basis_hedge::data::TimeSeries;
//! use chrono::NaiveDate;
//!
//! let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
//! let spot = TimeSeries::from_pairs("USO", vec![(d(2), 70.1), (d(3), 70.4)]).unwrap();
//! assert_eq!(spot.len(), 2);
//! assert_eq!(spot.value_on(d(3)), Some(70.4));
//! ```

use crate::errors::{BasisHedgeError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date format used for parsing and rendering observation dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single dated reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Calendar date of the reading
    pub date: NaiveDate,
    /// Observed value (price or temperature)
    pub value: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Ordered series of dated observations for one observable quantity
///
/// The constructor enforces the invariants the aligner relies on:
///
/// - dates are strictly increasing (therefore unique)
/// - every value is finite
///
/// An empty series is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Label for the series, usually the ticker or `"MaxTemp"`
    pub name: String,
    points: Vec<Observation>,
}

impl TimeSeries {
    /// Build a validated series from observations
    pub fn new(name: impl Into<String>, points: Vec<Observation>) -> Result<Self> {
        let name = name.into();
        validate_points(&name, &points)?;
        Ok(Self { name, points })
    }

    /// Build a validated series from `(date, value)` pairs
    pub fn from_pairs(name: impl Into<String>, pairs: Vec<(NaiveDate, f64)>) -> Result<Self> {
        let points = pairs
            .into_iter()
            .map(|(date, value)| Observation::new(date, value))
            .collect();
        Self::new(name, points)
    }

    /// Build a series from unordered observations.
    ///
    /// Points are sorted by date. Duplicate dates keep the last value seen,
    /// which matches how providers revise an intraday bar.
    pub fn from_unsorted(name: impl Into<String>, mut points: Vec<Observation>) -> Result<Self> {
        points.sort_by_key(|p| p.date);
        let mut deduped: Vec<Observation> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }
        Self::new(name, deduped)
    }

    /// An empty series
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            points: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Borrow the observations in date order
    pub fn points(&self) -> &[Observation] {
        &self.points
    }

    /// Iterate over dates in order
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.date)
    }

    /// Iterate over values in date order
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.value)
    }

    /// Value observed on `date`, if any
    pub fn value_on(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|idx| self.points[idx].value)
    }

    /// First and last observation dates
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date)),
            _ => None,
        }
    }
}

fn validate_points(name: &str, points: &[Observation]) -> Result<()> {
    for (i, point) in points.iter().enumerate() {
        if !point.value.is_finite() {
            return Err(BasisHedgeError::validation(format!(
                "Series '{}' has non-finite value {} at index {}",
                name, point.value, i
            )));
        }
    }

    for i in 1..points.len() {
        if points[i].date <= points[i - 1].date {
            return Err(BasisHedgeError::validation(format!(
                "Series '{}' dates not strictly increasing at indices {} and {} ({} then {})",
                name,
                i - 1,
                i,
                points[i - 1].date,
                points[i].date
            )));
        }
    }

    Ok(())
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)?)
}

/// Validate a requested fetch window
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start >= end {
        return Err(BasisHedgeError::validation(format!(
            "Invalid date range: start {} must be before end {}",
            start, end
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn rejects_out_of_order_dates() {
        let result = TimeSeries::from_pairs("GLD", vec![(d(2), 1.0), (d(1), 2.0)]);
        assert!(matches!(result, Err(BasisHedgeError::Validation(_))));
    }

    #[test]
    fn rejects_duplicate_dates() {
        let result = TimeSeries::from_pairs("GLD", vec![(d(2), 1.0), (d(2), 2.0)]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_nan_values() {
        let result = TimeSeries::from_pairs("GLD", vec![(d(2), f64::NAN)]);
        assert!(result.is_err());
    }

    #[test]
    fn from_unsorted_sorts_and_keeps_last_duplicate() {
        let series = TimeSeries::from_unsorted(
            "GC=F",
            vec![
                Observation::new(d(5), 3.0),
                Observation::new(d(1), 1.0),
                Observation::new(d(5), 4.0),
            ],
        )
        .unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.value_on(d(5)), Some(4.0));
        assert_eq!(series.date_range(), Some((d(1), d(5))));
    }

    #[test]
    fn empty_series_is_valid() {
        let series = TimeSeries::new("CORN", Vec::new()).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.date_range(), None);
    }

    #[test]
    fn parses_iso_dates() {
        assert_eq!(parse_date("2024-03-07").unwrap(), d(7));
        assert!(matches!(
            parse_date("03/07/2024"),
            Err(BasisHedgeError::DateTimeParsing(_))
        ));
        assert!(validate_date_range(d(7), d(7)).is_err());
    }
}
