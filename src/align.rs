//! Series alignment.
//!
//! Spot and futures prices come from independent fetches and rarely share an
//! identical calendar: exchanges observe different holidays and providers drop
//! bars. [`align`] inner-joins the two series on date so that every row of the
//! resulting [`AlignedTable`] carries both prices. Rows are dropped, never
//! interpolated.
//!
//! Weather joins happen later through [`AlignedTable::with_weather`]: the price
//! table's dates are authoritative and any date without a reading is dropped.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::data::TimeSeries;
use crate::errors::{BasisHedgeError, Result};

/// Date-indexed table of aligned prices.
///
/// All column vectors have the same length and are aligned by index. Dates are
/// strictly increasing. `max_temp` is present only after a weather join.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignedTable {
    pub dates: Vec<NaiveDate>,
    pub spot: Vec<f64>,
    pub futures: Vec<f64>,
    pub max_temp: Option<Vec<f64>>,
}

impl AlignedTable {
    /// Build a table from parallel columns
    pub fn from_columns(dates: Vec<NaiveDate>, spot: Vec<f64>, futures: Vec<f64>) -> Result<Self> {
        let table = Self {
            dates,
            spot,
            futures,
            max_temp: None,
        };
        table.validate()?;
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn has_weather(&self) -> bool {
        self.max_temp.is_some()
    }

    /// Check column lengths, date order and value finiteness
    pub fn validate(&self) -> Result<()> {
        let len = self.dates.len();
        let weather_len = self.max_temp.as_ref().map_or(len, Vec::len);
        if self.spot.len() != len || self.futures.len() != len || weather_len != len {
            return Err(BasisHedgeError::validation(
                "All table columns must have the same length",
            ));
        }

        for i in 1..len {
            if self.dates[i] <= self.dates[i - 1] {
                return Err(BasisHedgeError::validation(format!(
                    "Dates not in chronological order at indices {} and {}",
                    i - 1,
                    i
                )));
            }
        }

        let weather = self.max_temp.as_deref().unwrap_or(&[]);
        if self
            .spot
            .iter()
            .chain(self.futures.iter())
            .chain(weather.iter())
            .any(|value| !value.is_finite())
        {
            return Err(BasisHedgeError::validation(
                "Aligned table contains a missing or non-finite value",
            ));
        }

        Ok(())
    }

    /// Join a weather series onto the table.
    ///
    /// The table's own dates drive the join; a date with no weather reading is
    /// dropped from the result.
    pub fn with_weather(&self, weather: &TimeSeries) -> AlignedTable {
        let mut joined = AlignedTable {
            max_temp: Some(Vec::with_capacity(self.len())),
            ..AlignedTable::default()
        };

        for i in 0..self.len() {
            if let Some(temp) = weather.value_on(self.dates[i]) {
                joined.dates.push(self.dates[i]);
                joined.spot.push(self.spot[i]);
                joined.futures.push(self.futures[i]);
                if let Some(column) = joined.max_temp.as_mut() {
                    column.push(temp);
                }
            }
        }

        let dropped = self.len() - joined.len();
        if dropped > 0 {
            debug!(
                dropped,
                kept = joined.len(),
                "dropped rows without a weather reading"
            );
        }

        joined
    }
}

/// Inner-join two price series on date.
///
/// Disjoint inputs yield an empty table, which downstream stages accept as a
/// degenerate but valid input.
pub fn align(spot: &TimeSeries, futures: &TimeSeries) -> AlignedTable {
    let spot_points = spot.points();
    let futures_points = futures.points();
    let capacity = spot_points.len().min(futures_points.len());

    let mut table = AlignedTable {
        dates: Vec::with_capacity(capacity),
        spot: Vec::with_capacity(capacity),
        futures: Vec::with_capacity(capacity),
        max_temp: None,
    };

    let (mut i, mut j) = (0, 0);
    while i < spot_points.len() && j < futures_points.len() {
        let (s, f) = (spot_points[i], futures_points[j]);
        if s.date < f.date {
            i += 1;
        } else if f.date < s.date {
            j += 1;
        } else {
            table.dates.push(s.date);
            table.spot.push(s.value);
            table.futures.push(f.value);
            i += 1;
            j += 1;
        }
    }

    if table.is_empty() && !(spot.is_empty() && futures.is_empty()) {
        warn!(
            spot = %spot.name,
            futures = %futures.name,
            "spot and futures series share no dates"
        );
    } else {
        debug!(
            spot_rows = spot.len(),
            futures_rows = futures.len(),
            aligned_rows = table.len(),
            "aligned spot and futures series"
        );
    }

    table
}

/// Like [`align`] but fails when the two series have no date in common
pub fn align_strict(spot: &TimeSeries, futures: &TimeSeries) -> Result<AlignedTable> {
    let table = align(spot, futures);
    if table.is_empty() {
        return Err(BasisHedgeError::misaligned_input(format!(
            "'{}' ({} rows) and '{}' ({} rows) have no overlapping dates",
            spot.name,
            spot.len(),
            futures.name,
            futures.len()
        )));
    }
    Ok(table)
}
