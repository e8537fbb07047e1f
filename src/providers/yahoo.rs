//! Yahoo Finance chart API.
//!
//! Daily bars are keyed by the exchange's local trading date, derived from the
//! bar timestamp plus the `gmtoffset` the payload reports.

use std::time::Duration;

use chrono::{DateTime, Days, NaiveDate, NaiveTime};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::data::{validate_date_range, Observation, TimeSeries};
use crate::errors::{BasisHedgeError, Result};

use super::{get_text, http_client, PriceProvider, DEFAULT_TIMEOUT};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteColumns>,
    adjclose: Option<Vec<AdjCloseColumn>>,
}

#[derive(Debug, Deserialize)]
struct QuoteColumns {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseColumn {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// Parse a chart API payload into a daily series.
///
/// Adjusted close is preferred, falling back to the raw close for a bar
/// without one. Bars with neither are dropped. A payload with a result but no
/// bars yields an empty series.
pub fn parse_chart_payload(ticker: &str, payload: &str) -> Result<TimeSeries> {
    let envelope: ChartEnvelope = serde_json::from_str(payload).map_err(|e| {
        BasisHedgeError::data_unavailable(format!("malformed chart payload for {}: {}", ticker, e))
    })?;

    if let Some(error) = envelope.chart.error {
        return Err(BasisHedgeError::data_unavailable(format!(
            "{}: {} ({})",
            ticker, error.description, error.code
        )));
    }

    let result = envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| BasisHedgeError::data_unavailable(format!("no chart result for {}", ticker)))?;

    let closes = result
        .indicators
        .quote
        .first()
        .map(|q| q.close.as_slice())
        .unwrap_or(&[]);
    let adjusted = result
        .indicators
        .adjclose
        .as_ref()
        .and_then(|columns| columns.first())
        .map(|c| c.adjclose.as_slice())
        .unwrap_or(&[]);

    let mut points = Vec::with_capacity(result.timestamp.len());
    let mut skipped = 0usize;
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let value = adjusted
            .get(i)
            .copied()
            .flatten()
            .or_else(|| closes.get(i).copied().flatten());
        let Some(value) = value.filter(|v| v.is_finite()) else {
            skipped += 1;
            continue;
        };
        let date = DateTime::from_timestamp(ts + result.meta.gmtoffset, 0)
            .ok_or_else(|| {
                BasisHedgeError::data_unavailable(format!("invalid bar timestamp {} for {}", ts, ticker))
            })?
            .date_naive();
        points.push(Observation::new(date, value));
    }

    if skipped > 0 {
        debug!(ticker, skipped, "dropped bars without a close");
    }

    TimeSeries::from_unsorted(ticker, points)
}

/// Price provider backed by the Yahoo Finance chart API
#[derive(Debug, Clone)]
pub struct YahooPriceProvider {
    base_url: String,
    client: reqwest::Client,
}

impl YahooPriceProvider {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            client: http_client(timeout)?,
        })
    }

    /// Point the provider at a different host (useful for mirrors and tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn period_bounds(start: NaiveDate, end: NaiveDate) -> Result<(i64, i64)> {
        let end_exclusive = end
            .checked_add_days(Days::new(1))
            .ok_or_else(|| BasisHedgeError::validation(format!("end date {} out of range", end)))?;
        Ok((
            start.and_time(NaiveTime::MIN).and_utc().timestamp(),
            end_exclusive.and_time(NaiveTime::MIN).and_utc().timestamp(),
        ))
    }
}

impl PriceProvider for YahooPriceProvider {
    async fn fetch(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<TimeSeries> {
        if ticker.trim().is_empty() {
            return Err(BasisHedgeError::data_unavailable("ticker cannot be empty"));
        }
        validate_date_range(start, end)?;
        let (period1, period2) = Self::period_bounds(start, end)?;

        let url = format!("{}/{}", self.base_url, ticker);
        let request = self.client.get(&url).query(&[
            ("period1", period1.to_string()),
            ("period2", period2.to_string()),
            ("interval", "1d".to_string()),
            ("events", "history".to_string()),
            ("includeAdjustedClose", "true".to_string()),
        ]);

        debug!(ticker, %start, %end, "fetching daily prices");
        let body = get_text(request, ticker).await?;
        let series = parse_chart_payload(ticker, &body)?;
        if series.is_empty() {
            warn!(ticker, %start, %end, "price provider returned no bars");
        }
        Ok(series)
    }
}
