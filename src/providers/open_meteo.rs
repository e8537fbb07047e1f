//! Open-Meteo historical weather archive.
//!
//! Requests are made with `timezone=UTC`, so each reading's date is the UTC
//! calendar day and is used verbatim for alignment.

use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

use crate::data::{parse_date, validate_date_range, Observation, TimeSeries, DATE_FORMAT};
use crate::errors::{BasisHedgeError, Result};

use super::{get_text, http_client, WeatherProvider, DEFAULT_TIMEOUT};

const DEFAULT_BASE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";

/// Name given to fetched temperature series
pub const MAX_TEMP_SERIES: &str = "MaxTemp";

#[derive(Debug, Deserialize)]
struct ArchiveEnvelope {
    #[serde(default)]
    error: bool,
    reason: Option<String>,
    daily: Option<DailyColumns>,
}

#[derive(Debug, Deserialize)]
struct DailyColumns {
    time: Vec<String>,
    temperature_2m_max: Vec<Option<f64>>,
}

/// Parse an archive payload into a daily maximum-temperature series.
///
/// Days with a null reading are dropped.
pub fn parse_archive_payload(payload: &str) -> Result<TimeSeries> {
    let envelope: ArchiveEnvelope = serde_json::from_str(payload).map_err(|e| {
        BasisHedgeError::data_unavailable(format!("malformed weather payload: {}", e))
    })?;

    if envelope.error {
        return Err(BasisHedgeError::data_unavailable(format!(
            "weather archive error: {}",
            envelope.reason.unwrap_or_else(|| "unknown reason".to_string())
        )));
    }

    let daily = envelope
        .daily
        .ok_or_else(|| BasisHedgeError::data_unavailable("weather payload has no daily block"))?;

    if daily.time.len() != daily.temperature_2m_max.len() {
        return Err(BasisHedgeError::data_unavailable(format!(
            "weather payload has {} dates but {} readings",
            daily.time.len(),
            daily.temperature_2m_max.len()
        )));
    }

    let mut points = Vec::with_capacity(daily.time.len());
    for (date, reading) in daily.time.iter().zip(daily.temperature_2m_max.iter()) {
        let date = parse_date(date).map_err(|e| {
            BasisHedgeError::data_unavailable(format!("bad weather date '{}': {}", date, e))
        })?;
        if let Some(value) = reading.filter(|v| v.is_finite()) {
            points.push(Observation::new(date, value));
        }
    }

    TimeSeries::from_unsorted(MAX_TEMP_SERIES, points)
}

/// Weather provider backed by the Open-Meteo archive API
#[derive(Debug, Clone)]
pub struct OpenMeteoWeatherProvider {
    base_url: String,
    client: reqwest::Client,
}

impl OpenMeteoWeatherProvider {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            client: http_client(timeout)?,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl WeatherProvider for OpenMeteoWeatherProvider {
    async fn fetch(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        latitude: f64,
        longitude: f64,
    ) -> Result<TimeSeries> {
        validate_date_range(start, end)?;
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(BasisHedgeError::validation(format!(
                "invalid coordinate ({}, {})",
                latitude, longitude
            )));
        }

        let request = self.client.get(&self.base_url).query(&[
            ("latitude", latitude.to_string()),
            ("longitude", longitude.to_string()),
            ("start_date", start.format(DATE_FORMAT).to_string()),
            ("end_date", end.format(DATE_FORMAT).to_string()),
            ("daily", "temperature_2m_max".to_string()),
            ("timezone", "UTC".to_string()),
        ]);

        debug!(latitude, longitude, %start, %end, "fetching daily max temperature");
        let body = get_text(request, "weather archive").await?;
        parse_archive_payload(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_daily_readings_and_skips_nulls() {
        let payload = r#"{
            "latitude": 41.88, "longitude": -93.1,
            "daily_units": {"time": "iso8601", "temperature_2m_max": "°C"},
            "daily": {
                "time": ["2024-07-01", "2024-07-02", "2024-07-03"],
                "temperature_2m_max": [29.4, null, 31.0]
            }
        }"#;
        let series = parse_archive_payload(payload).unwrap();
        assert_eq!(series.name, MAX_TEMP_SERIES);
        assert_eq!(series.len(), 2);
        assert_eq!(
            series.value_on(NaiveDate::from_ymd_opt(2024, 7, 3).unwrap()),
            Some(31.0)
        );
    }

    #[test]
    fn error_payload_is_data_unavailable() {
        let payload = r#"{"error": true, "reason": "Parameter 'start_date' is out of allowed range"}"#;
        let err = parse_archive_payload(payload).unwrap_err();
        assert!(matches!(err, BasisHedgeError::DataUnavailable(_)));
        assert!(err.to_string().contains("out of allowed range"));
    }

    #[test]
    fn mismatched_columns_are_rejected() {
        let payload = r#"{"daily": {"time": ["2024-07-01"], "temperature_2m_max": []}}"#;
        assert!(matches!(
            parse_archive_payload(payload),
            Err(BasisHedgeError::DataUnavailable(_))
        ));
    }

    #[test]
    fn bad_date_is_data_unavailable() {
        let payload = r#"{"daily": {"time": ["07/01/2024"], "temperature_2m_max": [20.0]}}"#;
        assert!(matches!(
            parse_archive_payload(payload),
            Err(BasisHedgeError::DataUnavailable(_))
        ));
    }
}
