//! Market and weather data providers.
//!
//! The analytics core consumes [`TimeSeries`] values and never talks to the
//! network itself. The traits here describe what a provider must supply;
//! [`YahooPriceProvider`] and [`OpenMeteoWeatherProvider`] are the HTTP-backed
//! implementations used by the CLI.
//!
//! Every provider failure, whether transport, non-2xx status or a malformed
//! payload, surfaces as [`BasisHedgeError::DataUnavailable`]. No retries are
//! attempted here.
//!
//! [`BasisHedgeError::DataUnavailable`]: crate::errors::BasisHedgeError::DataUnavailable

mod open_meteo;
mod yahoo;

pub use open_meteo::{parse_archive_payload, OpenMeteoWeatherProvider, MAX_TEMP_SERIES};
pub use yahoo::{parse_chart_payload, YahooPriceProvider};

use std::future::Future;
use std::time::Duration;

use chrono::NaiveDate;

use crate::data::TimeSeries;
use crate::errors::{BasisHedgeError, Result};

/// Default request timeout for HTTP providers
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("basis-hedge/", env!("CARGO_PKG_VERSION"));

/// Supplies daily adjusted closing prices for a ticker
pub trait PriceProvider: Send + Sync {
    fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Future<Output = Result<TimeSeries>> + Send;
}

/// Supplies daily maximum temperature for a coordinate
pub trait WeatherProvider: Send + Sync {
    fn fetch(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        latitude: f64,
        longitude: f64,
    ) -> impl Future<Output = Result<TimeSeries>> + Send;
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| BasisHedgeError::data_unavailable(format!("failed to build HTTP client: {}", e)))
}

/// Issue a GET and return the body of a 2xx response
pub(crate) async fn get_text(request: reqwest::RequestBuilder, what: &str) -> Result<String> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        let excerpt: String = body.chars().take(200).collect();
        return Err(BasisHedgeError::data_unavailable(format!(
            "{} request failed with status {}: {}",
            what,
            status.as_u16(),
            excerpt
        )));
    }
    Ok(body)
}
