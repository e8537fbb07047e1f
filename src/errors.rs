//! Error types for basis-risk analysis operations

use thiserror::Error;

/// Result type alias for consistent error handling throughout the crate
pub type Result<T> = std::result::Result<T, BasisHedgeError>;

/// Main error type for basis-risk analysis operations
#[derive(Debug, Error)]
pub enum BasisHedgeError {
    /// Upstream fetch failed or returned nothing usable
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    /// An operation needed at least one row and got none
    #[error("Empty series: {0}")]
    EmptySeries(String),

    /// Too few samples to train and evaluate a model
    #[error("Insufficient data: need at least {required} samples, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// Input series share no common dates
    #[error("Misaligned input: {0}")]
    MisalignedInput(String),

    /// JSON parsing errors
    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),

    /// CSV processing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Date/time parsing errors
    #[error("DateTime parsing error: {0}")]
    DateTimeParsing(#[from] chrono::ParseError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<reqwest::Error> for BasisHedgeError {
    fn from(err: reqwest::Error) -> Self {
        BasisHedgeError::DataUnavailable(format!("transport failure: {}", err))
    }
}

impl BasisHedgeError {
    /// Create a new DataUnavailable error
    pub fn data_unavailable<S: Into<String>>(msg: S) -> Self {
        BasisHedgeError::DataUnavailable(msg.into())
    }

    /// Create a new EmptySeries error
    pub fn empty_series<S: Into<String>>(msg: S) -> Self {
        BasisHedgeError::EmptySeries(msg.into())
    }

    /// Create a new InsufficientData error
    pub fn insufficient_data(required: usize, actual: usize) -> Self {
        BasisHedgeError::InsufficientData { required, actual }
    }

    /// Create a new MisalignedInput error
    pub fn misaligned_input<S: Into<String>>(msg: S) -> Self {
        BasisHedgeError::MisalignedInput(msg.into())
    }

    /// Create a new Validation error
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        BasisHedgeError::Validation(msg.into())
    }

    /// Create a new Configuration error
    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        BasisHedgeError::Configuration(msg.into())
    }

    /// Get user-friendly error message with suggestions for resolution
    pub fn user_message(&self) -> String {
        match self {
            Self::DataUnavailable(msg) => {
                format!(
                    "Data unavailable: {}\n\n\
                    Suggestions:\n\
                    - Check your internet connection\n\
                    - Verify the ticker symbol (e.g. 'USO', 'CL=F')\n\
                    - Make sure the date range lies in the past",
                    msg
                )
            }
            Self::EmptySeries(msg) => {
                format!(
                    "Empty series: {}\n\n\
                    The spot and futures series produced no common trading days.\n\
                    Try a longer lookback or a different ticker pair.",
                    msg
                )
            }
            Self::InsufficientData { required, actual } => {
                format!(
                    "Insufficient data: the model needs at least {} usable samples but only {} remain \
                    after dropping rows with missing features.\n\n\
                    Suggestions:\n\
                    - Increase the lookback window\n\
                    - Check that weather data covers the same dates as the price data",
                    required, actual
                )
            }
            Self::Configuration(msg) => {
                format!(
                    "Configuration error: {}\n\n\
                    Please verify the configuration file is valid JSON and values are in range.",
                    msg
                )
            }
            _ => self.to_string(),
        }
    }

    /// Check if this error is recoverable (user can retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::DataUnavailable(_))
    }

    /// Check if this error is due to user input
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Configuration(_))
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> &'static str {
        match self {
            Self::DataUnavailable(_) => "data",
            Self::EmptySeries(_) => "data",
            Self::InsufficientData { .. } => "model",
            Self::MisalignedInput(_) => "data",
            Self::JsonParsing(_) => "parsing",
            Self::Csv(_) => "csv",
            Self::Io(_) => "io",
            Self::DateTimeParsing(_) => "parsing",
            Self::Configuration(_) => "config",
            Self::Validation(_) => "validation",
        }
    }
}
