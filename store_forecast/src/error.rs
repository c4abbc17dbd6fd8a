//! Error types for the store_forecast crate

use forecast_math::MathError;
use thiserror::Error;

/// Custom error types for the store_forecast crate
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    /// No sales records exist for the selected store
    #[error("No sales records for store {store}")]
    EmptySelection { store: String },

    /// The training window is too small to fit a model
    #[error("Insufficient data for forecast: training window has {points} point(s), need at least 2")]
    InsufficientData { points: usize },

    /// The requested forecast horizon is not a positive number of weeks
    #[error("Invalid forecast horizon: {horizon} week(s)")]
    InvalidHorizon { horizon: i64 },

    /// The oracle returned no forecast points
    #[error("Forecast is empty")]
    EmptyForecast,

    /// The underlying fit/forecast call failed
    #[error("Forecasting oracle failed: {0}")]
    OracleError(String),

    /// The oracle observed that its result is no longer wanted
    #[error("Forecast cancelled by a newer selection")]
    Cancelled,

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error related to invariant validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from CSV parsing
    #[error("CSV error: {0}")]
    Csv(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(String),

    /// Error from configuration loading
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl ForecastError {
    /// Whether the error describes the current selection rather than a
    /// broken session. Recoverable errors are rendered as placeholders and
    /// cleared by the next selection change.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ForecastError::EmptySelection { .. }
                | ForecastError::InsufficientData { .. }
                | ForecastError::InvalidHorizon { .. }
                | ForecastError::EmptyForecast
                | ForecastError::OracleError(_)
                | ForecastError::Cancelled
        )
    }

    /// User-facing placeholder text for a view that cannot be drawn
    pub fn placeholder(&self) -> String {
        match self {
            ForecastError::EmptySelection { store } => {
                format!("No data available for store {}", store)
            }
            ForecastError::InsufficientData { .. } => "Insufficient data for forecast".to_string(),
            ForecastError::InvalidHorizon { horizon } if *horizon < 1 => {
                "Choose a target week after the current week".to_string()
            }
            ForecastError::InvalidHorizon { .. } => format!(
                "Forecasts reach at most {} weeks ahead",
                crate::planner::MAX_HORIZON_WEEKS
            ),
            ForecastError::EmptyForecast => "The forecast returned no points".to_string(),
            ForecastError::OracleError(_) => "The model could not be fitted to this store".to_string(),
            ForecastError::Cancelled => "Updating forecast".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<std::io::Error> for ForecastError {
    fn from(err: std::io::Error) -> Self {
        ForecastError::IoError(err.to_string())
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::Csv(err.to_string())
    }
}

impl From<config::ConfigError> for ForecastError {
    fn from(err: config::ConfigError) -> Self {
        ForecastError::ConfigError(err.to_string())
    }
}

impl From<MathError> for ForecastError {
    fn from(err: MathError) -> Self {
        match err {
            MathError::Cancelled => ForecastError::Cancelled,
            other => ForecastError::OracleError(other.to_string()),
        }
    }
}
