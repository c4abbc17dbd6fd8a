//! # Forecast Math
//!
//! Numeric building blocks for weekly sales forecasting.
//! This crate knows nothing about stores or dashboards; it works on plain
//! `f64` slices and provides:
//!
//! - Descriptive statistics and histogram binning ([`stats`])
//! - Two-sided normal quantiles for confidence levels ([`stats::normal_quantile`])
//! - An auto-fitting, optionally seasonally differenced ARIMA estimator ([`arima::AutoArima`])

use thiserror::Error;

pub mod arima;
pub mod stats;

pub use arima::{ArimaFit, ArimaOrder, AutoArima, Forecast, Interval};
pub use stats::{HistogramBin, Summary};

/// Errors that can occur in statistical and forecasting calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("Calculation cancelled")]
    Cancelled,
}

/// Result type for forecast math operations
pub type Result<T> = std::result::Result<T, MathError>;
