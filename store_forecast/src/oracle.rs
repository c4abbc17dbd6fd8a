//! Forecasting oracle boundary
//!
//! The dashboard treats model fitting as a black box behind
//! [`ForecastOracle`]. [`AutoArimaOracle`] is the production implementation
//! backed by [`forecast_math::AutoArima`].

use crate::error::{ForecastError, Result};
use crate::selection::ConfidenceLevel;
use crate::series::Series;
use forecast_math::AutoArima;
use serde::Serialize;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{event, Level};

/// Prediction band at one confidence level
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntervalBand {
    /// Confidence level of the band
    pub level: ConfidenceLevel,
    /// Lower bound per forecast point
    pub lower: Vec<f64>,
    /// Upper bound per forecast point
    pub upper: Vec<f64>,
}

/// Oracle output: point forecast plus optional bands
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    point: Vec<f64>,
    bands: Vec<IntervalBand>,
}

impl ForecastResult {
    /// Create a point-only forecast
    pub fn new(point: Vec<f64>) -> Self {
        Self {
            point,
            bands: Vec::new(),
        }
    }

    /// Create a forecast with bands; every band must match the point length
    pub fn with_bands(point: Vec<f64>, bands: Vec<IntervalBand>) -> Result<Self> {
        for band in &bands {
            if band.lower.len() != point.len() || band.upper.len() != point.len() {
                return Err(ForecastError::ValidationError(format!(
                    "Band at {} has {}/{} bounds for {} points",
                    band.level,
                    band.lower.len(),
                    band.upper.len(),
                    point.len()
                )));
            }
        }

        Ok(Self { point, bands })
    }

    /// Point forecast
    pub fn point(&self) -> &[f64] {
        &self.point
    }

    /// All bands, in the order the levels were requested
    pub fn bands(&self) -> &[IntervalBand] {
        &self.bands
    }

    /// Band at a given level, if it was requested
    pub fn band(&self, level: ConfidenceLevel) -> Option<&IntervalBand> {
        self.bands.iter().find(|b| b.level == level)
    }

    /// Check if no point was forecast
    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }

    /// Number of forecast points
    pub fn len(&self) -> usize {
        self.point.len()
    }
}

/// Handle an oracle polls to learn that its result is no longer wanted.
///
/// A token is bound to the session generation it was issued in and reports
/// cancellation as soon as the session moves to a newer generation.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    issued: u64,
    current: Arc<AtomicU64>,
}

impl CancellationToken {
    pub(crate) fn new(issued: u64, current: Arc<AtomicU64>) -> Self {
        Self { issued, current }
    }

    /// A token that is never cancelled, for standalone oracle calls
    pub fn never() -> Self {
        Self::new(0, Arc::new(AtomicU64::new(0)))
    }

    /// Generation the token was issued in
    pub fn generation(&self) -> u64 {
        self.issued
    }

    /// Whether a newer selection superseded this work
    pub fn is_cancelled(&self) -> bool {
        self.current.load(Ordering::Acquire) != self.issued
    }
}

/// Black-box fit-and-forecast routine
pub trait ForecastOracle: Debug {
    /// Fit `series` and forecast `horizon` points with one band per level
    fn fit_and_forecast(
        &self,
        series: &Series,
        horizon: usize,
        levels: &[ConfidenceLevel],
        cancel: &CancellationToken,
    ) -> Result<ForecastResult>;

    /// Name of the oracle, for logs
    fn name(&self) -> &str;
}

/// Oracle backed by the auto-fitting ARIMA selector
#[derive(Debug, Clone, Default)]
pub struct AutoArimaOracle {
    model: AutoArima,
}

impl AutoArimaOracle {
    /// Create an oracle, optionally considering a seasonal period in weeks
    pub fn new(seasonal_period: Option<usize>) -> Result<Self> {
        let model = match seasonal_period {
            Some(period) => AutoArima::seasonal(period),
            None => Ok(AutoArima::default()),
        }
        .map_err(|e| ForecastError::InvalidParameter(e.to_string()))?;

        Ok(Self { model })
    }
}

impl ForecastOracle for AutoArimaOracle {
    fn fit_and_forecast(
        &self,
        series: &Series,
        horizon: usize,
        levels: &[ConfidenceLevel],
        cancel: &CancellationToken,
    ) -> Result<ForecastResult> {
        let values = series.values();
        let fit = self
            .model
            .fit_with_cancel(&values, || cancel.is_cancelled())?;
        event!(
            Level::DEBUG,
            store = %series.store(),
            order = %fit.order(),
            aic = fit.aic(),
            "fitted model"
        );

        let fractions: Vec<f64> = levels.iter().map(|l| l.fraction()).collect();
        let forecast = fit.forecast(horizon, &fractions)?;

        let bands = levels
            .iter()
            .zip(forecast.intervals)
            .map(|(&level, interval)| IntervalBand {
                level,
                lower: interval.lower,
                upper: interval.upper,
            })
            .collect();

        ForecastResult::with_bands(forecast.point, bands)
    }

    fn name(&self) -> &str {
        "auto-arima"
    }
}
