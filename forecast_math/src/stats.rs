//! Descriptive statistics over weekly sales values

use crate::{MathError, Result};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};

/// Summary statistics of a series of values
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    /// Number of observations
    pub count: usize,
    /// Sum of all observations
    pub total: f64,
    /// Arithmetic mean
    pub mean: f64,
    /// Sample standard deviation (zero for a single observation)
    pub std_dev: f64,
    /// Smallest observation
    pub min: f64,
    /// Largest observation
    pub max: f64,
}

/// One bucket of a histogram
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    /// Inclusive lower edge
    pub lower: f64,
    /// Upper edge (inclusive for the last bin only)
    pub upper: f64,
    /// Number of values falling into the bin
    pub count: usize,
}

/// Arithmetic mean of the values
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot calculate the mean of an empty series".to_string(),
        ));
    }

    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample variance (n - 1 denominator)
pub fn variance(values: &[f64]) -> Result<f64> {
    if values.len() < 2 {
        return Err(MathError::InsufficientData(
            "Variance needs at least 2 observations".to_string(),
        ));
    }

    let mean = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Ok(sum_sq / (values.len() - 1) as f64)
}

/// Sample standard deviation
pub fn std_dev(values: &[f64]) -> Result<f64> {
    variance(values).map(f64::sqrt)
}

/// Summarize a series of values
pub fn summarize(values: &[f64]) -> Result<Summary> {
    let mean = mean(values)?;
    let std_dev = if values.len() > 1 { std_dev(values)? } else { 0.0 };

    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    Ok(Summary {
        count: values.len(),
        total: values.iter().sum(),
        mean,
        std_dev,
        min,
        max,
    })
}

/// Bucket values into `bins` equal-width bins spanning their range.
///
/// A series whose values are all equal produces a single bin.
pub fn histogram(values: &[f64], bins: usize) -> Result<Vec<HistogramBin>> {
    if bins == 0 {
        return Err(MathError::InvalidInput(
            "Histogram needs at least one bin".to_string(),
        ));
    }
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot build a histogram of an empty series".to_string(),
        ));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(MathError::InvalidInput(
            "Histogram values must be finite".to_string(),
        ));
    }

    let summary = summarize(values)?;
    let range = summary.max - summary.min;
    if range <= f64::EPSILON * summary.max.abs().max(1.0) {
        return Ok(vec![HistogramBin {
            lower: summary.min,
            upper: summary.max,
            count: values.len(),
        }]);
    }

    let width = range / bins as f64;
    let mut result: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: summary.min + width * i as f64,
            upper: summary.min + width * (i + 1) as f64,
            count: 0,
        })
        .collect();

    for &value in values {
        let idx = (((value - summary.min) / width).floor() as usize).min(bins - 1);
        result[idx].count += 1;
    }

    Ok(result)
}

/// Two-sided standard normal quantile for a confidence level in (0, 1).
///
/// `normal_quantile(0.95)` is roughly 1.96.
pub fn normal_quantile(level: f64) -> Result<f64> {
    if !(level > 0.0 && level < 1.0) {
        return Err(MathError::InvalidInput(format!(
            "Confidence level must be between 0 and 1, got {}",
            level
        )));
    }

    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| MathError::CalculationError(format!("Standard normal: {}", e)))?;
    Ok(normal.inverse_cdf(1.0 - (1.0 - level) / 2.0))
}
