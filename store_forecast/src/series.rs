//! Per-store weekly time series

use crate::data::{SalesRecord, StoreId};
use crate::error::{ForecastError, Result};
use serde::Serialize;
use std::ops::RangeBounds;

/// One observation of a series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    /// Week index
    pub week: u32,
    /// Weekly sales
    pub value: f64,
}

/// Weekly sales of one store, strictly ascending by week
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    store: StoreId,
    points: Vec<SeriesPoint>,
}

impl Series {
    /// Create a series, checking that weeks strictly increase
    pub fn new(store: StoreId, points: Vec<SeriesPoint>) -> Result<Self> {
        if let Some(pair) = points.windows(2).find(|pair| pair[0].week >= pair[1].week) {
            return Err(ForecastError::ValidationError(format!(
                "Series weeks must strictly increase, found week {} before week {}",
                pair[0].week, pair[1].week
            )));
        }

        Ok(Self { store, points })
    }

    /// Store the series belongs to
    pub fn store(&self) -> &StoreId {
        &self.store
    }

    /// All points, ascending by week
    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    /// Sales values in week order
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Week indices in order
    pub fn weeks(&self) -> Vec<u32> {
        self.points.iter().map(|p| p.week).collect()
    }

    /// First observed week
    pub fn first_week(&self) -> Option<u32> {
        self.points.first().map(|p| p.week)
    }

    /// Last observed week
    pub fn last_week(&self) -> Option<u32> {
        self.points.last().map(|p| p.week)
    }

    /// Sub-series of the weeks falling inside `weeks`
    pub fn restrict<R: RangeBounds<u32>>(&self, weeks: R) -> Series {
        Series {
            store: self.store.clone(),
            points: self
                .points
                .iter()
                .filter(|p| weeks.contains(&p.week))
                .copied()
                .collect(),
        }
    }

    /// The last `n` points, or all of them when the series is shorter
    pub fn tail(&self, n: usize) -> &[SeriesPoint] {
        &self.points[self.points.len().saturating_sub(n)..]
    }

    /// Check if the series is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.points.len()
    }
}

/// Project the records of one store into a week-ordered series.
///
/// Fails with [`ForecastError::EmptySelection`] when no record matches, so
/// that downstream forecasting never sees an empty series.
pub fn filter(records: &[SalesRecord], store: &StoreId) -> Result<Series> {
    let mut points: Vec<SeriesPoint> = records
        .iter()
        .filter(|r| r.store == *store)
        .map(|r| SeriesPoint {
            week: r.week,
            value: r.weekly_sales,
        })
        .collect();

    if points.is_empty() {
        return Err(ForecastError::EmptySelection {
            store: store.to_string(),
        });
    }

    points.sort_by_key(|p| p.week);
    Series::new(store.clone(), points)
}
