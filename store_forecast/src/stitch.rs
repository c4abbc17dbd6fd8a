//! Past-vs-forecast series stitching

use crate::error::{ForecastError, Result};
use crate::oracle::ForecastResult;
use crate::series::Series;
use serde::Serialize;

/// Which side of the comparison a point belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SegmentLabel {
    Past,
    Forecast,
}

/// One labeled point of a comparison series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComparisonPoint {
    pub week: u32,
    pub value: f64,
    pub label: SegmentLabel,
}

/// Historical tail followed by forecast points, ascending by week
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonSeries {
    points: Vec<ComparisonPoint>,
    past_len: usize,
}

impl ComparisonSeries {
    /// All points, past first
    pub fn points(&self) -> &[ComparisonPoint] {
        &self.points
    }

    /// Points labeled [`SegmentLabel::Past`]
    pub fn past(&self) -> &[ComparisonPoint] {
        &self.points[..self.past_len]
    }

    /// Points labeled [`SegmentLabel::Forecast`]
    pub fn forecast(&self) -> &[ComparisonPoint] {
        &self.points[self.past_len..]
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

/// Join the last `past_window_weeks` points of `series` with the forecast.
///
/// A shorter history is used whole. Forecast weeks must all come after the
/// last past week, so the two segments never interleave.
pub fn stitch(
    series: &Series,
    forecast: &ForecastResult,
    output_weeks: &[u32],
    past_window_weeks: usize,
) -> Result<ComparisonSeries> {
    if forecast.is_empty() {
        return Err(ForecastError::EmptyForecast);
    }
    if forecast.len() != output_weeks.len() {
        return Err(ForecastError::ValidationError(format!(
            "Forecast has {} points for {} output weeks",
            forecast.len(),
            output_weeks.len()
        )));
    }
    if output_weeks.windows(2).any(|w| w[0] >= w[1]) {
        return Err(ForecastError::ValidationError(
            "Output weeks must strictly increase".to_string(),
        ));
    }

    let past = series.tail(past_window_weeks);
    if let (Some(last_past), Some(&first_future)) = (past.last(), output_weeks.first()) {
        if first_future <= last_past.week {
            return Err(ForecastError::ValidationError(format!(
                "Forecast starts at week {} but history runs to week {}",
                first_future, last_past.week
            )));
        }
    }

    let mut points = Vec::with_capacity(past.len() + output_weeks.len());
    points.extend(past.iter().map(|p| ComparisonPoint {
        week: p.week,
        value: p.value,
        label: SegmentLabel::Past,
    }));
    points.extend(
        output_weeks
            .iter()
            .zip(forecast.point())
            .map(|(&week, &value)| ComparisonPoint {
                week,
                value,
                label: SegmentLabel::Forecast,
            }),
    );

    Ok(ComparisonSeries {
        points,
        past_len: past.len(),
    })
}
