//! Forecast window planning
//!
//! The planner turns the user-facing horizon controls into the two values the
//! oracle needs (training series and horizon length) plus the week labels of
//! the forecast output. Every function is pure.
//!
//! Horizons are never clamped: a non-positive horizon, one longer than
//! [`MAX_HORIZON_WEEKS`] or one running past the last representable week
//! fails with [`ForecastError::InvalidHorizon`], and a training slice with
//! fewer than two points fails with [`ForecastError::InsufficientData`]
//! before any oracle call.

use crate::error::{ForecastError, Result};
use crate::selection::{ForecastMode, Selection};
use crate::series::Series;
use serde::{Deserialize, Serialize};

/// Weeks in one forecast quarter
pub const WEEKS_PER_QUARTER: u32 = 13;

/// Longest horizon any plan accepts, ten years of weeks
pub const MAX_HORIZON_WEEKS: u32 = 520;

/// Fewest training points any plan accepts
const MIN_TRAINING_POINTS: usize = 2;

/// Weeks `after + 1 ..= after + horizon`, rejecting horizons past the
/// ceiling or the end of the week index.
fn output_weeks(after: u32, horizon: u32) -> Result<Vec<u32>> {
    let invalid = ForecastError::InvalidHorizon {
        horizon: i64::from(horizon),
    };
    if horizon == 0 || horizon > MAX_HORIZON_WEEKS {
        return Err(invalid);
    }
    let first = after.checked_add(1).ok_or_else(|| invalid.clone())?;
    let last = after.checked_add(horizon).ok_or(invalid)?;
    Ok((first..=last).collect())
}

/// Training data used by the quarterly planner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuarterlyTraining {
    /// Train on the target window `[current_week, current_week + horizon]`
    /// only. This narrows training to the weeks being forecast and is kept
    /// as the default because that is how the dashboard has always behaved.
    #[default]
    TargetWindow,
    /// Train on every observation up to and including the current week
    FullHistory,
}

/// Everything the oracle needs for one forecast
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPlan {
    training: Series,
    horizon: usize,
    output_weeks: Vec<u32>,
}

impl ForecastPlan {
    fn new(training: Series, horizon: u32, current_week: u32) -> Result<Self> {
        let output_weeks = output_weeks(current_week, horizon)?;
        if training.len() < MIN_TRAINING_POINTS {
            return Err(ForecastError::InsufficientData {
                points: training.len(),
            });
        }

        Ok(Self {
            training,
            horizon: output_weeks.len(),
            output_weeks,
        })
    }

    /// Series the model is fitted on
    pub fn training(&self) -> &Series {
        &self.training
    }

    /// Number of weeks to forecast
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Week index of every forecast point, ascending
    pub fn output_weeks(&self) -> &[u32] {
        &self.output_weeks
    }
}

/// Plan `quarter_count` quarters past `current_week`, training on the
/// target window.
pub fn plan_quarterly(series: &Series, current_week: u32, quarter_count: u32) -> Result<ForecastPlan> {
    plan_quarterly_with(series, current_week, quarter_count, QuarterlyTraining::TargetWindow)
}

/// Plan `quarter_count` quarters past `current_week` with an explicit
/// training policy.
pub fn plan_quarterly_with(
    series: &Series,
    current_week: u32,
    quarter_count: u32,
    training: QuarterlyTraining,
) -> Result<ForecastPlan> {
    let horizon = quarter_count
        .checked_mul(WEEKS_PER_QUARTER)
        .filter(|h| (1..=MAX_HORIZON_WEEKS).contains(h))
        .ok_or(ForecastError::InvalidHorizon {
            horizon: i64::from(quarter_count) * i64::from(WEEKS_PER_QUARTER),
        })?;
    let window_end = current_week
        .checked_add(horizon)
        .ok_or(ForecastError::InvalidHorizon {
            horizon: i64::from(horizon),
        })?;

    let training_series = match training {
        QuarterlyTraining::TargetWindow => series.restrict(current_week..=window_end),
        QuarterlyTraining::FullHistory => series.restrict(..=current_week),
    };

    ForecastPlan::new(training_series, horizon, current_week)
}

/// Plan every week after `current_week` up to and including `target_week`.
pub fn plan_weekly(series: &Series, current_week: u32, target_week: u32) -> Result<ForecastPlan> {
    let horizon = i64::from(target_week) - i64::from(current_week);
    if horizon < 1 || horizon > i64::from(MAX_HORIZON_WEEKS) {
        return Err(ForecastError::InvalidHorizon { horizon });
    }

    ForecastPlan::new(series.restrict(..=target_week), horizon as u32, current_week)
}

/// Plan `horizon` weeks past the last observation, training on the whole
/// series.
///
/// Only an empty series is rejected here; a degenerate series is left for
/// the oracle to refuse.
pub fn plan_full_history(series: &Series, horizon: usize) -> Result<ForecastPlan> {
    let last_week = series
        .last_week()
        .ok_or(ForecastError::InsufficientData { points: 0 })?;
    let output_weeks = u32::try_from(horizon)
        .map_err(|_| ForecastError::InvalidHorizon {
            horizon: i64::try_from(horizon).unwrap_or(i64::MAX),
        })
        .and_then(|h| output_weeks(last_week, h))?;

    Ok(ForecastPlan {
        training: series.clone(),
        horizon: output_weeks.len(),
        output_weeks,
    })
}

/// Plan the main forecast view for a selection
pub fn plan_for_selection(
    series: &Series,
    current_week: u32,
    selection: &Selection,
    training: QuarterlyTraining,
) -> Result<ForecastPlan> {
    match selection.mode {
        ForecastMode::Quarterly => {
            plan_quarterly_with(series, current_week, selection.quarter_count, training)
        }
        ForecastMode::Weekly => plan_weekly(series, current_week, selection.target_week),
    }
}
