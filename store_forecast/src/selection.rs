//! User-driven dashboard selection
//!
//! The selection is a flat record: any field may change on its own. Each
//! change is tagged with the [`SelectionInput`] it touches so the session can
//! recompute exactly the derived values depending on it.

use crate::data::StoreId;
use crate::error::{ForecastError, Result};
use crate::planner::MAX_HORIZON_WEEKS;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Quarters the forecast may span when nothing else is configured
pub const DEFAULT_MAX_QUARTERS: u32 = 8;

/// How the forecast horizon is chosen
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ForecastMode {
    /// Horizon is a whole number of 13-week quarters
    #[default]
    Quarterly,
    /// Horizon runs up to a target week
    Weekly,
}

impl fmt::Display for ForecastMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForecastMode::Quarterly => write!(f, "quarterly"),
            ForecastMode::Weekly => write!(f, "weekly"),
        }
    }
}

/// Confidence level of the prediction band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ConfidenceLevel {
    P80,
    P85,
    P90,
    #[default]
    P95,
}

impl ConfidenceLevel {
    /// All selectable levels, narrowest first
    pub const ALL: [ConfidenceLevel; 4] = [
        ConfidenceLevel::P80,
        ConfidenceLevel::P85,
        ConfidenceLevel::P90,
        ConfidenceLevel::P95,
    ];

    /// Level in percent
    pub fn percent(self) -> u8 {
        match self {
            ConfidenceLevel::P80 => 80,
            ConfidenceLevel::P85 => 85,
            ConfidenceLevel::P90 => 90,
            ConfidenceLevel::P95 => 95,
        }
    }

    /// Level as a fraction in (0, 1)
    pub fn fraction(self) -> f64 {
        f64::from(self.percent()) / 100.0
    }
}

impl TryFrom<u8> for ConfidenceLevel {
    type Error = ForecastError;

    fn try_from(percent: u8) -> Result<Self> {
        ConfidenceLevel::ALL
            .into_iter()
            .find(|level| level.percent() == percent)
            .ok_or_else(|| {
                ForecastError::InvalidParameter(format!(
                    "Confidence level must be one of 80, 85, 90, 95; got {}",
                    percent
                ))
            })
    }
}

impl From<ConfidenceLevel> for u8 {
    fn from(level: ConfidenceLevel) -> Self {
        level.percent()
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

/// Window sizes of the past-vs-forecast comparison view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonWindow {
    /// Historical weeks shown before the forecast
    pub past_weeks: u32,
    /// Weeks forecast after the last observation
    pub future_weeks: u32,
}

impl Default for ComparisonWindow {
    fn default() -> Self {
        Self {
            past_weeks: 26,
            future_weeks: 13,
        }
    }
}

/// Immutable snapshot of every user control
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Selected store
    pub store: StoreId,
    /// Horizon mode
    pub mode: ForecastMode,
    /// Quarters to forecast in quarterly mode
    pub quarter_count: u32,
    /// Last week to forecast in weekly mode
    pub target_week: u32,
    /// Band confidence level
    pub confidence: ConfidenceLevel,
    /// Whether the comparison view is shown
    pub compare_enabled: bool,
    /// Comparison window sizes
    pub comparison: ComparisonWindow,
}

impl Selection {
    /// Create a selection with default controls for a store
    pub fn new(store: StoreId, target_week: u32) -> Self {
        Self {
            store,
            mode: ForecastMode::default(),
            quarter_count: 1,
            target_week,
            confidence: ConfidenceLevel::default(),
            compare_enabled: false,
            comparison: ComparisonWindow::default(),
        }
    }

    /// Check the bounds the controls are supposed to enforce.
    ///
    /// `target_week > current_week` depends on the selected store's data and
    /// is checked by the planner instead.
    pub fn validate(&self, max_quarters: u32) -> Result<()> {
        if self.quarter_count == 0 || self.quarter_count > max_quarters {
            return Err(ForecastError::InvalidParameter(format!(
                "Quarter count must be between 1 and {}, got {}",
                max_quarters, self.quarter_count
            )));
        }
        if self.target_week == 0 {
            return Err(ForecastError::InvalidParameter(
                "Target week must be at least 1".to_string(),
            ));
        }
        if self.comparison.past_weeks == 0 || self.comparison.future_weeks == 0 {
            return Err(ForecastError::InvalidParameter(
                "Comparison windows must be at least one week".to_string(),
            ));
        }
        if self.comparison.future_weeks > MAX_HORIZON_WEEKS {
            return Err(ForecastError::InvalidParameter(format!(
                "Comparison forecast is limited to {} weeks, got {}",
                MAX_HORIZON_WEEKS, self.comparison.future_weeks
            )));
        }
        Ok(())
    }
}

/// Independent inputs of the recomputation graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SelectionInput {
    Store,
    Mode,
    Horizon,
    Confidence,
    Comparison,
}

impl SelectionInput {
    /// Every input
    pub const ALL: [SelectionInput; 5] = [
        SelectionInput::Store,
        SelectionInput::Mode,
        SelectionInput::Horizon,
        SelectionInput::Confidence,
        SelectionInput::Comparison,
    ];
}

/// A single control change coming from the UI
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionChange {
    Store(StoreId),
    Mode(ForecastMode),
    QuarterCount(u32),
    TargetWeek(u32),
    Confidence(ConfidenceLevel),
    CompareEnabled(bool),
    ComparisonWindow(ComparisonWindow),
}

impl SelectionChange {
    /// Input the change belongs to
    pub fn input(&self) -> SelectionInput {
        match self {
            SelectionChange::Store(_) => SelectionInput::Store,
            SelectionChange::Mode(_) => SelectionInput::Mode,
            SelectionChange::QuarterCount(_) | SelectionChange::TargetWeek(_) => {
                SelectionInput::Horizon
            }
            SelectionChange::Confidence(_) => SelectionInput::Confidence,
            SelectionChange::CompareEnabled(_) | SelectionChange::ComparisonWindow(_) => {
                SelectionInput::Comparison
            }
        }
    }
}

/// Current selection plus the inputs changed since the last recomputation
#[derive(Debug, Clone)]
pub struct SelectionState {
    current: Selection,
    max_quarters: u32,
    pending: BTreeSet<SelectionInput>,
}

impl SelectionState {
    /// Start from a validated selection; every input starts out pending
    pub fn new(selection: Selection, max_quarters: u32) -> Result<Self> {
        selection.validate(max_quarters)?;
        Ok(Self {
            current: selection,
            max_quarters,
            pending: SelectionInput::ALL.into_iter().collect(),
        })
    }

    /// Current selection
    pub fn current(&self) -> &Selection {
        &self.current
    }

    /// Owned copy of the current selection
    pub fn snapshot(&self) -> Selection {
        self.current.clone()
    }

    /// Upper bound on the quarter count
    pub fn max_quarters(&self) -> u32 {
        self.max_quarters
    }

    /// Apply one change.
    ///
    /// Returns whether the selection actually changed. An invalid change
    /// leaves the selection untouched.
    pub fn apply(&mut self, change: SelectionChange) -> Result<bool> {
        let input = change.input();
        let mut next = self.current.clone();
        match change {
            SelectionChange::Store(store) => next.store = store,
            SelectionChange::Mode(mode) => next.mode = mode,
            SelectionChange::QuarterCount(count) => next.quarter_count = count,
            SelectionChange::TargetWeek(week) => next.target_week = week,
            SelectionChange::Confidence(level) => next.confidence = level,
            SelectionChange::CompareEnabled(enabled) => next.compare_enabled = enabled,
            SelectionChange::ComparisonWindow(window) => next.comparison = window,
        }
        next.validate(self.max_quarters)?;

        if next == self.current {
            return Ok(false);
        }
        self.current = next;
        self.pending.insert(input);
        Ok(true)
    }

    /// Whether any input changed since the last [`take_pending`](Self::take_pending)
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drain the changed inputs
    pub fn take_pending(&mut self) -> BTreeSet<SelectionInput> {
        std::mem::take(&mut self.pending)
    }
}
