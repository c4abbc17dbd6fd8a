//! Dashboard configuration
//!
//! Values are merged from three layers, later ones winning:
//! 1. Defaults
//! 2. An optional TOML file
//! 3. Environment variables `STORE_FORECAST_<SECTION>__<KEY>`
//!
//! ```bash
//! export STORE_FORECAST_FORECAST__QUARTERLY_TRAINING=full_history
//! export STORE_FORECAST_SELECTION__CONFIDENCE=90
//! ```

use crate::data::{DataStore, StoreId};
use crate::error::{ForecastError, Result};
use crate::oracle::AutoArimaOracle;
use crate::planner::{QuarterlyTraining, MAX_HORIZON_WEEKS, WEEKS_PER_QUARTER};
use crate::presenter::WeekCalendar;
use crate::selection::{
    ComparisonWindow, ConfidenceLevel, ForecastMode, Selection, DEFAULT_MAX_QUARTERS,
};
use crate::session::SessionSettings;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "STORE_FORECAST";

/// Where the sales table comes from
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DataConfig {
    /// CSV file with `Store`, `Week`, `Weekly_Sales` columns
    pub path: Option<PathBuf>,
    /// Date week 1 starts on, for calendar labels
    pub first_week_start: Option<NaiveDate>,
}

/// Forecasting behaviour
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub quarterly_training: QuarterlyTraining,
    /// Fixed current week; the store's last week when unset
    pub current_week: Option<u32>,
    pub interval_horizon: usize,
    pub max_quarters: u32,
    /// Seasonal period in weeks, or none to skip seasonal differencing
    pub seasonal_period: Option<usize>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            quarterly_training: QuarterlyTraining::default(),
            current_week: None,
            interval_horizon: 52,
            max_quarters: DEFAULT_MAX_QUARTERS,
            seasonal_period: Some(52),
        }
    }
}

/// Initial control values
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Store to open; the first store of the dataset when unset
    pub store: Option<StoreId>,
    pub mode: ForecastMode,
    pub quarter_count: u32,
    /// Target week of weekly mode; one quarter past the current week when unset
    pub target_week: Option<u32>,
    pub confidence: ConfidenceLevel,
    pub compare_enabled: bool,
    pub past_weeks: u32,
    pub future_weeks: u32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        let window = ComparisonWindow::default();
        Self {
            store: None,
            mode: ForecastMode::default(),
            quarter_count: 1,
            target_week: None,
            confidence: ConfidenceLevel::default(),
            compare_enabled: false,
            past_weeks: window.past_weeks,
            future_weeks: window.future_weeks,
        }
    }
}

impl SelectionConfig {
    /// Turn the configured controls into a selection over `data`
    pub fn resolve(&self, data: &DataStore, current_week: Option<u32>) -> Result<Selection> {
        let store = match &self.store {
            Some(store) => store.clone(),
            None => data
                .stores()
                .first()
                .cloned()
                .ok_or_else(|| ForecastError::DataError("Dataset has no stores".to_string()))?,
        };

        let current_week = current_week
            .or_else(|| data.series(&store).ok().and_then(|s| s.last_week()))
            .unwrap_or(0);
        let target_week = self
            .target_week
            .unwrap_or_else(|| current_week.saturating_add(WEEKS_PER_QUARTER));

        Ok(Selection {
            store,
            mode: self.mode,
            quarter_count: self.quarter_count,
            target_week,
            confidence: self.confidence,
            compare_enabled: self.compare_enabled,
            comparison: ComparisonWindow {
                past_weeks: self.past_weeks,
                future_weeks: self.future_weeks,
            },
        })
    }
}

/// Presentation settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PresenterConfig {
    pub histogram_bins: usize,
}

impl Default for PresenterConfig {
    fn default() -> Self {
        Self { histogram_bins: 20 }
    }
}

/// Complete dashboard configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub presenter: PresenterConfig,
}

impl DashboardConfig {
    /// Load defaults, then `path` if given, then the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = config::Config::builder();

        config = config.add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            if !path.exists() {
                return Err(ForecastError::ConfigError(format!(
                    "Config file {} does not exist",
                    path.display()
                )));
            }
            config = config.add_source(config::File::from(path));
        }

        config = config.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let built_config = config.build()?;
        let loaded: Self = built_config.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Check bounds a config file or the environment could break
    pub fn validate(&self) -> Result<()> {
        let forecast = &self.forecast;
        if !(1..=DEFAULT_MAX_QUARTERS).contains(&forecast.max_quarters) {
            return Err(ForecastError::ConfigError(format!(
                "forecast.max_quarters must be between 1 and {}, got {}",
                DEFAULT_MAX_QUARTERS, forecast.max_quarters
            )));
        }
        if forecast.interval_horizon == 0 || forecast.interval_horizon > MAX_HORIZON_WEEKS as usize {
            return Err(ForecastError::ConfigError(format!(
                "forecast.interval_horizon must be between 1 and {}, got {}",
                MAX_HORIZON_WEEKS, forecast.interval_horizon
            )));
        }
        Ok(())
    }

    /// Session knobs derived from the forecast and presenter sections
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            quarterly_training: self.forecast.quarterly_training,
            current_week: self.forecast.current_week,
            interval_horizon: self.forecast.interval_horizon,
            histogram_bins: self.presenter.histogram_bins,
            max_quarters: self.forecast.max_quarters,
        }
    }

    /// Oracle configured with the seasonal period
    pub fn oracle(&self) -> Result<AutoArimaOracle> {
        AutoArimaOracle::new(self.forecast.seasonal_period)
    }

    /// Week labelling for the presenter
    pub fn week_calendar(&self) -> WeekCalendar {
        match self.data.first_week_start {
            Some(start) => WeekCalendar::starting(start),
            None => WeekCalendar::indexed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SalesRecord;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.forecast.interval_horizon, 52);
        assert_eq!(config.forecast.max_quarters, 8);
        assert_eq!(config.forecast.seasonal_period, Some(52));
        assert_eq!(config.presenter.histogram_bins, 20);
        assert_eq!(
            config.forecast.quarterly_training,
            QuarterlyTraining::TargetWindow
        );
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[data]
first_week_start = "2010-02-05"

[forecast]
quarterly_training = "full_history"
current_week = 100

[selection]
store = "7"
mode = "weekly"
confidence = 80
"#
        )
        .unwrap();

        let config = DashboardConfig::load(Some(file.path())).unwrap();
        assert_eq!(
            config.forecast.quarterly_training,
            QuarterlyTraining::FullHistory
        );
        assert_eq!(config.forecast.current_week, Some(100));
        assert_eq!(config.forecast.interval_horizon, 52);
        assert_eq!(config.selection.store, Some(StoreId::from("7")));
        assert_eq!(config.selection.mode, ForecastMode::Weekly);
        assert_eq!(config.selection.confidence, ConfidenceLevel::P80);
        assert_eq!(
            config.data.first_week_start,
            NaiveDate::from_ymd_opt(2010, 2, 5)
        );
    }

    fn load_toml(contents: &str) -> Result<DashboardConfig> {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(file, "{}", contents).unwrap();
        DashboardConfig::load(Some(file.path()))
    }

    #[test]
    fn test_quarter_limit_cannot_be_raised() {
        let err = load_toml("[forecast]\nmax_quarters = 12\n").unwrap_err();
        assert!(matches!(err, ForecastError::ConfigError(_)));
        assert!(load_toml("[forecast]\nmax_quarters = 0\n").is_err());

        let config = load_toml("[forecast]\nmax_quarters = 4\n").unwrap();
        assert_eq!(config.session_settings().max_quarters, 4);
    }

    #[test]
    fn test_interval_horizon_is_bounded() {
        assert!(load_toml("[forecast]\ninterval_horizon = 0\n").is_err());
        assert!(load_toml("[forecast]\ninterval_horizon = 100000\n").is_err());
        assert!(load_toml("[forecast]\ninterval_horizon = 520\n").is_ok());
    }

    #[test]
    fn test_configured_store_is_trimmed() {
        let config = load_toml("[selection]\nstore = \" 7 \"\n").unwrap();
        assert_eq!(config.selection.store, Some(StoreId::from("7")));
    }

    #[test]
    fn test_target_week_near_last_week() {
        let data = DataStore::from_records(vec![
            SalesRecord::new("1", 1, 10.0),
            SalesRecord::new("1", 2, 12.0),
        ])
        .unwrap();
        let selection = SelectionConfig::default()
            .resolve(&data, Some(u32::MAX - 3))
            .unwrap();
        assert_eq!(selection.target_week, u32::MAX);
    }

    #[test]
    fn test_missing_file() {
        let err = DashboardConfig::load(Some(Path::new("/nonexistent/dashboard.toml"))).unwrap_err();
        assert!(matches!(err, ForecastError::ConfigError(_)));
    }

    #[test]
    fn test_resolve_selection_defaults() {
        let data = DataStore::from_records(vec![
            SalesRecord::new("3", 1, 10.0),
            SalesRecord::new("3", 2, 12.0),
            SalesRecord::new("10", 1, 5.0),
        ])
        .unwrap();

        let selection = SelectionConfig::default().resolve(&data, None).unwrap();
        assert_eq!(selection.store, StoreId::from("3"));
        assert_eq!(selection.target_week, 15);

        let selection = SelectionConfig::default().resolve(&data, Some(40)).unwrap();
        assert_eq!(selection.target_week, 53);
    }
}
