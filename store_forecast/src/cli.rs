//! Command-line interface of the `store_dashboard` binary.
//!
//! Flags override the loaded configuration; anything left unset keeps the
//! configured value.

use crate::config::DashboardConfig;
use crate::data::StoreId;
use crate::selection::{ConfidenceLevel, ForecastMode};
use clap::Parser;
use std::path::PathBuf;

/// Weekly store sales with forecasts and confidence bands.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file.
    #[arg(short, long, env = "STORE_FORECAST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Sales CSV with Store, Week and Weekly_Sales columns.
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Store to show.
    #[arg(short, long)]
    pub store: Option<String>,

    /// Forecast horizon mode.
    #[arg(short, long, value_enum)]
    pub mode: Option<ForecastMode>,

    /// Quarters to forecast in quarterly mode.
    #[arg(short, long)]
    pub quarters: Option<u32>,

    /// Last week to forecast in weekly mode.
    #[arg(short, long)]
    pub target_week: Option<u32>,

    /// Confidence level of the band: 80, 85, 90 or 95.
    #[arg(short, long, value_parser = parse_level)]
    pub level: Option<ConfidenceLevel>,

    /// Show the past-vs-forecast comparison.
    #[arg(long)]
    pub compare: bool,

    /// History weeks in the comparison.
    #[arg(long)]
    pub past_weeks: Option<u32>,

    /// Forecast weeks in the comparison.
    #[arg(long)]
    pub future_weeks: Option<u32>,

    /// Use a synthetic dataset with this many stores instead of a CSV.
    #[arg(long, value_name = "STORES")]
    pub demo: Option<usize>,

    /// Print panels as JSON.
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn import() -> Result<Self, clap::Error> {
        Self::try_parse()
    }

    /// Layer the given flags over `config`
    pub fn apply_to(&self, config: &mut DashboardConfig) {
        if let Some(path) = &self.data {
            config.data.path = Some(path.clone());
        }

        let selection = &mut config.selection;
        if let Some(store) = &self.store {
            selection.store = Some(StoreId::new(store.as_str()));
        }
        if let Some(mode) = self.mode {
            selection.mode = mode;
        }
        if let Some(quarters) = self.quarters {
            selection.quarter_count = quarters;
        }
        if let Some(week) = self.target_week {
            selection.target_week = Some(week);
        }
        if let Some(level) = self.level {
            selection.confidence = level;
        }
        if self.compare {
            selection.compare_enabled = true;
        }
        if let Some(weeks) = self.past_weeks {
            selection.past_weeks = weeks;
        }
        if let Some(weeks) = self.future_weeks {
            selection.future_weeks = weeks;
        }
    }
}

fn parse_level(s: &str) -> Result<ConfidenceLevel, String> {
    let percent: u8 = s
        .trim()
        .trim_end_matches('%')
        .parse()
        .map_err(|e: std::num::ParseIntError| e.to_string())?;
    ConfidenceLevel::try_from(percent).map_err(|e| e.to_string())
}
