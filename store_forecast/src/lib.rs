//! # Store Forecast
//!
//! Core of an interactive weekly sales dashboard: pick a store and a
//! forecast horizon, and get the store's history next to a forecast with
//! confidence bands.
//!
//! ## Features
//!
//! - Weekly sales loading and normalization from CSV ([`DataStore`])
//! - Per-store series projection ([`series::filter`])
//! - Forecast window planning for quarterly, weekly and full-history views ([`planner`])
//! - Past-vs-forecast stitching ([`stitch::stitch`])
//! - A pluggable forecasting oracle with an auto-fitting ARIMA default ([`ForecastOracle`])
//! - Reactive recomputation over a declared dependency graph, with stale
//!   forecast results discarded ([`DashboardSession`])
//! - Render-ready chart and table specs with placeholders ([`presenter`])
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use store_forecast::{synthetic, AutoArimaOracle, DashboardSession, Selection, SessionSettings};
//! use store_forecast::{ForecastMode, SelectionChange, StoreId};
//!
//! let data = Arc::new(synthetic::generate_sales(2, 60, 1)?);
//! let mut selection = Selection::new(StoreId::from("1"), 64);
//! selection.mode = ForecastMode::Weekly;
//!
//! let mut session = DashboardSession::new(
//!     data,
//!     AutoArimaOracle::default(),
//!     selection,
//!     SessionSettings::default(),
//! )?;
//! assert!(matches!(session.forecast(), Some(Ok(_))));
//!
//! // Switching store recomputes everything for the new store
//! session.apply(SelectionChange::Store(StoreId::from("2")))?;
//! # Ok::<(), store_forecast::ForecastError>(())
//! ```

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod graph;
pub mod oracle;
pub mod planner;
pub mod presenter;
pub mod selection;
pub mod series;
pub mod session;
pub mod stitch;
pub mod synthetic;

// Re-export commonly used types
pub use crate::cli::Cli;
pub use crate::config::DashboardConfig;
pub use crate::data::{DataStore, SalesRecord, StoreId};
pub use crate::error::{ForecastError, Result};
pub use crate::graph::{DependencyGraph, Node};
pub use crate::oracle::{AutoArimaOracle, CancellationToken, ForecastOracle, ForecastResult};
pub use crate::planner::{ForecastPlan, QuarterlyTraining};
pub use crate::selection::{
    ComparisonWindow, ConfidenceLevel, ForecastMode, Selection, SelectionChange,
};
pub use crate::series::Series;
pub use crate::session::{DashboardSession, ForecastTicket, SessionSettings};
pub use crate::stitch::{ComparisonSeries, SegmentLabel};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
