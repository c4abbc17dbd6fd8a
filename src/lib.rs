//! # Store Forecast Workspace
//!
//! Facade over the workspace crates:
//!
//! - [`math`]: statistics and the auto-fitting ARIMA estimator
//! - [`dashboard`]: the reactive store sales dashboard core
//!
//! ## Example
//!
//! ```
//! use store_forecast_workspace::dashboard::{planner, series::filter, SalesRecord, StoreId};
//!
//! let records: Vec<SalesRecord> = (1..=10)
//!     .map(|week| SalesRecord::new("1", week, 100.0 + 10.0 * f64::from(week - 1)))
//!     .collect();
//! let series = filter(&records, &StoreId::from("1")).unwrap();
//!
//! let plan = planner::plan_weekly(&series, 10, 14).unwrap();
//! assert_eq!(plan.output_weeks(), &[11, 12, 13, 14]);
//! ```

pub use forecast_math as math;
pub use store_forecast as dashboard;
