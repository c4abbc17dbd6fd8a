//! Render-ready dashboard panels
//!
//! The presenter turns the derived values of a [`DashboardSession`] into
//! chart and table specs. Drawing them is left to the caller; the CLI prints
//! them as text or JSON. A view holding a recoverable error becomes a
//! [`Placeholder`] instead of an empty chart.

use crate::error::{ForecastError, Result};
use crate::oracle::ForecastOracle;
use crate::selection::ForecastMode;
use crate::session::{DashboardSession, ForecastView};
use crate::stitch::{ComparisonSeries, SegmentLabel};
use chrono::{Duration, NaiveDate};
use forecast_math::stats::{HistogramBin, Summary};
use serde::Serialize;
use std::fmt;

/// Visual form of a chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// Weekly history
    Line,
    /// Forecast with a confidence band
    Ribbon,
    /// Distribution of weekly sales
    Histogram,
    /// Past vs forecast comparison
    Bar,
}

/// One x position of a chart series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lower: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper: Option<f64>,
}

impl ChartPoint {
    fn new(label: String, value: f64) -> Self {
        Self {
            label,
            value,
            lower: None,
            upper: None,
        }
    }
}

/// Named series of a chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub name: String,
    pub points: Vec<ChartPoint>,
}

/// A chart with display metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<ChartSeries>,
}

/// A table of preformatted cells
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSpec {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Stand-in for a view that cannot be drawn for the current selection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placeholder {
    pub title: String,
    pub message: String,
}

/// One dashboard panel
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "panel", rename_all = "snake_case")]
pub enum Panel {
    Chart(ChartSpec),
    Table(TableSpec),
    Placeholder(Placeholder),
}

impl Panel {
    /// Title shown above the panel
    pub fn title(&self) -> &str {
        match self {
            Panel::Chart(chart) => &chart.title,
            Panel::Table(table) => &table.title,
            Panel::Placeholder(placeholder) => &placeholder.title,
        }
    }

    fn from_error(title: String, err: &ForecastError) -> Self {
        Panel::Placeholder(Placeholder {
            title,
            message: err.placeholder(),
        })
    }
}

/// Labels week indices, with calendar dates when the first week is known
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WeekCalendar {
    first_week_start: Option<NaiveDate>,
}

impl WeekCalendar {
    /// Label weeks by index only
    pub fn indexed() -> Self {
        Self::default()
    }

    /// Label weeks by the date week 1 starts on
    pub fn starting(first_week_start: NaiveDate) -> Self {
        Self {
            first_week_start: Some(first_week_start),
        }
    }

    /// Start date of a week
    pub fn date(&self, week: u32) -> Option<NaiveDate> {
        let start = self.first_week_start?;
        let offset = Duration::weeks(i64::from(week.checked_sub(1)?));
        start.checked_add_signed(offset)
    }

    /// Axis label of a week
    pub fn label(&self, week: u32) -> String {
        match self.date(week) {
            Some(date) => date.format("%Y-%m-%d").to_string(),
            None => format!("W{}", week),
        }
    }

    fn axis(&self) -> &'static str {
        if self.first_week_start.is_some() {
            "Week starting"
        } else {
            "Week"
        }
    }
}

/// Builds panels from a session
#[derive(Debug, Clone, Default)]
pub struct Presenter {
    calendar: WeekCalendar,
}

impl Presenter {
    pub fn new(calendar: WeekCalendar) -> Self {
        Self { calendar }
    }

    /// Every panel of the dashboard, in display order
    pub fn dashboard<O: ForecastOracle>(&self, session: &DashboardSession<O>) -> Vec<Panel> {
        let store = &session.selection().store;
        let mut panels = Vec::new();

        if let Some(series) = session.series() {
            let title = format!("Weekly sales for store {}", store);
            panels.push(match series {
                Ok(series) => Panel::Chart(ChartSpec {
                    kind: ChartKind::Line,
                    title,
                    x_label: self.calendar.axis().to_string(),
                    y_label: "Weekly sales".to_string(),
                    series: vec![ChartSeries {
                        name: "Actual".to_string(),
                        points: series
                            .points()
                            .iter()
                            .map(|p| ChartPoint::new(self.calendar.label(p.week), p.value))
                            .collect(),
                    }],
                }),
                Err(e) => Panel::from_error(title, e),
            });
        }

        if let Some(summary) = session.summary() {
            let title = format!("Summary for store {}", store);
            panels.push(match summary {
                Ok(summary) => Panel::Table(summary_table(title, summary)),
                Err(e) => Panel::from_error(title, e),
            });
        }

        if let Some(distribution) = session.distribution() {
            let title = format!("Distribution of weekly sales for store {}", store);
            panels.push(match distribution {
                Ok(bins) => Panel::Chart(histogram_chart(title, bins)),
                Err(e) => Panel::from_error(title, e),
            });
        }

        if let Some(forecast) = session.forecast() {
            let selection = session.selection();
            let title = match selection.mode {
                ForecastMode::Quarterly => format!(
                    "Forecast for the next {} quarter(s) at {}",
                    selection.quarter_count, selection.confidence
                ),
                ForecastMode::Weekly => format!(
                    "Forecast to week {} at {}",
                    selection.target_week, selection.confidence
                ),
            };
            panels.push(match forecast {
                Ok(view) => Panel::Chart(self.ribbon_chart(title, view)),
                Err(e) => Panel::from_error(title, e),
            });
        }

        if let Some(interval) = session.interval_forecast() {
            let title = format!(
                "{}-week forecast with {} interval",
                session.settings().interval_horizon,
                session.selection().confidence
            );
            panels.push(match interval {
                Ok(view) => Panel::Chart(self.ribbon_chart(title, view)),
                Err(e) => Panel::from_error(title, e),
            });
        }

        if let Some(comparison) = session.comparison() {
            let window = session.selection().comparison;
            let title = format!(
                "Last {} weeks vs next {} weeks",
                window.past_weeks, window.future_weeks
            );
            panels.push(match comparison {
                Ok(comparison) => Panel::Chart(self.comparison_chart(title, comparison)),
                Err(e) => Panel::from_error(title, e),
            });
        }

        panels
    }

    fn ribbon_chart(&self, title: String, view: &ForecastView) -> ChartSpec {
        let band = view.result.band(view.level);
        let points = view
            .plan
            .output_weeks()
            .iter()
            .zip(view.result.point())
            .enumerate()
            .map(|(i, (&week, &value))| ChartPoint {
                label: self.calendar.label(week),
                value,
                lower: band.map(|b| b.lower[i]),
                upper: band.map(|b| b.upper[i]),
            })
            .collect();

        ChartSpec {
            kind: ChartKind::Ribbon,
            title,
            x_label: self.calendar.axis().to_string(),
            y_label: "Weekly sales".to_string(),
            series: vec![ChartSeries {
                name: format!("Forecast ({})", view.level),
                points,
            }],
        }
    }

    fn comparison_chart(&self, title: String, comparison: &ComparisonSeries) -> ChartSpec {
        let segment = |label: SegmentLabel| ChartSeries {
            name: match label {
                SegmentLabel::Past => "Past".to_string(),
                SegmentLabel::Forecast => "Forecast".to_string(),
            },
            points: comparison
                .points()
                .iter()
                .filter(|p| p.label == label)
                .map(|p| ChartPoint::new(self.calendar.label(p.week), p.value))
                .collect(),
        };

        ChartSpec {
            kind: ChartKind::Bar,
            title,
            x_label: self.calendar.axis().to_string(),
            y_label: "Weekly sales".to_string(),
            series: vec![segment(SegmentLabel::Past), segment(SegmentLabel::Forecast)],
        }
    }
}

fn summary_table(title: String, summary: &Summary) -> TableSpec {
    let row = |name: &str, value: String| vec![name.to_string(), value];
    TableSpec {
        title,
        columns: vec!["Statistic".to_string(), "Value".to_string()],
        rows: vec![
            row("Weeks", summary.count.to_string()),
            row("Total", format!("{:.2}", summary.total)),
            row("Mean", format!("{:.2}", summary.mean)),
            row("Std dev", format!("{:.2}", summary.std_dev)),
            row("Min", format!("{:.2}", summary.min)),
            row("Max", format!("{:.2}", summary.max)),
        ],
    }
}

fn histogram_chart(title: String, bins: &[HistogramBin]) -> ChartSpec {
    ChartSpec {
        kind: ChartKind::Histogram,
        title,
        x_label: "Weekly sales".to_string(),
        y_label: "Weeks".to_string(),
        series: vec![ChartSeries {
            name: "Frequency".to_string(),
            points: bins
                .iter()
                .map(|bin| {
                    ChartPoint::new(
                        format!("{:.0}-{:.0}", bin.lower, bin.upper),
                        bin.count as f64,
                    )
                })
                .collect(),
        }],
    }
}

/// Panels as pretty-printed JSON
pub fn to_json(panels: &[Panel]) -> Result<String> {
    serde_json::to_string_pretty(panels).map_err(|e| ForecastError::DataError(e.to_string()))
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== {} ==", self.title())?;
        match self {
            Panel::Chart(chart) => {
                writeln!(f, "[{:?}] {} by {}", chart.kind, chart.y_label, chart.x_label)?;
                for series in &chart.series {
                    writeln!(f, "{}:", series.name)?;
                    for point in &series.points {
                        write!(f, "  {:>12}  {:>14.2}", point.label, point.value)?;
                        if let (Some(lower), Some(upper)) = (point.lower, point.upper) {
                            write!(f, "  [{:.2}, {:.2}]", lower, upper)?;
                        }
                        writeln!(f)?;
                    }
                }
            }
            Panel::Table(table) => {
                writeln!(f, "{}", table.columns.join(" | "))?;
                for row in &table.rows {
                    writeln!(f, "{}", row.join(" | "))?;
                }
            }
            Panel::Placeholder(placeholder) => {
                writeln!(f, "({})", placeholder.message)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_week_labels() {
        assert_eq!(WeekCalendar::indexed().label(7), "W7");

        let calendar = WeekCalendar::starting(NaiveDate::from_ymd_opt(2010, 2, 5).unwrap());
        assert_eq!(calendar.label(1), "2010-02-05");
        assert_eq!(calendar.label(3), "2010-02-19");
        assert_eq!(calendar.label(0), "W0");
    }

    #[test]
    fn test_placeholder_text() {
        let panel = Panel::from_error(
            "Forecast".to_string(),
            &ForecastError::InsufficientData { points: 1 },
        );
        assert_eq!(panel.to_string(), "== Forecast ==\n(Insufficient data for forecast)\n");
    }

    #[test]
    fn test_panel_json_is_tagged() {
        let panel = Panel::Placeholder(Placeholder {
            title: "Sales".to_string(),
            message: "No data".to_string(),
        });
        let json = to_json(&[panel]).unwrap();
        assert!(json.contains("\"panel\": \"placeholder\""));
    }

    #[test]
    fn test_histogram_labels() {
        let bins = [HistogramBin {
            lower: 10.0,
            upper: 20.0,
            count: 3,
        }];
        let chart = histogram_chart("h".to_string(), &bins);
        assert_eq!(chart.series[0].points[0].label, "10-20");
        assert_eq!(chart.series[0].points[0].value, 3.0);
    }
}
