use approx::assert_relative_eq;
use std::io::Write;
use std::sync::Arc;
use store_forecast::presenter::{self, ChartKind, Panel, Presenter};
use store_forecast::{
    synthetic, ConfidenceLevel, DashboardConfig, DashboardSession, DataStore, ForecastMode,
    SelectionChange, StoreId,
};
use tempfile::NamedTempFile;

// Two stores, 30 weeks each, with a trend and a short cycle
fn create_sales_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Store,Week,Weekly_Sales").unwrap();
    for week in 1..=30u32 {
        let w = f64::from(week);
        writeln!(file, "1,{},{:.2}", week, 20000.0 + 150.0 * w + (w * 1.1).sin() * 900.0).unwrap();
        writeln!(file, "2,{},{:.2}", week, 8000.0 + 40.0 * w + (w * 0.7).cos() * 300.0).unwrap();
    }
    file
}

#[test]
fn test_dashboard_from_csv() {
    let file = create_sales_file();
    let mut config = DashboardConfig::default();
    config.data.path = Some(file.path().to_path_buf());
    config.selection.mode = ForecastMode::Weekly;
    config.selection.compare_enabled = true;
    config.forecast.seasonal_period = None;

    let data = Arc::new(DataStore::from_csv(file.path()).unwrap());
    let selection = config.selection.resolve(&data, config.forecast.current_week).unwrap();
    assert_eq!(selection.store, StoreId::from("1"));
    assert_eq!(selection.target_week, 43);

    let mut session = DashboardSession::new(
        data,
        config.oracle().unwrap(),
        selection,
        config.session_settings(),
    )
    .unwrap();

    let summary = session.summary().unwrap().as_ref().unwrap();
    assert_eq!(summary.count, 30);
    assert!(summary.min > 19000.0);

    let forecast = session.forecast().unwrap().as_ref().unwrap();
    assert_eq!(forecast.result.len(), 13);
    assert_eq!(forecast.plan.output_weeks()[0], 31);
    let band = forecast.result.band(ConfidenceLevel::P95).unwrap();
    for i in 0..13 {
        assert!(band.lower[i] <= forecast.result.point()[i]);
        assert!(forecast.result.point()[i] <= band.upper[i]);
    }

    let panels = Presenter::new(config.week_calendar()).dashboard(&session);
    let kinds: Vec<Option<ChartKind>> = panels
        .iter()
        .map(|panel| match panel {
            Panel::Chart(chart) => Some(chart.kind),
            _ => None,
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            Some(ChartKind::Line),
            None,
            Some(ChartKind::Histogram),
            Some(ChartKind::Ribbon),
            Some(ChartKind::Ribbon),
            Some(ChartKind::Bar),
        ]
    );

    session
        .apply(SelectionChange::Store(StoreId::from("2")))
        .unwrap();
    let summary = session.summary().unwrap().as_ref().unwrap();
    assert!(summary.max < 10000.0);

    let json = presenter::to_json(&Presenter::default().dashboard(&session)).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.as_array().map(Vec::len), Some(6));
    assert_eq!(parsed[0]["kind"], "line");
}

#[test]
fn test_linear_sales_forecast_continues_trend() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Store,Week,Weekly_Sales").unwrap();
    for week in 1..=20u32 {
        writeln!(file, "A,{},{}", week, 1000 + 10 * week).unwrap();
    }

    let data = Arc::new(DataStore::from_csv(file.path()).unwrap());
    let mut config = DashboardConfig::default();
    config.selection.mode = ForecastMode::Weekly;
    config.selection.target_week = Some(23);
    config.forecast.seasonal_period = None;

    let selection = config.selection.resolve(&data, None).unwrap();
    let session = DashboardSession::new(
        data,
        config.oracle().unwrap(),
        selection,
        config.session_settings(),
    )
    .unwrap();

    let forecast = session.forecast().unwrap().as_ref().unwrap();
    assert_eq!(forecast.plan.output_weeks(), &[21, 22, 23]);
    assert_relative_eq!(forecast.result.point()[0], 1210.0, epsilon = 1e-6);
    assert_relative_eq!(forecast.result.point()[2], 1230.0, epsilon = 1e-6);
}

#[test]
fn test_synthetic_dashboard_end_to_end() {
    let data = Arc::new(synthetic::generate_sales(3, 143, 2010).unwrap());
    let mut config = DashboardConfig::default();
    config.forecast.quarterly_training = store_forecast::QuarterlyTraining::FullHistory;
    config.selection.quarter_count = 2;
    config.selection.compare_enabled = true;

    let selection = config.selection.resolve(&data, None).unwrap();
    let session = DashboardSession::new(
        data,
        config.oracle().unwrap(),
        selection,
        config.session_settings(),
    )
    .unwrap();

    let forecast = session.forecast().unwrap().as_ref().unwrap();
    assert_eq!(forecast.result.len(), 26);
    assert_eq!(forecast.plan.output_weeks()[0], 144);

    let comparison = session.comparison().unwrap().as_ref().unwrap();
    assert_eq!(comparison.past().len(), 26);
    assert_eq!(comparison.forecast().len(), 13);

    let text: String = Presenter::default()
        .dashboard(&session)
        .iter()
        .map(ToString::to_string)
        .collect();
    assert!(text.contains("Weekly sales for store 1"));
}
