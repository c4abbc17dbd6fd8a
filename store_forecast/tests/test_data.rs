use std::io::Write;
use store_forecast::series::filter;
use store_forecast::{DataStore, ForecastError, SalesRecord, StoreId};
use tempfile::NamedTempFile;

fn write_csv(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file
}

#[test]
fn test_load_sales_csv() {
    let file = write_csv(&[
        "Store,Week,Weekly_Sales,Holiday_Flag",
        "2,2,1200.5,0",
        "10,1,800.0,0",
        "2,1,1100.0,1",
        "10,2,810.0,0",
    ]);

    let data = DataStore::from_csv(file.path()).unwrap();
    assert_eq!(data.len(), 4);
    assert_eq!(data.stores(), &[StoreId::from("2"), StoreId::from("10")]);

    let series = data.series(&StoreId::from("2")).unwrap();
    assert_eq!(series.weeks(), vec![1, 2]);
    assert_eq!(series.values(), vec![1100.0, 1200.5]);
}

#[test]
fn test_missing_file() {
    let err = DataStore::from_csv("nonexistent_sales.csv").unwrap_err();
    assert!(matches!(err, ForecastError::IoError(_)));
}

#[test]
fn test_missing_column() {
    let file = write_csv(&["Store,Week", "1,1"]);
    let err = DataStore::from_csv(file.path()).unwrap_err();
    assert!(matches!(err, ForecastError::Csv(_)));
}

#[test]
fn test_invalid_rows() {
    let negative = write_csv(&["Store,Week,Weekly_Sales", "1,1,-5.0"]);
    assert!(matches!(
        DataStore::from_csv(negative.path()),
        Err(ForecastError::DataError(_))
    ));

    let week_zero = write_csv(&["Store,Week,Weekly_Sales", "1,0,5.0"]);
    assert!(DataStore::from_csv(week_zero.path()).is_err());

    let duplicate = write_csv(&["Store,Week,Weekly_Sales", "1,3,5.0", "1,3,6.0"]);
    assert!(matches!(
        DataStore::from_csv(duplicate.path()),
        Err(ForecastError::DataError(_))
    ));

    let header_only = write_csv(&["Store,Week,Weekly_Sales"]);
    assert!(DataStore::from_csv(header_only.path()).is_err());
}

#[test]
fn test_filter_unknown_store() {
    let records = vec![
        SalesRecord::new("1", 1, 10.0),
        SalesRecord::new("1", 2, 11.0),
    ];

    let err = filter(&records, &StoreId::from("9")).unwrap_err();
    assert_eq!(
        err,
        ForecastError::EmptySelection {
            store: "9".to_string()
        }
    );
    assert_eq!(err.placeholder(), "No data available for store 9");

    let data = DataStore::from_records(records).unwrap();
    assert!(!data.contains_store(&StoreId::from("9")));
    assert!(data.series(&StoreId::from("9")).is_err());
}

#[test]
fn test_filter_orders_by_week() {
    let records = vec![
        SalesRecord::new("1", 3, 30.0),
        SalesRecord::new("2", 1, 99.0),
        SalesRecord::new("1", 1, 10.0),
        SalesRecord::new("1", 2, 20.0),
    ];

    let series = filter(&records, &StoreId::from("1")).unwrap();
    assert_eq!(series.weeks(), vec![1, 2, 3]);
    assert_eq!(series.values(), vec![10.0, 20.0, 30.0]);
}
