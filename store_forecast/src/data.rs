//! Weekly sales data loading and normalization

use crate::error::{ForecastError, Result};
use crate::series::{self, Series};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{event, Level};

/// Categorical store identifier.
///
/// Identifiers that look like integers order numerically, so store "2"
/// comes before store "10".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct StoreId(String);

impl StoreId {
    /// Create a store identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    /// Identifier as written in the data source
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for StoreId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl From<StoreId> for String {
    fn from(id: StoreId) -> Self {
        id.0
    }
}

impl From<&str> for StoreId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<u32> for StoreId {
    fn from(id: u32) -> Self {
        Self(id.to_string())
    }
}

impl Ord for StoreId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0.parse::<u64>(), other.0.parse::<u64>()) {
            (Ok(a), Ok(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for StoreId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One week of sales for one store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    /// Store the sales belong to
    pub store: StoreId,
    /// 1-based week index
    pub week: u32,
    /// Sales for the week, never negative
    pub weekly_sales: f64,
}

impl SalesRecord {
    /// Create a new sales record
    pub fn new(store: impl Into<StoreId>, week: u32, weekly_sales: f64) -> Self {
        Self {
            store: store.into(),
            week,
            weekly_sales,
        }
    }
}

/// Row layout of the sales CSV; extra columns are ignored
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Store")]
    store: String,
    #[serde(rename = "Week")]
    week: i64,
    #[serde(rename = "Weekly_Sales")]
    weekly_sales: f64,
}

/// Read-only table of weekly sales, sorted by store then week
#[derive(Debug, Clone)]
pub struct DataStore {
    records: Vec<SalesRecord>,
    stores: Vec<StoreId>,
}

impl DataStore {
    /// Load sales from a CSV file with `Store`, `Week` and `Weekly_Sales` columns
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let store = Self::from_reader(file)?;
        event!(
            Level::INFO,
            path = %path.display(),
            records = store.len(),
            stores = store.stores().len(),
            "loaded weekly sales"
        );
        Ok(store)
    }

    /// Load sales CSV from any reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        for (i, row) in csv_reader.deserialize::<CsvRow>().enumerate() {
            let row = row?;
            // Header is line 1
            let line = i + 2;
            if row.store.is_empty() {
                return Err(ForecastError::DataError(format!(
                    "Missing store id at line {}",
                    line
                )));
            }
            let week = u32::try_from(row.week)
                .ok()
                .filter(|w| *w >= 1)
                .ok_or_else(|| {
                    ForecastError::DataError(format!(
                        "Week must be a positive integer at line {}, got {}",
                        line, row.week
                    ))
                })?;
            records.push(SalesRecord::new(StoreId::new(row.store), week, row.weekly_sales));
        }

        Self::from_records(records)
    }

    /// Build a store from in-memory records, validating and sorting them
    pub fn from_records(mut records: Vec<SalesRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(ForecastError::DataError(
                "No sales records found in data".to_string(),
            ));
        }

        for record in &records {
            if record.week == 0 {
                return Err(ForecastError::DataError(format!(
                    "Week index must start at 1 (store {})",
                    record.store
                )));
            }
            if !record.weekly_sales.is_finite() || record.weekly_sales < 0.0 {
                return Err(ForecastError::DataError(format!(
                    "Invalid weekly sales {} for store {} week {}",
                    record.weekly_sales, record.store, record.week
                )));
            }
        }

        records.sort_by(|a, b| a.store.cmp(&b.store).then(a.week.cmp(&b.week)));

        if let Some(pair) = records
            .windows(2)
            .find(|pair| pair[0].store == pair[1].store && pair[0].week == pair[1].week)
        {
            return Err(ForecastError::DataError(format!(
                "Duplicate record for store {} week {}",
                pair[0].store, pair[0].week
            )));
        }

        let mut stores: Vec<StoreId> = Vec::new();
        for record in &records {
            if stores.last() != Some(&record.store) {
                stores.push(record.store.clone());
            }
        }

        Ok(Self { records, stores })
    }

    /// All records, sorted by store then week
    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    /// Distinct store ids in natural order
    pub fn stores(&self) -> &[StoreId] {
        &self.stores
    }

    /// Whether any record belongs to the store
    pub fn contains_store(&self, store: &StoreId) -> bool {
        self.stores.binary_search(store).is_ok()
    }

    /// Weekly series of one store
    pub fn series(&self, store: &StoreId) -> Result<Series> {
        let start = self.records.partition_point(|r| r.store < *store);
        let end = self.records.partition_point(|r| r.store <= *store);
        series::filter(&self.records[start..end], store)
    }

    /// Check if the store holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_ids_order_naturally() {
        let mut ids: Vec<StoreId> = ["10", "2", "b", "1", "a"].into_iter().map(StoreId::from).collect();
        ids.sort();
        let ordered: Vec<&str> = ids.iter().map(StoreId::as_str).collect();
        assert_eq!(ordered, vec!["1", "2", "10", "a", "b"]);
    }

    #[test]
    fn test_store_id_deserialization_trims() {
        let id: StoreId = serde_json::from_str("\" 1 \"").unwrap();
        assert_eq!(id, StoreId::from("1"));
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"1\"");
    }

    #[test]
    fn test_records_are_sorted_and_grouped() {
        let store = DataStore::from_records(vec![
            SalesRecord::new("2", 2, 20.0),
            SalesRecord::new("10", 1, 5.0),
            SalesRecord::new("2", 1, 10.0),
        ])
        .unwrap();

        assert_eq!(store.stores(), &[StoreId::from("2"), StoreId::from("10")]);
        assert_eq!(store.records()[0], SalesRecord::new("2", 1, 10.0));
        assert_eq!(store.series(&StoreId::from("2")).unwrap().len(), 2);
        assert_eq!(store.series(&StoreId::from("10")).unwrap().len(), 1);
        assert!(store.contains_store(&StoreId::from("10")));
        assert!(!store.contains_store(&StoreId::from("3")));
    }

    #[test]
    fn test_invalid_records_are_rejected() {
        assert!(DataStore::from_records(vec![]).is_err());
        assert!(DataStore::from_records(vec![SalesRecord::new("1", 0, 1.0)]).is_err());
        assert!(DataStore::from_records(vec![SalesRecord::new("1", 1, -1.0)]).is_err());
        assert!(DataStore::from_records(vec![SalesRecord::new("1", 1, f64::NAN)]).is_err());
        assert!(DataStore::from_records(vec![
            SalesRecord::new("1", 1, 1.0),
            SalesRecord::new("1", 1, 2.0),
        ])
        .is_err());
    }

    #[test]
    fn test_missing_store_is_empty_selection() {
        let store = DataStore::from_records(vec![SalesRecord::new("1", 1, 1.0)]).unwrap();
        assert_eq!(
            store.series(&StoreId::from("9")).unwrap_err(),
            ForecastError::EmptySelection {
                store: "9".to_string()
            }
        );
    }
}
