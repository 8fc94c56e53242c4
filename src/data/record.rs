//! Crash record types.

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One reported collision. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrashRecord {
    pub crash_date: NaiveDateTime,
    /// Calendar month of `crash_date`, 1-12.
    pub month: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub county: Option<String>,
    pub collision_type: Option<String>,
    pub severity: Option<String>,
}

impl CrashRecord {
    /// Build a record, deriving the month from the timestamp.
    pub fn new(
        crash_date: NaiveDateTime,
        latitude: f64,
        longitude: f64,
        county: Option<String>,
        collision_type: Option<String>,
        severity: Option<String>,
    ) -> Self {
        Self {
            month: crash_date.month(),
            crash_date,
            latitude,
            longitude,
            county,
            collision_type,
            severity,
        }
    }
}

/// Categorical fields a pie chart can break crashes down by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CategoryField {
    #[default]
    County,
    CollisionType,
}

impl CategoryField {
    pub const ALL: [CategoryField; 2] = [CategoryField::County, CategoryField::CollisionType];

    /// Raw value of this field on a record; `None` when the cell was empty.
    pub fn value<'a>(&self, record: &'a CrashRecord) -> Option<&'a str> {
        match self {
            Self::County => record.county.as_deref(),
            Self::CollisionType => record.collision_type.as_deref(),
        }
    }

    /// Label for the pie-detail selector.
    pub fn label(&self) -> &'static str {
        match self {
            Self::County => "By County",
            Self::CollisionType => "By Collision Type",
        }
    }

    /// Chart title.
    pub fn title(&self) -> &'static str {
        match self {
            Self::County => "Accidents by County",
            Self::CollisionType => "Accidents by Collision Type",
        }
    }
}

/// Ordered, read-only collection of crash records for one session.
#[derive(Debug, Clone, Default)]
pub struct CrashDataset {
    records: Vec<CrashRecord>,
    source: Option<PathBuf>,
    dropped: usize,
}

impl CrashDataset {
    /// Wrap already-cleaned records.
    pub fn from_records(records: Vec<CrashRecord>) -> Self {
        Self {
            records,
            source: None,
            dropped: 0,
        }
    }

    pub(crate) fn with_source(mut self, source: PathBuf, dropped: usize) -> Self {
        self.source = Some(source);
        self.dropped = dropped;
        self
    }

    pub fn records(&self) -> &[CrashRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CrashRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// File the records were loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Rows discarded at load time for missing coordinates.
    pub fn dropped_rows(&self) -> usize {
        self.dropped
    }
}

impl<'a> IntoIterator for &'a CrashDataset {
    type Item = &'a CrashRecord;
    type IntoIter = std::slice::Iter<'a, CrashRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(month: u32, county: Option<&str>) -> CrashRecord {
        let date = NaiveDate::from_ymd_opt(2017, month, 14)
            .and_then(|d| d.and_hms_opt(8, 30, 0))
            .unwrap();
        CrashRecord::new(
            date,
            42.36,
            -71.06,
            county.map(str::to_string),
            Some("Rear-end".to_string()),
            Some("Property damage only (none injured)".to_string()),
        )
    }

    #[test]
    fn test_record_derives_month() {
        assert_eq!(record(10, None).month, 10);
        assert_eq!(record(1, None).month, 1);
    }

    #[test]
    fn test_category_field_value() {
        let r = record(3, Some("MIDDLESEX"));
        assert_eq!(CategoryField::County.value(&r), Some("MIDDLESEX"));
        assert_eq!(CategoryField::CollisionType.value(&r), Some("Rear-end"));

        let r = record(3, None);
        assert_eq!(CategoryField::County.value(&r), None);
    }

    #[test]
    fn test_category_field_labels() {
        assert_eq!(CategoryField::County.label(), "By County");
        assert_eq!(CategoryField::CollisionType.title(), "Accidents by Collision Type");
        assert_eq!(CategoryField::default(), CategoryField::County);
    }

    #[test]
    fn test_dataset_accessors() {
        let dataset = CrashDataset::from_records(vec![record(1, None), record(2, None)])
            .with_source(PathBuf::from("crashes.csv"), 3);

        assert_eq!(dataset.len(), 2);
        assert!(!dataset.is_empty());
        assert_eq!(dataset.source(), Some(Path::new("crashes.csv")));
        assert_eq!(dataset.dropped_rows(), 3);
        assert_eq!((&dataset).into_iter().count(), 2);
        assert!(CrashDataset::default().is_empty());
    }
}
