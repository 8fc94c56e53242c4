//! CSV Crash Data Loader Module
//! Reads the crash CSV with Polars, parses timestamps, derives the month and
//! drops rows without coordinates.

use crate::config::ColumnConfig;
use crate::data::{CrashDataset, CrashRecord};
use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Date-time layouts tried in order after RFC 3339.
const DATETIME_FORMATS: [&str; 11] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
];

/// Layouts carrying a UTC offset (`+00`, `-0400`, `+05:30`). The local wall
/// clock time is kept.
const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%#z", "%Y/%m/%d %H:%M:%S%#z"];

/// Date-only layouts; the time is taken as midnight.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%d-%b-%Y", "%Y/%m/%d"];

/// Parse a crash timestamp in any of the accepted layouts.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }

    OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.naive_local())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        })
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Loads crash CSV files into a [`CrashDataset`].
pub struct CrashLoader {
    columns: ColumnConfig,
}

impl Default for CrashLoader {
    fn default() -> Self {
        Self::new(ColumnConfig::default())
    }
}

impl CrashLoader {
    pub fn new(columns: ColumnConfig) -> Self {
        Self { columns }
    }

    /// Load a crash CSV.
    ///
    /// Every timestamp must parse, even on rows later dropped for missing
    /// coordinates. No partial dataset is returned on error.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<CrashDataset> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::ResourceNotFound {
                path: path.to_path_buf(),
            });
        }

        debug!("Reading crash CSV at {}", path.display());

        // Schema inference disabled: every column arrives as text
        let df = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .finish()
            .and_then(|lf| lf.collect())
            .map_err(|e| Error::data_format(path.display().to_string(), e.to_string()))?;

        let (records, dropped) = self.records_from_frame(&df)?;

        info!(
            path = %path.display(),
            rows = records.len(),
            dropped,
            "Loaded crash dataset"
        );

        Ok(CrashDataset::from_records(records).with_source(path.to_path_buf(), dropped))
    }

    /// Convert a text-typed frame into records, returning them with the
    /// number of rows dropped for missing coordinates.
    fn records_from_frame(&self, df: &DataFrame) -> Result<(Vec<CrashRecord>, usize)> {
        let cols = &self.columns;

        let dates = Self::text_column(df, &cols.crash_date)?;
        let counties = Self::text_column(df, &cols.county)?;
        let collisions = Self::text_column(df, &cols.collision_type)?;
        let severities = Self::text_column(df, &cols.severity)?;

        // Non-strict cast: unparseable coordinates become null
        let lat_col = Self::required(df, &cols.latitude)?.cast(&DataType::Float64)?;
        let lon_col = Self::required(df, &cols.longitude)?.cast(&DataType::Float64)?;
        let lats = lat_col.f64()?;
        let lons = lon_col.f64()?;

        let mut records = Vec::with_capacity(df.height());
        let mut dropped = 0;

        for i in 0..df.height() {
            let raw_date = dates.get(i).ok_or_else(|| {
                Error::data_format(&cols.crash_date, format!("missing timestamp at row {}", i + 1))
            })?;
            let crash_date = parse_timestamp(raw_date).ok_or_else(|| {
                Error::data_format(
                    &cols.crash_date,
                    format!("cannot parse '{}' at row {}", raw_date, i + 1),
                )
            })?;

            let coords = lats
                .get(i)
                .zip(lons.get(i))
                .filter(|(lat, lon)| !lat.is_nan() && !lon.is_nan());
            let Some((latitude, longitude)) = coords else {
                dropped += 1;
                continue;
            };

            records.push(CrashRecord::new(
                crash_date,
                latitude,
                longitude,
                Self::category(counties.get(i)),
                Self::category(collisions.get(i)),
                Self::category(severities.get(i)),
            ));
        }

        if dropped > 0 {
            debug!("Dropped {} rows without coordinates", dropped);
        }

        Ok((records, dropped))
    }

    fn required<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
        df.column(name)
            .map_err(|_| Error::data_format(name, "required column is missing"))
    }

    fn text_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a StringChunked> {
        Self::required(df, name)?
            .as_materialized_series()
            .str()
            .map_err(|e| Error::data_format(name, e.to_string()))
    }

    /// Empty cells are missing values, not an empty category.
    fn category(value: Option<&str>) -> Option<String> {
        value
            .filter(|v| !v.trim().is_empty())
            .map(str::to_string)
    }
}
