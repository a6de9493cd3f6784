//! Row extraction from the CSV exports.
//!
//! Each source file is read with every column as a string, projected to the
//! columns its row type declares, and converted into typed rows. A missing
//! declared column fails before any row is converted.

pub mod rows;

use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::debug;

use crate::convert::{is_missing, MISSING_MARKER};
use crate::error::{EtlError, Result};

pub use rows::{
    CircuitRow, ConstructorResultRow, ConstructorRow, ConstructorStandingRow, DriverCategoryRow,
    DriverRatingRow, DriverRow, DriverStandingRow, LapTimeRow, QualifyingRow, RaceRow, ResultRow,
    StatusRow,
};

/// A typed row of one source file.
pub trait SourceRow: Sized {
    /// File name inside the data directory
    const FILE: &'static str;
    /// Required columns, in projection order
    const COLUMNS: &'static [&'static str];

    fn from_record(record: &Record<'_>) -> Result<Self>;
}

/// One projected CSV line, with typed accessors that report file/row context.
pub struct Record<'a> {
    file: &'static str,
    row: usize,
    columns: &'static [&'static str],
    values: Vec<Option<&'a str>>,
}

impl<'a> Record<'a> {
    pub fn new(
        file: &'static str,
        row: usize,
        columns: &'static [&'static str],
        values: Vec<Option<&'a str>>,
    ) -> Self {
        Self {
            file,
            row,
            columns,
            values,
        }
    }

    /// Raw cell, `None` when null.
    pub fn raw(&self, column: &str) -> Option<&'a str> {
        self.columns
            .iter()
            .position(|c| *c == column)
            .and_then(|i| self.values.get(i).copied().flatten())
    }

    /// Required text cell.
    pub fn text(&self, column: &str) -> Result<String> {
        match self.raw(column) {
            Some(v) if v.trim() != MISSING_MARKER => Ok(v.to_string()),
            _ => Err(self.missing(column)),
        }
    }

    /// Required integer cell.
    pub fn int(&self, column: &str) -> Result<i64> {
        let value = self.required(column)?;
        value.trim().parse().map_err(|_| self.invalid(column, value))
    }

    /// Required decimal cell.
    pub fn float(&self, column: &str) -> Result<f64> {
        let value = self.required(column)?;
        value.trim().parse().map_err(|_| self.invalid(column, value))
    }

    fn required(&self, column: &str) -> Result<&'a str> {
        let value = self.raw(column);
        if is_missing(value) {
            return Err(self.missing(column));
        }
        Ok(value.unwrap_or_default())
    }

    fn missing(&self, column: &str) -> EtlError {
        EtlError::MissingValue {
            file: self.file.to_string(),
            row: self.row,
            column: column.to_string(),
        }
    }

    fn invalid(&self, column: &str, value: &str) -> EtlError {
        EtlError::InvalidField {
            file: self.file.to_string(),
            row: self.row,
            column: column.to_string(),
            value: value.to_string(),
        }
    }
}

/// Location of the CSV exports.
#[derive(Debug, Clone)]
pub struct DataSources {
    dir: PathBuf,
}

impl DataSources {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Whether the source file of a row type is present.
    pub fn has<R: SourceRow>(&self) -> bool {
        self.path(R::FILE).is_file()
    }

    /// Extract all rows of one source file.
    pub fn extract<R: SourceRow>(&self) -> Result<Vec<R>> {
        extract_file(&self.path(R::FILE))
    }
}

/// Read a CSV file and convert each line to `R`.
pub fn extract_file<R: SourceRow>(path: &Path) -> Result<Vec<R>> {
    if !path.is_file() {
        return Err(EtlError::SourceNotFound(path.to_path_buf()));
    }

    // Schema inference disabled: every column is read as a string
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    for column in R::COLUMNS {
        if df.get_column_index(column).is_none() {
            return Err(EtlError::MissingColumn {
                file: R::FILE.to_string(),
                column: column.to_string(),
            });
        }
    }

    let projected = df.select(R::COLUMNS.iter().copied())?;
    let columns = R::COLUMNS
        .iter()
        .map(|name| projected.column(name).and_then(|c| c.str()))
        .collect::<PolarsResult<Vec<_>>>()?;

    let mut rows = Vec::with_capacity(projected.height());
    for i in 0..projected.height() {
        let values = columns.iter().map(|c| c.get(i)).collect();
        // Row numbers are 1-based and skip the header
        let record = Record::new(R::FILE, i + 1, R::COLUMNS, values);
        rows.push(R::from_record(&record)?);
    }

    debug!("Extracted {} rows from {}", rows.len(), R::FILE);
    Ok(rows)
}
