//! Error types for the ETL pipeline and model fitting.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, EtlError>;

/// Errors raised while extracting, transforming, loading or featurizing data.
#[derive(Error, Debug)]
pub enum EtlError {
    /// Source file does not exist
    #[error("Source file not found: {0}")]
    SourceNotFound(PathBuf),

    /// Required column absent from a source header
    #[error("{file}: missing required column '{column}'")]
    MissingColumn { file: String, column: String },

    /// Required cell is null or a missing-value marker
    #[error("{file} row {row}: missing value for '{column}'")]
    MissingValue {
        file: String,
        row: usize,
        column: String,
    },

    /// Required cell does not parse as its declared type
    #[error("{file} row {row}: invalid value '{value}' for '{column}'")]
    InvalidField {
        file: String,
        row: usize,
        column: String,
        value: String,
    },

    /// Sentinel-aware scalar that is neither a sentinel nor parseable
    #[error("Malformed {kind}: '{value}'")]
    Malformed { kind: &'static str, value: String },

    /// No driver-constructor identity for the requested key
    #[error(
        "No driver constructor for driver {driver_id}, constructor {constructor_id}, year {year:?}"
    )]
    UnresolvedIdentity {
        driver_id: i64,
        constructor_id: i64,
        year: Option<i64>,
    },

    /// Year-less identity lookup matched several seasons
    #[error(
        "Driver {driver_id} drove for constructor {constructor_id} in {candidates} seasons; a year is required"
    )]
    AmbiguousIdentity {
        driver_id: i64,
        constructor_id: i64,
        candidates: usize,
    },

    /// More than one label row for a driver-season
    #[error("{count} {table} rows for driver {driver_id} in {year}")]
    DuplicateLabel {
        table: &'static str,
        driver_id: i64,
        year: i64,
        count: usize,
    },

    /// Any other cross-reference that could not be resolved
    #[error("Unresolved {entity} reference: {key}")]
    UnresolvedReference { entity: &'static str, key: String },

    /// Aggregate row absent for a driver-season
    #[error("No {view} row for driver {driver_id} in {year}")]
    MissingAggregate {
        view: &'static str,
        driver_id: i64,
        year: i64,
    },

    #[error("Driver not found: {0}")]
    DriverNotFound(i64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("CSV error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EtlError {
    /// Whether this error only means a driver-season cannot be featurized.
    pub fn is_missing_aggregate(&self) -> bool {
        matches!(self, EtlError::MissingAggregate { .. })
    }
}
