//! Error types for the analysis pipeline.
//!
//! Each stage has its own error enum so that callers can tell a fatal
//! load failure apart from a chart that failed in isolation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building or mutating a [`crate::dataset::Table`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TableError {
    #[error("column '{0}' already exists")]
    DuplicateColumn(String),
    #[error("column '{name}' has {actual} rows, table has {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
}

/// Errors raised while loading a delimited file into a table.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed record {record} in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        record: u64,
        #[source]
        source: csv::Error,
    },
    #[error("required column '{0}' is missing")]
    MissingColumn(String),
    #[error("column '{column}' row {row}: expected a number, found '{value}'")]
    NotNumeric {
        column: String,
        row: usize,
        value: String,
    },
    #[error(transparent)]
    Table(#[from] TableError),
}

/// Errors raised while deriving the composite score.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DeriveError {
    #[error("component column '{0}' is missing")]
    MissingComponent(String),
    #[error("component column '{0}' is not numeric")]
    NonNumericComponent(String),
    #[error(transparent)]
    Table(#[from] TableError),
}

/// Errors raised by the aggregation and selection stages.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("column '{0}' is missing")]
    MissingColumn(String),
    #[error("column '{0}' is not numeric")]
    NotNumeric(String),
    #[error("column '{0}' is not a text column")]
    NotText(String),
}

/// Errors raised while rendering a single chart.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("chart '{chart}' binds unknown column '{column}'")]
    UnknownColumn { chart: String, column: String },
    #[error("chart '{chart}' binds column '{column}' as {expected}, but it is not")]
    WrongType {
        chart: String,
        column: String,
        expected: &'static str,
    },
    #[error("chart '{chart}' binds column '{column}' with no values")]
    AllMissing { chart: String, column: String },
    #[error("chart '{chart}' has no data to draw")]
    Empty { chart: String },
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
