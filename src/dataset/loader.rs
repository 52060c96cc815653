//! Delimited-file loading.
//!
//! Reads every record as text first, then types each column: required
//! numeric columns must parse as `f64`, required text columns stay text,
//! and any other column becomes numeric when all of its non-empty cells
//! parse.

use super::{Column, Table};
use crate::error::LoadError;
use crate::models::{REQUIRED_NUMERIC, REQUIRED_TEXT};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Options for reading a delimited file.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub delimiter: u8,
    /// Columns that must be present and numeric.
    pub numeric: Vec<String>,
    /// Columns that must be present and are kept as text.
    pub text: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            numeric: REQUIRED_NUMERIC.iter().map(|s| s.to_string()).collect(),
            text: REQUIRED_TEXT.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Tokens read as a missing value.
fn is_missing(cell: &str) -> bool {
    cell.is_empty()
        || cell.eq_ignore_ascii_case("na")
        || cell.eq_ignore_ascii_case("nan")
        || cell.eq_ignore_ascii_case("null")
}

/// Load a delimited file into a [`Table`].
pub fn load_table(path: &Path, options: &LoadOptions) -> Result<Table, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| open_error(path, e))?;

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            record: 0,
            source,
        })?
        .iter()
        .map(|h| h.to_string())
        .collect();

    for required in options.text.iter().chain(options.numeric.iter()) {
        if !headers.iter().any(|h| h == required) {
            return Err(LoadError::MissingColumn(required.clone()));
        }
    }

    let mut raw: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for (i, result) in rdr.records().enumerate() {
        let record = result.map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            record: i as u64 + 1,
            source,
        })?;
        for (j, field) in record.iter().enumerate() {
            raw[j].push(field.to_string());
        }
    }

    let mut columns = Vec::with_capacity(headers.len());
    for (name, cells) in headers.into_iter().zip(raw) {
        let column = if options.numeric.contains(&name) {
            parse_numeric(name, &cells)?
        } else if options.text.contains(&name) {
            to_text(name, cells)
        } else {
            infer(name, cells)
        };
        debug!(
            "Column '{}': {} ({} present)",
            column.name,
            if column.is_numeric() { "numeric" } else { "text" },
            column.data.present()
        );
        columns.push(column);
    }

    let table = Table::new(columns)?;
    info!(
        "Loaded {} rows x {} columns from {}",
        table.n_rows(),
        table.n_columns(),
        path.display()
    );
    Ok(table)
}

fn open_error(path: &Path, err: csv::Error) -> LoadError {
    let path: PathBuf = path.to_path_buf();
    match err.into_kind() {
        csv::ErrorKind::Io(source) => LoadError::Io { path, source },
        other => LoadError::Io {
            path,
            source: std::io::Error::new(std::io::ErrorKind::Other, format!("{:?}", other)),
        },
    }
}

fn parse_numeric(name: String, cells: &[String]) -> Result<Column, LoadError> {
    let mut values = Vec::with_capacity(cells.len());
    for (row, cell) in cells.iter().enumerate() {
        if is_missing(cell) {
            values.push(None);
            continue;
        }
        match cell.parse::<f64>() {
            Ok(v) => values.push(Some(v)),
            Err(_) => {
                return Err(LoadError::NotNumeric {
                    column: name,
                    row: row + 1,
                    value: cell.clone(),
                })
            }
        }
    }
    Ok(Column::numeric(name, values))
}

fn to_text(name: String, cells: Vec<String>) -> Column {
    let values = cells
        .into_iter()
        .map(|c| if is_missing(&c) { None } else { Some(c) })
        .collect();
    Column::text(name, values)
}

fn infer(name: String, cells: Vec<String>) -> Column {
    let numeric = cells
        .iter()
        .any(|c| !is_missing(c))
        && cells
            .iter()
            .all(|c| is_missing(c) || c.parse::<f64>().is_ok());

    if numeric {
        let values = cells
            .iter()
            .map(|c| if is_missing(c) { None } else { c.parse::<f64>().ok() })
            .collect();
        Column::numeric(name, values)
    } else {
        to_text(name, cells)
    }
}
