//! In-memory record table.
//!
//! A [`Table`] is an ordered set of equally long, named columns. Cells
//! are optional: `None` marks a missing value. Columns are either numeric
//! or text; the type is fixed when the column is created.

pub mod loader;

pub use loader::{load_table, LoadOptions};

use crate::error::TableError;

/// Cell storage for one column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    /// Number of non-missing cells.
    pub fn present(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.iter().filter(|c| c.is_some()).count(),
            ColumnData::Text(v) => v.iter().filter(|c| c.is_some()).count(),
        }
    }

    fn take(&self, indices: &[usize]) -> ColumnData {
        match self {
            ColumnData::Numeric(v) => ColumnData::Numeric(indices.iter().map(|&i| v[i]).collect()),
            ColumnData::Text(v) => {
                ColumnData::Text(indices.iter().map(|&i| v[i].clone()).collect())
            }
        }
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Numeric(values),
        }
    }

    pub fn text(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Text(values),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.data, ColumnData::Numeric(_))
    }
}

/// Ordered rows over a fixed set of named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    /// Build a table, checking that all columns have the same length and
    /// distinct names.
    pub fn new(columns: Vec<Column>) -> Result<Self, TableError> {
        let mut table = Table {
            columns: Vec::with_capacity(columns.len()),
            rows: 0,
        };
        for column in columns {
            table.push_column(column)?;
        }
        Ok(table)
    }

    /// Append a column. The row count of an empty table adopts the first
    /// column's length.
    pub fn push_column(&mut self, column: Column) -> Result<(), TableError> {
        if self.has_column(&column.name) {
            return Err(TableError::DuplicateColumn(column.name));
        }
        if self.columns.is_empty() {
            self.rows = column.data.len();
        } else if column.data.len() != self.rows {
            return Err(TableError::LengthMismatch {
                name: column.name,
                expected: self.rows,
                actual: column.data.len(),
            });
        }
        self.columns.push(column);
        Ok(())
    }

    pub fn n_rows(&self) -> usize {
        self.rows
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Numeric cells of `name`, or `None` if absent or not numeric.
    pub fn numeric(&self, name: &str) -> Option<&[Option<f64>]> {
        match self.column(name).map(|c| &c.data) {
            Some(ColumnData::Numeric(v)) => Some(v),
            _ => None,
        }
    }

    /// Text cells of `name`, or `None` if absent or not text.
    pub fn text(&self, name: &str) -> Option<&[Option<String>]> {
        match self.column(name).map(|c| &c.data) {
            Some(ColumnData::Text(v)) => Some(v),
            _ => None,
        }
    }

    /// New table holding the given rows, in the given order, with every
    /// column preserved.
    pub fn take(&self, indices: &[usize]) -> Table {
        Table {
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    data: c.data.take(indices),
                })
                .collect(),
            rows: indices.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(vec![
            Column::text(
                "name",
                vec![Some("a".into()), Some("b".into()), None],
            ),
            Column::numeric("score", vec![Some(1.0), None, Some(3.0)]),
        ])
        .unwrap()
    }

    #[test]
    fn test_new_rejects_length_mismatch() {
        let err = Table::new(vec![
            Column::numeric("x", vec![Some(1.0)]),
            Column::numeric("y", vec![Some(1.0), Some(2.0)]),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            TableError::LengthMismatch {
                name: "y".to_string(),
                expected: 1,
                actual: 2
            }
        );
    }

    #[test]
    fn test_push_duplicate_column() {
        let mut table = sample();
        let err = table
            .push_column(Column::numeric("score", vec![None, None, None]))
            .unwrap_err();
        assert_eq!(err, TableError::DuplicateColumn("score".to_string()));
        assert_eq!(table.n_columns(), 2);
    }

    #[test]
    fn test_typed_accessors() {
        let table = sample();
        assert_eq!(table.numeric("score").map(|v| v.len()), Some(3));
        assert!(table.numeric("name").is_none());
        assert!(table.text("score").is_none());
        assert_eq!(table.text("name").unwrap()[2], None);
        assert_eq!(table.numeric("score").unwrap()[1], None);
        assert!(table.column("missing").is_none());
    }

    #[test]
    fn test_take_preserves_columns() {
        let table = sample();
        let picked = table.take(&[2, 0]);
        assert_eq!(picked.n_rows(), 2);
        assert_eq!(picked.n_columns(), 2);
        assert_eq!(picked.numeric("score"), Some(&[Some(3.0), Some(1.0)][..]));
        assert_eq!(picked.text("name").unwrap()[0], None);
    }
}
