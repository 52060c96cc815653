//! Top-N row selection.

use crate::dataset::Table;
use crate::error::AnalysisError;
use tracing::debug;

/// Indices of the `n` rows with the largest `rank_by` value, largest first.
///
/// Ties keep their original relative order. Rows with a missing ranking
/// value are never selected. When fewer than `n` rows qualify, all of
/// them are returned, sorted descending.
pub fn top_n_indices(table: &Table, rank_by: &str, n: usize) -> Result<Vec<usize>, AnalysisError> {
    if !table.has_column(rank_by) {
        return Err(AnalysisError::MissingColumn(rank_by.to_string()));
    }
    let values = table
        .numeric(rank_by)
        .ok_or_else(|| AnalysisError::NotNumeric(rank_by.to_string()))?;

    let mut ranked: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v)))
        .collect();

    // sort_by is stable, so equal values stay in row order
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    if n > ranked.len() {
        debug!(
            "Requested top {} by '{}' but only {} rows qualify; returning all",
            n,
            rank_by,
            ranked.len()
        );
    }
    ranked.truncate(n);
    Ok(ranked.into_iter().map(|(i, _)| i).collect())
}

/// The `n` rows with the largest `rank_by` value, with every column kept.
pub fn top_n(table: &Table, rank_by: &str, n: usize) -> Result<Table, AnalysisError> {
    let indices = top_n_indices(table, rank_by, n)?;
    Ok(table.take(&indices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Column;

    fn ten_rows() -> Table {
        let scores = [3.0, 9.0, 1.0, 7.0, 5.0, 10.0, 2.0, 8.0, 4.0, 6.0];
        Table::new(vec![
            Column::text(
                "name",
                (0..10).map(|i| Some(format!("c{}", i))).collect(),
            ),
            Column::numeric("score", scores.iter().map(|&s| Some(s)).collect()),
        ])
        .unwrap()
    }

    fn scores(table: &Table) -> Vec<f64> {
        table
            .numeric("score")
            .unwrap()
            .iter()
            .map(|v| v.unwrap())
            .collect()
    }

    #[test]
    fn test_top_five_descending() {
        let top = top_n(&ten_rows(), "score", 5).unwrap();
        assert_eq!(top.n_rows(), 5);
        assert_eq!(scores(&top), vec![10.0, 9.0, 8.0, 7.0, 6.0]);
        assert_eq!(top.n_columns(), 2);
        assert_eq!(top.text("name").unwrap()[0].as_deref(), Some("c5"));
    }

    #[test]
    fn test_over_request_returns_all_sorted() {
        let top = top_n(&ten_rows(), "score", 20).unwrap();
        assert_eq!(top.n_rows(), 10);
        assert_eq!(
            scores(&top),
            vec![10.0, 9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0]
        );
    }

    #[test]
    fn test_ties_are_stable() {
        let table = Table::new(vec![Column::numeric(
            "score",
            vec![Some(1.0), Some(5.0), Some(5.0), Some(2.0), Some(5.0)],
        )])
        .unwrap();
        assert_eq!(top_n_indices(&table, "score", 3).unwrap(), vec![1, 2, 4]);
    }

    #[test]
    fn test_missing_values_not_selected() {
        let table = Table::new(vec![Column::numeric(
            "score",
            vec![None, Some(1.0), None, Some(2.0)],
        )])
        .unwrap();
        assert_eq!(top_n_indices(&table, "score", 4).unwrap(), vec![3, 1]);
    }

    #[test]
    fn test_zero_and_bad_column() {
        let table = ten_rows();
        assert!(top_n_indices(&table, "score", 0).unwrap().is_empty());
        assert_eq!(
            top_n_indices(&table, "nope", 1).unwrap_err(),
            AnalysisError::MissingColumn("nope".to_string())
        );
        assert_eq!(
            top_n_indices(&table, "name", 1).unwrap_err(),
            AnalysisError::NotNumeric("name".to_string())
        );
    }
}
