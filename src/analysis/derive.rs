//! Composite score derivation.

use crate::dataset::{Column, Table};
use crate::error::DeriveError;
use tracing::{debug, warn};

/// Mean of `values`, or `None` if any value is missing.
pub fn mean_propagating(values: impl IntoIterator<Item = Option<f64>>) -> Option<f64> {
    let mut sum = 0.0;
    let mut n = 0usize;
    for v in values {
        sum += v?;
        n += 1;
    }
    (n > 0).then(|| sum / n as f64)
}

/// Append `output` to `table` as the row-wise mean of `components`.
///
/// Missing inputs propagate: a row with any missing component gets a
/// missing score. Rows are neither dropped nor reordered. Returns the
/// indices of rows whose score is missing.
pub fn derive_composite(
    table: &mut Table,
    components: &[&str],
    output: &str,
) -> Result<Vec<usize>, DeriveError> {
    let mut inputs = Vec::with_capacity(components.len());
    for &name in components {
        if !table.has_column(name) {
            return Err(DeriveError::MissingComponent(name.to_string()));
        }
        let column = table
            .numeric(name)
            .ok_or_else(|| DeriveError::NonNumericComponent(name.to_string()))?;
        inputs.push(column);
    }

    let scores: Vec<Option<f64>> = (0..table.n_rows())
        .map(|row| mean_propagating(inputs.iter().map(|col| col[row])))
        .collect();

    let missing: Vec<usize> = scores
        .iter()
        .enumerate()
        .filter(|(_, s)| s.is_none())
        .map(|(i, _)| i)
        .collect();

    if !missing.is_empty() {
        warn!(
            "{} of {} rows have an incomplete '{}' (missing component values)",
            missing.len(),
            table.n_rows(),
            output
        );
    }
    debug!("Derived '{}' from {} components", output, components.len());

    table.push_column(Column::numeric(output, scores))?;
    Ok(missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TableError;

    fn table() -> Table {
        Table::new(vec![
            Column::numeric("a", vec![Some(1.0), Some(2.0), None]),
            Column::numeric("b", vec![Some(3.0), Some(4.0), Some(5.0)]),
            Column::text("label", vec![None, None, None]),
        ])
        .unwrap()
    }

    #[test]
    fn test_mean_propagating() {
        assert_eq!(mean_propagating([Some(1.0), Some(2.0), Some(6.0)]), Some(3.0));
        assert_eq!(mean_propagating([Some(1.0), None]), None);
        assert_eq!(mean_propagating(std::iter::empty()), None);
    }

    #[test]
    fn test_derive_composite_means_and_propagates() {
        let mut t = table();
        let missing = derive_composite(&mut t, &["a", "b"], "score").unwrap();

        assert_eq!(missing, vec![2]);
        assert_eq!(t.n_columns(), 4);
        assert_eq!(t.n_rows(), 3);
        assert_eq!(t.numeric("score").unwrap(), &[Some(2.0), Some(3.0), None][..]);
        // inputs untouched
        assert_eq!(t.numeric("a").unwrap(), &[Some(1.0), Some(2.0), None][..]);
    }

    #[test]
    fn test_derive_composite_missing_component() {
        let mut t = table();
        let err = derive_composite(&mut t, &["a", "zzz"], "score").unwrap_err();
        assert_eq!(err, DeriveError::MissingComponent("zzz".to_string()));
        assert_eq!(t.n_columns(), 3);
    }

    #[test]
    fn test_derive_composite_text_component() {
        let mut t = table();
        let err = derive_composite(&mut t, &["a", "label"], "score").unwrap_err();
        assert_eq!(err, DeriveError::NonNumericComponent("label".to_string()));
    }

    #[test]
    fn test_derive_composite_twice_fails() {
        let mut t = table();
        derive_composite(&mut t, &["a", "b"], "score").unwrap();
        let err = derive_composite(&mut t, &["a", "b"], "score").unwrap_err();
        assert_eq!(
            err,
            DeriveError::Table(TableError::DuplicateColumn("score".to_string()))
        );
    }
}
