//! Correlation and regional aggregation.
//!
//! This module computes the pairwise correlation matrix over the score
//! components and the per-region component means that feed the charts.

use crate::dataset::Table;
use crate::error::AnalysisError;
use crate::models::{CorrelationMatrix, RegionRow, RegionalMeans, RegionalObservation};
use std::collections::BTreeMap;
use tracing::debug;

/// Pearson correlation over the pairs where both values are present.
///
/// Returns `NaN` when fewer than two complete pairs exist or either side
/// has zero variance.
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }
    let (x0, y0) = pairs[0];
    if pairs.iter().all(|p| p.0 == x0) || pairs.iter().all(|p| p.1 == y0) {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (xi, yi) in &pairs {
        let dx = xi - mx;
        let dy = yi - my;
        cov += dx * dy;
        vx += dx * dx;
        vy += dy * dy;
    }
    if vx == 0.0 || vy == 0.0 {
        return f64::NAN;
    }
    (cov / (vx * vy).sqrt()).clamp(-1.0, 1.0)
}

fn numeric_column<'a>(table: &'a Table, name: &str) -> Result<&'a [Option<f64>], AnalysisError> {
    if !table.has_column(name) {
        return Err(AnalysisError::MissingColumn(name.to_string()));
    }
    table
        .numeric(name)
        .ok_or_else(|| AnalysisError::NotNumeric(name.to_string()))
}

/// Correlation matrix over `columns`, in the given order.
///
/// The diagonal is exactly 1 and the matrix is symmetric by
/// construction; undefined entries are `NaN`.
pub fn correlation_matrix(
    table: &Table,
    columns: &[&str],
) -> Result<CorrelationMatrix, AnalysisError> {
    let data = columns
        .iter()
        .map(|name| numeric_column(table, name))
        .collect::<Result<Vec<_>, _>>()?;

    let n = columns.len();
    let mut values = vec![vec![f64::NAN; n]; n];
    for i in 0..n {
        values[i][i] = 1.0;
        for j in (i + 1)..n {
            let r = pearson(data[i], data[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    debug!("Computed {}x{} correlation matrix", n, n);
    Ok(CorrelationMatrix {
        columns: columns.iter().map(|s| s.to_string()).collect(),
        values,
    })
}

/// Mean of each component per group, groups in sorted lexical order.
///
/// Missing component values are skipped; a group with no valid value for
/// a component gets `NaN`. Rows with a missing group label are ignored.
pub fn group_means(
    table: &Table,
    group_by: &str,
    components: &[&str],
) -> Result<RegionalMeans, AnalysisError> {
    if !table.has_column(group_by) {
        return Err(AnalysisError::MissingColumn(group_by.to_string()));
    }
    let groups = table
        .text(group_by)
        .ok_or_else(|| AnalysisError::NotText(group_by.to_string()))?;
    let data = components
        .iter()
        .map(|name| numeric_column(table, name))
        .collect::<Result<Vec<_>, _>>()?;

    let mut grouped: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (row, group) in groups.iter().enumerate() {
        if let Some(group) = group {
            grouped.entry(group.as_str()).or_default().push(row);
        }
    }

    let rows = grouped
        .into_iter()
        .map(|(region, members)| {
            let means = data
                .iter()
                .map(|column| {
                    let present: Vec<f64> = members.iter().filter_map(|&r| column[r]).collect();
                    if present.is_empty() {
                        f64::NAN
                    } else {
                        present.iter().sum::<f64>() / present.len() as f64
                    }
                })
                .collect();
            RegionRow {
                region: region.to_string(),
                countries: members.len(),
                means,
            }
        })
        .collect::<Vec<_>>();

    debug!("Grouped {} rows into {} regions", table.n_rows(), rows.len());
    Ok(RegionalMeans {
        components: components.iter().map(|s| s.to_string()).collect(),
        rows,
    })
}

/// Reshape wide regional means into long form, region-major.
pub fn melt(means: &RegionalMeans) -> Vec<RegionalObservation> {
    means
        .rows
        .iter()
        .flat_map(|row| {
            means
                .components
                .iter()
                .zip(&row.means)
                .map(move |(component, &average)| RegionalObservation {
                    region: row.region.clone(),
                    component: component.clone(),
                    average,
                })
        })
        .collect()
}
