//! The analysis pipeline.
//!
//! Loader output flows through derivation, aggregation and selection
//! into the chart sequence. Every stage takes and returns explicit
//! values; only chart rendering has side effects.

use crate::analysis::{
    correlation_matrix, derive_composite, group_means, melt, top_n, top_n_indices,
};
use crate::charts::{plan_charts, ChartId, ChartInputs, Renderer};
use crate::dataset::Table;
use crate::models::{
    ChartOutcome, ChartStatus, CorrelationMatrix, CountryScore, RegionalMeans,
    RegionalObservation, COUNTRY, LADDER_SCORE, REGION, SPI_COMPONENTS, SPI_SCORE,
};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, info, warn};

/// Everything derived from one table.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Input table plus the composite score column.
    pub table: Table,
    /// Rows whose composite score is missing.
    pub incomplete: Vec<usize>,
    pub correlation: CorrelationMatrix,
    pub regional: RegionalMeans,
    pub regional_long: Vec<RegionalObservation>,
    /// Top rows by ladder score, all columns kept.
    pub happiest: Table,
}

impl Analysis {
    pub fn chart_inputs(&self) -> ChartInputs<'_> {
        ChartInputs {
            table: &self.table,
            correlation: &self.correlation,
            happiest: &self.happiest,
            regional: &self.regional_long,
        }
    }
}

/// Run derivation, aggregation and selection over a loaded table.
pub fn analyze(mut table: Table, top: usize) -> Result<Analysis> {
    debug!(
        "Input columns: {}",
        table
            .columns()
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let incomplete = derive_composite(&mut table, &SPI_COMPONENTS, SPI_SCORE)
        .context("Failed to derive composite score")?;

    if !incomplete.is_empty() {
        if let Some(names) = table.text(COUNTRY) {
            let listed: Vec<&str> = incomplete
                .iter()
                .filter_map(|&i| names[i].as_deref())
                .collect();
            warn!("No {} for: {}", SPI_SCORE, listed.join(", "));
        }
    }

    let mut corr_columns: Vec<&str> = SPI_COMPONENTS.to_vec();
    corr_columns.push(LADDER_SCORE);
    let correlation =
        correlation_matrix(&table, &corr_columns).context("Failed to compute correlations")?;

    let regional = group_means(&table, REGION, &SPI_COMPONENTS)
        .context("Failed to compute regional means")?;
    let regional_long = melt(&regional);

    let happiest = top_n(&table, LADDER_SCORE, top).context("Failed to select top countries")?;
    if happiest.n_rows() < top {
        info!(
            "Only {} rows have a {}; selecting all of them",
            happiest.n_rows(),
            LADDER_SCORE
        );
    }

    info!(
        "Analyzed {} countries in {} regions",
        table.n_rows(),
        regional.rows.len()
    );

    Ok(Analysis {
        table,
        incomplete,
        correlation,
        regional,
        regional_long,
        happiest,
    })
}

/// Country rows of `table` at `indices`, for leader boards.
pub fn country_scores(table: &Table, indices: &[usize]) -> Vec<CountryScore> {
    let text = |column: &str, row: usize| {
        table
            .text(column)
            .and_then(|v| v[row].clone())
            .unwrap_or_else(|| "-".to_string())
    };
    let number = |column: &str, row: usize| table.numeric(column).and_then(|v| v[row]);

    indices
        .iter()
        .map(|&row| CountryScore {
            country: text(COUNTRY, row),
            region: text(REGION, row),
            ladder_score: number(LADDER_SCORE, row),
            spi_score: number(SPI_SCORE, row),
        })
        .collect()
}

/// Leaders by ladder score and by composite score.
pub fn leaders(table: &Table, n: usize) -> Result<(Vec<CountryScore>, Vec<CountryScore>)> {
    let happiest = top_n_indices(table, LADDER_SCORE, n)?;
    let spi = top_n_indices(table, SPI_SCORE, n)?;
    Ok((country_scores(table, &happiest), country_scores(table, &spi)))
}

/// Render every enabled chart in sequence.
///
/// A chart that fails is logged and recorded; the remaining charts still
/// render.
pub fn render_charts(
    analysis: &Analysis,
    enabled: &[ChartId],
    renderer: &mut dyn Renderer,
    show_progress: bool,
) -> Vec<ChartOutcome> {
    let specs = plan_charts(&analysis.chart_inputs(), enabled);

    let progress = if show_progress {
        let pb = ProgressBar::new(specs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut outcomes = Vec::with_capacity(specs.len());
    for spec in &specs {
        if let Some(ref pb) = progress {
            pb.set_message(spec.id.to_string());
        }

        let status = match renderer.render(spec) {
            Ok(rendered) => ChartStatus::Rendered {
                path: rendered.path.map(|p| p.display().to_string()),
                degraded: rendered.degraded,
            },
            Err(e) => {
                error!("Chart '{}' failed: {}", spec.id, e);
                ChartStatus::Failed {
                    error: e.to_string(),
                }
            }
        };
        outcomes.push(ChartOutcome {
            id: spec.id.to_string(),
            title: spec.title.clone(),
            status,
        });

        if let Some(ref pb) = progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress {
        pb.finish_with_message("charts done");
    }

    // Charts left out of `enabled` are reported as skipped.
    for id in ChartId::ALL.iter().filter(|id| !enabled.contains(*id)) {
        outcomes.push(ChartOutcome {
            id: id.to_string(),
            title: String::new(),
            status: ChartStatus::Skipped,
        });
    }

    outcomes
}
