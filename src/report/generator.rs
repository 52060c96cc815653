//! Run summary generation.
//!
//! This module renders the run summary as Markdown or JSON: dataset
//! metadata, leader boards, correlation and regional tables, and the
//! outcome of every chart.

use crate::models::{
    ChartOutcome, CorrelationMatrix, CountryScore, RegionalMeans, Report, ReportMetadata,
    LADDER_SCORE,
};
use anyhow::Result;

/// Generate a complete Markdown summary.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str("# SPI Atlas Report\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_leaders_section(
        "Happiest Countries",
        "Ranked by ladder score.",
        &report.happiest,
    ));
    output.push_str(&generate_leaders_section(
        "Composite Score Leaders",
        "Ranked by the mean of the six SPI components.",
        &report.spi_leaders,
    ));

    if let Some(ref matrix) = report.correlation {
        output.push_str(&generate_correlation_section(matrix));
    }
    if let Some(ref regional) = report.regional {
        output.push_str(&generate_regional_section(regional));
    }

    output.push_str(&generate_charts_section(&report.charts));
    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Data:** `{}`\n", metadata.data_path));
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        metadata.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Countries:** {}\n", metadata.countries));
    section.push_str(&format!("- **Regions:** {}\n", metadata.regions));
    if metadata.incomplete_rows > 0 {
        section.push_str(&format!(
            "- **Rows Without SPI Score:** {}\n",
            metadata.incomplete_rows
        ));
    }
    section.push_str(&format!(
        "- **Duration:** {:.2}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map_or_else(|| "-".to_string(), |v| format!("{:.3}", v))
}

fn fmt_f64(v: f64) -> String {
    if v.is_nan() {
        "-".to_string()
    } else {
        format!("{:.3}", v)
    }
}

fn generate_leaders_section(heading: &str, caption: &str, leaders: &[CountryScore]) -> String {
    if leaders.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str(&format!("## {}\n\n{}\n\n", heading, caption));
    section.push_str("| # | Country | Region | Ladder Score | SPI Score |\n");
    section.push_str("|---:|:---|:---|---:|---:|\n");

    for (i, c) in leaders.iter().enumerate() {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            i + 1,
            c.country,
            c.region,
            fmt_opt(c.ladder_score),
            fmt_opt(c.spi_score)
        ));
    }
    section.push('\n');

    section
}

fn generate_correlation_section(matrix: &CorrelationMatrix) -> String {
    let mut section = String::new();

    section.push_str("## Correlation Matrix\n\n");
    section.push_str("| |");
    for name in &matrix.columns {
        section.push_str(&format!(" {} |", name));
    }
    section.push_str("\n|:---|");
    section.push_str(&"---:|".repeat(matrix.columns.len()));
    section.push('\n');

    for (i, name) in matrix.columns.iter().enumerate() {
        section.push_str(&format!("| **{}** |", name));
        for j in 0..matrix.columns.len() {
            section.push_str(&format!(" {} |", fmt_f64(matrix.get(i, j))));
        }
        section.push('\n');
    }
    section.push('\n');

    let ranked = matrix.ranked_against(LADDER_SCORE);
    if !ranked.is_empty() {
        section.push_str(&format!("Strongest relationships with {}:\n\n", LADDER_SCORE));
        for (name, r) in ranked.iter().take(3) {
            section.push_str(&format!("- {}: {:+.2}\n", name, r));
        }
        section.push('\n');
    }

    section
}

fn generate_regional_section(regional: &RegionalMeans) -> String {
    let mut section = String::new();

    section.push_str("## Regional Averages\n\n");
    section.push_str("| Region | Countries |");
    for component in &regional.components {
        section.push_str(&format!(" {} |", component));
    }
    section.push_str("\n|:---|---:|");
    section.push_str(&"---:|".repeat(regional.components.len()));
    section.push('\n');

    for row in &regional.rows {
        section.push_str(&format!("| {} | {} |", row.region, row.countries));
        for v in &row.means {
            section.push_str(&format!(" {} |", fmt_f64(*v)));
        }
        section.push('\n');
    }
    section.push('\n');

    section
}

fn generate_charts_section(charts: &[ChartOutcome]) -> String {
    let mut section = String::new();

    section.push_str("## Charts\n\n");
    if charts.is_empty() {
        section.push_str("No charts were requested.\n\n");
        return section;
    }

    for chart in charts {
        section.push_str(&format!(
            "- {} **{}** (`{}`): {}\n",
            chart.status.emoji(),
            chart.title,
            chart.id,
            chart.status
        ));
    }
    section.push('\n');

    section
}

fn generate_footer() -> String {
    "---\n\n*Report generated by SPI Atlas*\n".to_string()
}

/// Generate a JSON summary.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
