//! Data models for the well-being analysis.
//!
//! This module holds the dataset's column vocabulary and the structures
//! that carry analysis results into charts and the summary report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const COUNTRY: &str = "Country name";
pub const REGION: &str = "Regional indicator";
pub const LADDER_SCORE: &str = "Ladder score";
pub const GDP: &str = "Logged GDP per capita";
pub const SOCIAL_SUPPORT: &str = "Social support";
pub const LIFE_EXPECTANCY: &str = "Healthy life expectancy";
pub const FREEDOM: &str = "Freedom to make life choices";
pub const GENEROSITY: &str = "Generosity";
pub const CORRUPTION: &str = "Perceptions of corruption";
pub const DYSTOPIA: &str = "Dystopia + residual";

/// Name of the derived composite column.
pub const SPI_SCORE: &str = "SPI Score";

/// Inputs of the composite score, in display order.
pub const SPI_COMPONENTS: [&str; 6] = [
    SOCIAL_SUPPORT,
    LIFE_EXPECTANCY,
    FREEDOM,
    GENEROSITY,
    CORRUPTION,
    DYSTOPIA,
];

/// Text columns every input file must carry.
pub const REQUIRED_TEXT: [&str; 2] = [COUNTRY, REGION];

/// Numeric columns every input file must carry.
pub const REQUIRED_NUMERIC: [&str; 8] = [
    LADDER_SCORE,
    GDP,
    SOCIAL_SUPPORT,
    LIFE_EXPECTANCY,
    FREEDOM,
    GENEROSITY,
    CORRUPTION,
    DYSTOPIA,
];

/// Square Pearson correlation matrix over a list of columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major values; `NaN` where the correlation is undefined.
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i][j]
    }

    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Correlation of each component with `target`, strongest first.
    /// Undefined entries are skipped.
    pub fn ranked_against(&self, target: &str) -> Vec<(String, f64)> {
        let Some(t) = self.index_of(target) else {
            return Vec::new();
        };
        let mut ranked: Vec<(String, f64)> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != t)
            .map(|(i, name)| (name.clone(), self.values[i][t]))
            .filter(|(_, r)| !r.is_nan())
            .collect();
        ranked.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
        ranked
    }
}

/// Wide per-region means: one row per region, one value per component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionalMeans {
    pub components: Vec<String>,
    pub rows: Vec<RegionRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionRow {
    pub region: String,
    /// Number of countries in the region.
    pub countries: usize,
    /// Means aligned with [`RegionalMeans::components`]; `NaN` when the
    /// region has no valid value for that component.
    pub means: Vec<f64>,
}

/// One (region, component, value) observation of the long-form table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalObservation {
    pub region: String,
    pub component: String,
    pub average: f64,
}

/// Output format for chart files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChartFormat {
    /// Standalone HTML page (default)
    #[default]
    Html,
    /// Raw Plotly figure JSON
    Json,
}

impl ChartFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ChartFormat::Html => "html",
            ChartFormat::Json => "json",
        }
    }
}

/// Result of one render call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "status")]
pub enum ChartStatus {
    Rendered {
        #[serde(skip_serializing_if = "Option::is_none")]
        path: Option<String>,
        /// Markers dropped or defaulted because of missing values.
        degraded: usize,
    },
    Failed {
        error: String,
    },
    Skipped,
}

impl fmt::Display for ChartStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartStatus::Rendered { path: Some(p), .. } => write!(f, "rendered to {}", p),
            ChartStatus::Rendered { path: None, .. } => write!(f, "rendered"),
            ChartStatus::Failed { error } => write!(f, "failed: {}", error),
            ChartStatus::Skipped => write!(f, "skipped"),
        }
    }
}

impl ChartStatus {
    pub fn emoji(&self) -> &'static str {
        match self {
            ChartStatus::Rendered { .. } => "✅",
            ChartStatus::Failed { .. } => "❌",
            ChartStatus::Skipped => "⏭️",
        }
    }
}

/// Outcome of one chart in the fixed sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartOutcome {
    pub id: String,
    pub title: String,
    #[serde(flatten)]
    pub status: ChartStatus,
}

/// A country's composite score, used in the leader board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryScore {
    pub country: String,
    pub region: String,
    pub ladder_score: Option<f64>,
    pub spi_score: Option<f64>,
}

/// Metadata about one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub data_path: String,
    pub analysis_date: DateTime<Utc>,
    pub countries: usize,
    pub regions: usize,
    /// Rows whose composite score is missing.
    pub incomplete_rows: usize,
    pub duration_seconds: f64,
}

/// The complete run summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    /// Top countries by ladder score.
    pub happiest: Vec<CountryScore>,
    /// Top countries by composite score.
    pub spi_leaders: Vec<CountryScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation: Option<CorrelationMatrix>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regional: Option<RegionalMeans>,
    pub charts: Vec<ChartOutcome>,
}

impl Report {
    pub fn failed_charts(&self) -> usize {
        self.charts
            .iter()
            .filter(|c| matches!(c.status, ChartStatus::Failed { .. }))
            .count()
    }
}
