//! Chart specifications and rendering.
//!
//! A [`ChartSpec`] is a tidy table (borrowed, never mutated) plus the
//! role bindings a renderer needs. The fixed chart sequence is built by
//! [`plan::plan_charts`]; a [`Renderer`] turns each spec into an
//! artifact.

pub mod plan;
pub mod plotly;

pub use plan::{plan_charts, ChartInputs};
pub use plotly::PlotlyRenderer;

use crate::dataset::Table;
use crate::error::RenderError;
use crate::models::{CorrelationMatrix, RegionalObservation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Identifier of a chart in the fixed sequence.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum ChartId {
    Correlation,
    SocialSupport,
    FreedomCorruption,
    GdpLife,
    MapLife,
    MapSocial,
    MapSpi,
    Radar,
    Regional,
}

impl ChartId {
    pub const ALL: [ChartId; 9] = [
        ChartId::Correlation,
        ChartId::SocialSupport,
        ChartId::FreedomCorruption,
        ChartId::GdpLife,
        ChartId::MapLife,
        ChartId::MapSocial,
        ChartId::MapSpi,
        ChartId::Radar,
        ChartId::Regional,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartId::Correlation => "correlation",
            ChartId::SocialSupport => "social-support",
            ChartId::FreedomCorruption => "freedom-corruption",
            ChartId::GdpLife => "gdp-life",
            ChartId::MapLife => "map-life",
            ChartId::MapSocial => "map-social",
            ChartId::MapSpi => "map-spi",
            ChartId::Radar => "radar",
            ChartId::Regional => "regional",
        }
    }
}

impl fmt::Display for ChartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Annotated correlation heatmap.
#[derive(Debug, Clone)]
pub struct HeatmapSpec<'a> {
    pub matrix: &'a CorrelationMatrix,
    pub color_scale: String,
    /// Value mapped to the middle of the diverging scale.
    pub center: f64,
    pub annotate: bool,
}

/// Scatter plot with optional size/color/hover bindings.
#[derive(Debug, Clone)]
pub struct BubbleSpec<'a> {
    pub table: &'a Table,
    pub x: String,
    pub y: String,
    pub size: Option<String>,
    pub color: Option<String>,
    pub hover: Option<String>,
    /// Axis titles keyed by column name; unlisted columns use their name.
    pub labels: Vec<(String, String)>,
    /// Diameter in pixels of the largest marker.
    pub size_max: f64,
}

impl BubbleSpec<'_> {
    pub fn label_for<'b>(&'b self, column: &'b str) -> &'b str {
        self.labels
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, l)| l.as_str())
            .unwrap_or(column)
    }
}

/// Country-level map shaded by a value column.
#[derive(Debug, Clone)]
pub struct ChoroplethSpec<'a> {
    pub table: &'a Table,
    pub location: String,
    pub value: String,
    pub hover: Option<String>,
    pub color_scale: String,
}

/// One named polygon of a radar chart.
#[derive(Debug, Clone, PartialEq)]
pub struct RadarSeries {
    pub name: String,
    /// Values aligned with [`RadarSpec::categories`].
    pub values: Vec<Option<f64>>,
}

/// Radar chart over a shared category axis.
#[derive(Debug, Clone)]
pub struct RadarSpec {
    pub categories: Vec<String>,
    pub series: Vec<RadarSeries>,
    pub radial_range: Option<(f64, f64)>,
}

/// Grouped horizontal bar chart over a long-form table.
#[derive(Debug, Clone)]
pub struct GroupedBarSpec<'a> {
    pub observations: &'a [RegionalObservation],
    pub value_label: String,
    pub group_label: String,
    pub hue_label: String,
}

#[derive(Debug, Clone)]
pub enum ChartKind<'a> {
    Heatmap(HeatmapSpec<'a>),
    Bubble(BubbleSpec<'a>),
    Choropleth(ChoroplethSpec<'a>),
    Radar(RadarSpec),
    GroupedBar(GroupedBarSpec<'a>),
}

/// A chart ready to hand to a [`Renderer`].
#[derive(Debug, Clone)]
pub struct ChartSpec<'a> {
    pub id: ChartId,
    pub title: String,
    pub kind: ChartKind<'a>,
}

/// What a renderer produced for one chart.
#[derive(Debug, Clone, Default)]
pub struct RenderedChart {
    /// Where the artifact was written, if the renderer persists.
    pub path: Option<PathBuf>,
    /// Markers dropped or drawn at a default because of missing values.
    pub degraded: usize,
}

/// Turns a chart specification into a visual artifact.
///
/// Implementations must not mutate the spec's data and must degrade a
/// single marker, rather than fail, when a size or color value is
/// missing.
pub trait Renderer {
    fn render(&mut self, chart: &ChartSpec<'_>) -> Result<RenderedChart, RenderError>;
}
