//! Plotly figure backend.
//!
//! Builds a Plotly figure (`{"data": [...], "layout": {...}}`) for each
//! chart and optionally writes it to disk, either as raw JSON or as a
//! standalone HTML page that loads plotly.js. Map geometries are drawn by
//! plotly.js from country names.

use super::{
    BubbleSpec, ChartKind, ChartSpec, ChoroplethSpec, GroupedBarSpec, HeatmapSpec, RadarSpec,
    RenderedChart, Renderer,
};
use crate::dataset::Table;
use crate::error::RenderError;
use crate::models::ChartFormat;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_CDN_URL: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Label used for markers whose color group is missing.
const MISSING_GROUP: &str = "(missing)";

/// A built figure plus the number of degraded markers.
#[derive(Debug, Clone)]
pub struct Figure {
    pub data: Vec<Value>,
    pub layout: Value,
    pub degraded: usize,
}

impl Figure {
    pub fn to_value(&self) -> Value {
        json!({ "data": self.data, "layout": self.layout })
    }
}

/// Renders charts as Plotly figures.
#[derive(Debug, Clone)]
pub struct PlotlyRenderer {
    output_dir: Option<PathBuf>,
    format: ChartFormat,
    cdn_url: String,
}

impl PlotlyRenderer {
    /// Create a renderer. Nothing is written when `output_dir` is `None`.
    pub fn new(
        output_dir: Option<PathBuf>,
        format: ChartFormat,
        cdn_url: impl Into<String>,
    ) -> Self {
        Self {
            output_dir,
            format,
            cdn_url: cdn_url.into(),
        }
    }

    /// Build the figure for `chart` without writing anything.
    pub fn figure(chart: &ChartSpec<'_>) -> Result<Figure, RenderError> {
        let name = chart.id.as_str();
        let mut figure = match &chart.kind {
            ChartKind::Heatmap(spec) => heatmap(name, spec)?,
            ChartKind::Bubble(spec) => bubble(name, spec)?,
            ChartKind::Choropleth(spec) => choropleth(name, spec)?,
            ChartKind::Radar(spec) => radar(name, spec)?,
            ChartKind::GroupedBar(spec) => grouped_bar(name, spec)?,
        };
        figure.layout["title"] = json!({ "text": chart.title });
        Ok(figure)
    }

    fn persist(
        &self,
        chart: &ChartSpec<'_>,
        figure: &Figure,
    ) -> Result<Option<PathBuf>, RenderError> {
        let Some(dir) = &self.output_dir else {
            return Ok(None);
        };
        std::fs::create_dir_all(dir).map_err(|source| RenderError::Io {
            path: dir.clone(),
            source,
        })?;

        let path = dir.join(format!("{}.{}", chart.id, self.format.extension()));
        let content = match self.format {
            ChartFormat::Json => serde_json::to_string_pretty(&figure.to_value())?,
            ChartFormat::Html => self.html_page(&chart.title, figure)?,
        };
        write_file(&path, &content)?;
        Ok(Some(path))
    }

    fn html_page(&self, title: &str, figure: &Figure) -> Result<String, RenderError> {
        let figure_json = serde_json::to_string(&figure.to_value())?;
        Ok(format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{cdn}"></script>
</head>
<body>
<div id="chart" style="width:100%;height:90vh;"></div>
<script>
var figure = {figure};
Plotly.newPlot("chart", figure.data, figure.layout, {{responsive: true}});
</script>
</body>
</html>
"#,
            title = escape_html(title),
            cdn = escape_html(&self.cdn_url),
            figure = figure_json.replace("</", "<\\/"),
        ))
    }
}

impl Renderer for PlotlyRenderer {
    fn render(&mut self, chart: &ChartSpec<'_>) -> Result<RenderedChart, RenderError> {
        let figure = Self::figure(chart)?;
        if figure.degraded > 0 {
            debug!(
                "Chart '{}': {} markers degraded by missing values",
                chart.id, figure.degraded
            );
        }
        let path = self.persist(chart, &figure)?;
        if let Some(ref p) = path {
            info!("Wrote chart '{}' to {}", chart.id, p.display());
        }
        Ok(RenderedChart {
            path,
            degraded: figure.degraded,
        })
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), RenderError> {
    std::fs::write(path, content).map_err(|source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// `NaN` becomes JSON `null` so plotly leaves a gap.
fn finite(v: f64) -> Option<f64> {
    (!v.is_nan()).then_some(v)
}

fn axis_title(text: &str) -> Value {
    json!({ "title": { "text": text } })
}

fn numeric_binding<'t>(
    chart: &str,
    table: &'t Table,
    column: &str,
) -> Result<&'t [Option<f64>], RenderError> {
    let col = table.column(column).ok_or_else(|| RenderError::UnknownColumn {
        chart: chart.to_string(),
        column: column.to_string(),
    })?;
    let values = table.numeric(column).ok_or_else(|| RenderError::WrongType {
        chart: chart.to_string(),
        column: column.to_string(),
        expected: "numeric",
    })?;
    if col.data.present() == 0 {
        return Err(RenderError::AllMissing {
            chart: chart.to_string(),
            column: column.to_string(),
        });
    }
    Ok(values)
}

fn text_binding<'t>(
    chart: &str,
    table: &'t Table,
    column: &str,
) -> Result<&'t [Option<String>], RenderError> {
    let col = table.column(column).ok_or_else(|| RenderError::UnknownColumn {
        chart: chart.to_string(),
        column: column.to_string(),
    })?;
    let values = table.text(column).ok_or_else(|| RenderError::WrongType {
        chart: chart.to_string(),
        column: column.to_string(),
        expected: "text",
    })?;
    if col.data.present() == 0 {
        return Err(RenderError::AllMissing {
            chart: chart.to_string(),
            column: column.to_string(),
        });
    }
    Ok(values)
}

fn heatmap(chart: &str, spec: &HeatmapSpec<'_>) -> Result<Figure, RenderError> {
    let matrix = spec.matrix;
    if matrix.columns.is_empty() {
        return Err(RenderError::Empty {
            chart: chart.to_string(),
        });
    }

    let z: Vec<Vec<Option<f64>>> = matrix
        .values
        .iter()
        .map(|row| row.iter().map(|&v| finite(v)).collect())
        .collect();
    let degraded = z.iter().flatten().filter(|v| v.is_none()).count();

    let mut trace = json!({
        "type": "heatmap",
        "z": z,
        "x": matrix.columns,
        "y": matrix.columns,
        "colorscale": spec.color_scale,
        "zmid": spec.center,
        "zmin": -1.0,
        "zmax": 1.0,
    });
    if spec.annotate {
        let text: Vec<Vec<String>> = matrix
            .values
            .iter()
            .map(|row| {
                row.iter()
                    .map(|v| if v.is_nan() { String::new() } else { format!("{:.2}", v) })
                    .collect()
            })
            .collect();
        trace["text"] = json!(text);
        trace["texttemplate"] = json!("%{text}");
    }

    Ok(Figure {
        data: vec![trace],
        layout: json!({ "yaxis": { "autorange": "reversed" } }),
        degraded,
    })
}

#[derive(Default)]
struct BubbleGroup {
    x: Vec<f64>,
    y: Vec<f64>,
    size: Vec<f64>,
    text: Vec<String>,
}

fn bubble(chart: &str, spec: &BubbleSpec<'_>) -> Result<Figure, RenderError> {
    let table = spec.table;
    let xs = numeric_binding(chart, table, &spec.x)?;
    let ys = numeric_binding(chart, table, &spec.y)?;
    let sizes = spec
        .size
        .as_deref()
        .map(|c| numeric_binding(chart, table, c))
        .transpose()?;
    let colors = spec
        .color
        .as_deref()
        .map(|c| text_binding(chart, table, c))
        .transpose()?;
    let hovers = spec
        .hover
        .as_deref()
        .map(|c| text_binding(chart, table, c))
        .transpose()?;

    // Missing sizes are drawn at the smallest observed size.
    let present_sizes = || sizes.into_iter().flatten().flatten().copied();
    let default_size = present_sizes().fold(f64::INFINITY, f64::min);
    let max_size = present_sizes().fold(f64::NEG_INFINITY, f64::max);

    let mut order: Vec<String> = Vec::new();
    let mut groups: Vec<BubbleGroup> = Vec::new();
    let mut degraded = 0;

    for row in 0..table.n_rows() {
        let (Some(x), Some(y)) = (xs[row], ys[row]) else {
            degraded += 1;
            continue;
        };
        let group = match colors {
            Some(c) => match c[row].as_deref() {
                Some(g) => g,
                None => {
                    degraded += 1;
                    MISSING_GROUP
                }
            },
            None => "",
        };
        let size = match sizes {
            Some(s) => s[row].unwrap_or_else(|| {
                degraded += 1;
                default_size
            }),
            None => 1.0,
        };
        let text = hovers
            .and_then(|h| h[row].clone())
            .unwrap_or_default();

        let idx = match order.iter().position(|g| g == group) {
            Some(i) => i,
            None => {
                order.push(group.to_string());
                groups.push(BubbleGroup::default());
                order.len() - 1
            }
        };
        let g = &mut groups[idx];
        g.x.push(x);
        g.y.push(y);
        g.size.push(size.max(0.0));
        g.text.push(text);
    }

    if groups.is_empty() {
        return Err(RenderError::Empty {
            chart: chart.to_string(),
        });
    }

    let x_label = spec.label_for(&spec.x);
    let y_label = spec.label_for(&spec.y);
    let sizeref = if sizes.is_some() && max_size > 0.0 {
        2.0 * max_size / (spec.size_max * spec.size_max)
    } else {
        1.0
    };
    let hovertemplate = format!(
        "<b>%{{text}}</b><br>{}=%{{x}}<br>{}=%{{y}}<extra></extra>",
        x_label, y_label
    );

    let data = order
        .iter()
        .zip(groups)
        .map(|(name, g)| {
            let mut marker = json!({ "sizemode": "area", "sizeref": sizeref });
            if sizes.is_some() {
                marker["size"] = json!(g.size);
            }
            json!({
                "type": "scatter",
                "mode": "markers",
                "name": name,
                "legendgroup": name,
                "showlegend": colors.is_some(),
                "x": g.x,
                "y": g.y,
                "text": g.text,
                "hovertemplate": hovertemplate,
                "marker": marker,
            })
        })
        .collect();

    let mut layout = json!({
        "xaxis": axis_title(x_label),
        "yaxis": axis_title(y_label),
    });
    if let Some(ref color) = spec.color {
        layout["legend"] = json!({
            "title": { "text": spec.label_for(color) },
            "itemsizing": "constant",
        });
    }

    Ok(Figure {
        data,
        layout,
        degraded,
    })
}

fn choropleth(chart: &str, spec: &ChoroplethSpec<'_>) -> Result<Figure, RenderError> {
    let table = spec.table;
    let locations = text_binding(chart, table, &spec.location)?;
    let values = numeric_binding(chart, table, &spec.value)?;
    let hovers = spec
        .hover
        .as_deref()
        .map(|c| text_binding(chart, table, c))
        .transpose()?;

    let mut locs = Vec::new();
    let mut z = Vec::new();
    let mut text = Vec::new();
    let mut degraded = 0;

    for row in 0..table.n_rows() {
        // missing values leave the country unshaded
        let (Some(loc), Some(v)) = (locations[row].as_deref(), values[row]) else {
            degraded += 1;
            continue;
        };
        locs.push(loc);
        z.push(v);
        text.push(
            hovers
                .and_then(|h| h[row].as_deref())
                .unwrap_or(loc),
        );
    }

    if locs.is_empty() {
        return Err(RenderError::Empty {
            chart: chart.to_string(),
        });
    }

    let trace = json!({
        "type": "choropleth",
        "locations": locs,
        "locationmode": "country names",
        "z": z,
        "text": text,
        "colorscale": spec.color_scale,
        "colorbar": { "title": { "text": spec.value } },
        "hovertemplate": format!("<b>%{{text}}</b><br>{}=%{{z}}<extra></extra>", spec.value),
    });

    Ok(Figure {
        data: vec![trace],
        layout: json!({
            "geo": { "showframe": false, "projection": { "type": "natural earth" } },
        }),
        degraded,
    })
}

fn radar(chart: &str, spec: &RadarSpec) -> Result<Figure, RenderError> {
    if spec.series.is_empty() || spec.categories.is_empty() {
        return Err(RenderError::Empty {
            chart: chart.to_string(),
        });
    }

    let degraded = spec
        .series
        .iter()
        .flat_map(|s| &s.values)
        .filter(|v| v.is_none())
        .count();

    let data = spec
        .series
        .iter()
        .map(|s| {
            json!({
                "type": "scatterpolar",
                "r": s.values,
                "theta": spec.categories,
                "fill": "toself",
                "name": s.name,
            })
        })
        .collect();

    let mut radial = json!({ "visible": true });
    if let Some((lo, hi)) = spec.radial_range {
        radial["range"] = json!([lo, hi]);
    }

    Ok(Figure {
        data,
        layout: json!({ "polar": { "radialaxis": radial }, "showlegend": true }),
        degraded,
    })
}

fn grouped_bar(chart: &str, spec: &GroupedBarSpec<'_>) -> Result<Figure, RenderError> {
    if spec.observations.is_empty() {
        return Err(RenderError::Empty {
            chart: chart.to_string(),
        });
    }

    let mut hues: Vec<&str> = Vec::new();
    for obs in spec.observations {
        if !hues.contains(&obs.component.as_str()) {
            hues.push(&obs.component);
        }
    }

    let degraded = spec
        .observations
        .iter()
        .filter(|o| o.average.is_nan())
        .count();

    let data = hues
        .iter()
        .map(|hue| {
            let (x, y): (Vec<Option<f64>>, Vec<&str>) = spec
                .observations
                .iter()
                .filter(|o| o.component == *hue)
                .map(|o| (finite(o.average), o.region.as_str()))
                .unzip();
            json!({
                "type": "bar",
                "orientation": "h",
                "name": hue,
                "x": x,
                "y": y,
            })
        })
        .collect();

    Ok(Figure {
        data,
        layout: json!({
            "barmode": "group",
            "xaxis": axis_title(&spec.value_label),
            "yaxis": { "title": { "text": spec.group_label }, "autorange": "reversed" },
            "legend": { "title": { "text": spec.hue_label } },
        }),
        degraded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::{ChartId, RadarSeries};
    use crate::dataset::Column;
    use crate::models::{CorrelationMatrix, RegionalObservation};
    use tempfile::TempDir;

    fn countries() -> Table {
        Table::new(vec![
            Column::text(
                "country",
                vec![Some("A".into()), Some("B".into()), Some("C".into()), Some("D".into())],
            ),
            Column::text(
                "region",
                vec![Some("North".into()), Some("South".into()), None, Some("North".into())],
            ),
            Column::numeric("x", vec![Some(1.0), Some(2.0), Some(3.0), None]),
            Column::numeric("y", vec![Some(1.0), Some(4.0), Some(9.0), Some(16.0)]),
            Column::numeric("size", vec![Some(10.0), None, Some(30.0), Some(40.0)]),
            Column::numeric("empty", vec![None, None, None, None]),
        ])
        .unwrap()
    }

    fn bubble_spec(table: &Table) -> ChartSpec<'_> {
        ChartSpec {
            id: ChartId::SocialSupport,
            title: "Bubbles".to_string(),
            kind: ChartKind::Bubble(BubbleSpec {
                table,
                x: "x".to_string(),
                y: "y".to_string(),
                size: Some("size".to_string()),
                color: Some("region".to_string()),
                hover: Some("country".to_string()),
                labels: vec![("x".to_string(), "X axis".to_string())],
                size_max: 30.0,
            }),
        }
    }

    #[test]
    fn test_bubble_groups_and_degrades() {
        let table = countries();
        let before = table.clone();
        let figure = PlotlyRenderer::figure(&bubble_spec(&table)).unwrap();

        // D has no x; B has no size; C has no region
        assert_eq!(figure.degraded, 3);
        assert_eq!(figure.data.len(), 3);
        assert_eq!(figure.data[0]["name"], "North");
        assert_eq!(figure.data[1]["name"], "South");
        assert_eq!(figure.data[2]["name"], MISSING_GROUP);
        // B drawn at the smallest observed size
        assert_eq!(figure.data[1]["marker"]["size"], json!([10.0]));
        assert_eq!(figure.data[0]["marker"]["sizeref"], json!(2.0 * 40.0 / 900.0));
        assert_eq!(figure.layout["xaxis"]["title"]["text"], "X axis");
        assert_eq!(figure.layout["title"]["text"], "Bubbles");
        assert_eq!(table, before);
    }

    #[test]
    fn test_bubble_unknown_and_empty_bindings() {
        let table = countries();
        let mut spec = bubble_spec(&table);
        if let ChartKind::Bubble(ref mut b) = spec.kind {
            b.size = Some("gdp".to_string());
        }
        assert!(matches!(
            PlotlyRenderer::figure(&spec),
            Err(RenderError::UnknownColumn { ref column, .. }) if column == "gdp"
        ));

        if let ChartKind::Bubble(ref mut b) = spec.kind {
            b.size = Some("empty".to_string());
        }
        assert!(matches!(
            PlotlyRenderer::figure(&spec),
            Err(RenderError::AllMissing { .. })
        ));

        if let ChartKind::Bubble(ref mut b) = spec.kind {
            b.size = None;
            b.x = "country".to_string();
        }
        assert!(matches!(
            PlotlyRenderer::figure(&spec),
            Err(RenderError::WrongType { expected: "numeric", .. })
        ));
    }

    #[test]
    fn test_choropleth_skips_missing_values() {
        let table = countries();
        let spec = ChartSpec {
            id: ChartId::MapLife,
            title: "Map".to_string(),
            kind: ChartKind::Choropleth(ChoroplethSpec {
                table: &table,
                location: "country".to_string(),
                value: "x".to_string(),
                hover: None,
                color_scale: "Viridis".to_string(),
            }),
        };
        let figure = PlotlyRenderer::figure(&spec).unwrap();
        assert_eq!(figure.degraded, 1);
        assert_eq!(figure.data[0]["locations"], json!(["A", "B", "C"]));
        assert_eq!(figure.data[0]["locationmode"], "country names");
        assert_eq!(figure.data[0]["colorscale"], "Viridis");
    }

    #[test]
    fn test_heatmap_nan_becomes_null() {
        let matrix = CorrelationMatrix {
            columns: vec!["a".into(), "b".into()],
            values: vec![vec![1.0, f64::NAN], vec![f64::NAN, 1.0]],
        };
        let spec = ChartSpec {
            id: ChartId::Correlation,
            title: "Corr".to_string(),
            kind: ChartKind::Heatmap(HeatmapSpec {
                matrix: &matrix,
                color_scale: "RdBu".to_string(),
                center: 0.0,
                annotate: true,
            }),
        };
        let figure = PlotlyRenderer::figure(&spec).unwrap();
        assert_eq!(figure.degraded, 2);
        assert_eq!(figure.data[0]["z"], json!([[1.0, null], [null, 1.0]]));
        assert_eq!(figure.data[0]["text"][0][0], "1.00");
        assert_eq!(figure.data[0]["text"][0][1], "");
        // plotly's RdBu already maps -1 to blue and +1 to red
        assert_eq!(figure.data[0]["colorscale"], "RdBu");
        assert!(figure.data[0].get("reversescale").is_none());
        assert_eq!(figure.data[0]["zmid"], 0.0);
    }

    #[test]
    fn test_radar_and_empty_radar() {
        let mut spec = RadarSpec {
            categories: vec!["a".into(), "b".into(), "a".into()],
            series: vec![RadarSeries {
                name: "Finland".into(),
                values: vec![Some(0.9), None, Some(0.9)],
            }],
            radial_range: Some((0.0, 1.0)),
        };
        let chart = ChartSpec {
            id: ChartId::Radar,
            title: "Radar".to_string(),
            kind: ChartKind::Radar(spec.clone()),
        };
        let figure = PlotlyRenderer::figure(&chart).unwrap();
        assert_eq!(figure.degraded, 1);
        assert_eq!(figure.data[0]["fill"], "toself");
        assert_eq!(figure.layout["polar"]["radialaxis"]["range"], json!([0.0, 1.0]));

        spec.series.clear();
        let chart = ChartSpec {
            id: ChartId::Radar,
            title: "Radar".to_string(),
            kind: ChartKind::Radar(spec),
        };
        assert!(matches!(
            PlotlyRenderer::figure(&chart),
            Err(RenderError::Empty { .. })
        ));
    }

    #[test]
    fn test_grouped_bar_one_trace_per_hue() {
        let obs = vec![
            RegionalObservation { region: "East".into(), component: "a".into(), average: 1.0 },
            RegionalObservation { region: "East".into(), component: "b".into(), average: f64::NAN },
            RegionalObservation { region: "West".into(), component: "a".into(), average: 2.0 },
            RegionalObservation { region: "West".into(), component: "b".into(), average: 3.0 },
        ];
        let chart = ChartSpec {
            id: ChartId::Regional,
            title: "Regions".to_string(),
            kind: ChartKind::GroupedBar(GroupedBarSpec {
                observations: &obs,
                value_label: "Average Score".into(),
                group_label: "Region".into(),
                hue_label: "SPI Component".into(),
            }),
        };
        let figure = PlotlyRenderer::figure(&chart).unwrap();
        assert_eq!(figure.data.len(), 2);
        assert_eq!(figure.data[1]["x"], json!([null, 3.0]));
        assert_eq!(figure.data[1]["y"], json!(["East", "West"]));
        assert_eq!(figure.layout["barmode"], "group");
        assert_eq!(figure.degraded, 1);
    }

    #[test]
    fn test_render_persists_html_and_json() {
        let dir = TempDir::new().unwrap();
        let table = countries();
        let spec = bubble_spec(&table);

        let mut html = PlotlyRenderer::new(
            Some(dir.path().to_path_buf()),
            ChartFormat::Html,
            DEFAULT_CDN_URL,
        );
        let rendered = html.render(&spec).unwrap();
        let path = rendered.path.unwrap();
        assert_eq!(path, dir.path().join("social-support.html"));
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Plotly.newPlot"));
        assert!(content.contains(DEFAULT_CDN_URL));

        let mut raw = PlotlyRenderer::new(
            Some(dir.path().join("json")),
            ChartFormat::Json,
            DEFAULT_CDN_URL,
        );
        let rendered = raw.render(&spec).unwrap();
        let content = std::fs::read_to_string(rendered.path.unwrap()).unwrap();
        let value: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["data"].as_array().map(|a| a.len()), Some(3));
    }

    #[test]
    fn test_render_without_output_dir_writes_nothing() {
        let table = countries();
        let mut renderer = PlotlyRenderer::new(None, ChartFormat::Html, DEFAULT_CDN_URL);
        let rendered = renderer.render(&bubble_spec(&table)).unwrap();
        assert!(rendered.path.is_none());
        assert_eq!(rendered.degraded, 3);
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
    }
}
