//! The fixed chart sequence.
//!
//! Bindings, titles, labels and color scales for the nine charts of a
//! run, in display order.

use super::{
    BubbleSpec, ChartId, ChartKind, ChartSpec, ChoroplethSpec, GroupedBarSpec, HeatmapSpec,
    RadarSeries, RadarSpec,
};
use crate::dataset::Table;
use crate::models::{
    CorrelationMatrix, RegionalObservation, CORRUPTION, COUNTRY, FREEDOM, GDP, GENEROSITY,
    LADDER_SCORE, LIFE_EXPECTANCY, REGION, SOCIAL_SUPPORT, SPI_SCORE,
};

/// Radar axes: value column and display label. The first axis is repeated
/// at the end to close the polygon.
const RADAR_AXES: [(&str, &str); 6] = [
    (SOCIAL_SUPPORT, "Social support"),
    (LIFE_EXPECTANCY, "Healthy life expectancy"),
    (FREEDOM, "Freedom to make"),
    (GENEROSITY, "Generosity"),
    (CORRUPTION, "Perceptions of corruption"),
    (SOCIAL_SUPPORT, "Social support"),
];

/// Everything the chart sequence draws from.
#[derive(Debug, Clone, Copy)]
pub struct ChartInputs<'a> {
    /// The table with the composite score column.
    pub table: &'a Table,
    pub correlation: &'a CorrelationMatrix,
    /// Top rows by ladder score.
    pub happiest: &'a Table,
    pub regional: &'a [RegionalObservation],
}

/// Build the specs of every chart in `enabled`, in sequence order.
pub fn plan_charts<'a>(inputs: &ChartInputs<'a>, enabled: &[ChartId]) -> Vec<ChartSpec<'a>> {
    ChartId::ALL
        .iter()
        .filter(|id| enabled.contains(*id))
        .map(|&id| build(id, inputs))
        .collect()
}

fn build<'a>(id: ChartId, inputs: &ChartInputs<'a>) -> ChartSpec<'a> {
    let table = inputs.table;
    let (title, kind) = match id {
        ChartId::Correlation => (
            "Correlation Matrix of SPI Components with Happiness Score".to_string(),
            ChartKind::Heatmap(HeatmapSpec {
                matrix: inputs.correlation,
                color_scale: "RdBu".to_string(),
                center: 0.0,
                annotate: true,
            }),
        ),
        ChartId::SocialSupport => (
            "Happiness vs. Social Support (Bubble Size = GDP per capita)".to_string(),
            ChartKind::Bubble(bubble(
                table,
                SOCIAL_SUPPORT,
                LADDER_SCORE,
                GDP,
                &[
                    (SOCIAL_SUPPORT, "Social Support (0-1)"),
                    (LADDER_SCORE, "Happiness Score"),
                ],
                30.0,
            )),
        ),
        ChartId::FreedomCorruption => (
            "Freedom vs. Corruption (Bubble Size = Happiness Score)".to_string(),
            ChartKind::Bubble(bubble(
                table,
                FREEDOM,
                CORRUPTION,
                LADDER_SCORE,
                &[
                    (FREEDOM, "Freedom (0-1)"),
                    (CORRUPTION, "Corruption Perception (0-1)"),
                ],
                20.0,
            )),
        ),
        ChartId::GdpLife => (
            "Happiness vs GDP with Life Expectancy Bubble Size".to_string(),
            ChartKind::Bubble(bubble(
                table,
                GDP,
                LADDER_SCORE,
                LIFE_EXPECTANCY,
                &[
                    (GDP, "Logged GDP per capita"),
                    (LADDER_SCORE, "Happiness Score"),
                    (LIFE_EXPECTANCY, "Life Expectancy"),
                ],
                60.0,
            )),
        ),
        ChartId::MapLife => (
            "Global Healthy Life Expectancy (Years)".to_string(),
            ChartKind::Choropleth(map(table, LIFE_EXPECTANCY, "Viridis")),
        ),
        ChartId::MapSocial => (
            "Global Social Support Index".to_string(),
            ChartKind::Choropleth(map(table, SOCIAL_SUPPORT, "Plasma")),
        ),
        ChartId::MapSpi => (
            "Composite Social Progress Index (SPI) Score".to_string(),
            ChartKind::Choropleth(map(table, SPI_SCORE, "Plasma")),
        ),
        ChartId::Radar => (
            format!(
                "SPI Components Comparison for Top {} Happiest Countries",
                inputs.happiest.n_rows()
            ),
            ChartKind::Radar(radar(inputs.happiest)),
        ),
        ChartId::Regional => (
            "Average SPI Component Scores by Region".to_string(),
            ChartKind::GroupedBar(GroupedBarSpec {
                observations: inputs.regional,
                value_label: "Average Score".to_string(),
                group_label: "Region".to_string(),
                hue_label: "SPI Component".to_string(),
            }),
        ),
    };
    ChartSpec { id, title, kind }
}

fn bubble<'a>(
    table: &'a Table,
    x: &str,
    y: &str,
    size: &str,
    labels: &[(&str, &str)],
    size_max: f64,
) -> BubbleSpec<'a> {
    BubbleSpec {
        table,
        x: x.to_string(),
        y: y.to_string(),
        size: Some(size.to_string()),
        color: Some(REGION.to_string()),
        hover: Some(COUNTRY.to_string()),
        labels: labels
            .iter()
            .map(|(c, l)| (c.to_string(), l.to_string()))
            .collect(),
        size_max,
    }
}

fn map<'a>(table: &'a Table, value: &str, color_scale: &str) -> ChoroplethSpec<'a> {
    ChoroplethSpec {
        table,
        location: COUNTRY.to_string(),
        value: value.to_string(),
        hover: Some(COUNTRY.to_string()),
        color_scale: color_scale.to_string(),
    }
}

/// One polygon per selected country, in selection order.
pub fn radar(selection: &Table) -> RadarSpec {
    let names = selection.text(COUNTRY);
    let series = (0..selection.n_rows())
        .map(|row| RadarSeries {
            name: names
                .and_then(|n| n[row].clone())
                .unwrap_or_else(|| format!("row {}", row + 1)),
            values: RADAR_AXES
                .iter()
                .map(|(column, _)| selection.numeric(column).and_then(|v| v[row]))
                .collect(),
        })
        .collect();

    RadarSpec {
        categories: RADAR_AXES.iter().map(|(_, label)| label.to_string()).collect(),
        series,
        radial_range: Some((0.0, 1.0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Column;

    fn inputs_table() -> Table {
        let n = 2;
        let mut columns = vec![
            Column::text(COUNTRY, vec![Some("A".into()), None]),
            Column::text(REGION, vec![Some("R".into()), Some("R".into())]),
        ];
        for name in [
            LADDER_SCORE,
            GDP,
            SOCIAL_SUPPORT,
            LIFE_EXPECTANCY,
            FREEDOM,
            GENEROSITY,
            CORRUPTION,
            SPI_SCORE,
        ] {
            columns.push(Column::numeric(name, vec![Some(0.5); n]));
        }
        Table::new(columns).unwrap()
    }

    #[test]
    fn test_plan_follows_sequence_and_filter() {
        let table = inputs_table();
        let corr = CorrelationMatrix {
            columns: vec![],
            values: vec![],
        };
        let inputs = ChartInputs {
            table: &table,
            correlation: &corr,
            happiest: &table,
            regional: &[],
        };

        let all = plan_charts(&inputs, &ChartId::ALL);
        let ids: Vec<ChartId> = all.iter().map(|c| c.id).collect();
        assert_eq!(ids, ChartId::ALL.to_vec());

        let some = plan_charts(&inputs, &[ChartId::Regional, ChartId::MapSpi]);
        let ids: Vec<ChartId> = some.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![ChartId::MapSpi, ChartId::Regional]);
        assert_eq!(some[0].title, "Composite Social Progress Index (SPI) Score");
    }

    #[test]
    fn test_bubble_bindings() {
        let table = inputs_table();
        let spec = bubble(&table, GDP, LADDER_SCORE, LIFE_EXPECTANCY, &[(GDP, "GDP")], 60.0);
        assert_eq!(spec.size.as_deref(), Some(LIFE_EXPECTANCY));
        assert_eq!(spec.color.as_deref(), Some(REGION));
        assert_eq!(spec.label_for(GDP), "GDP");
        assert_eq!(spec.label_for(LADDER_SCORE), LADDER_SCORE);
    }

    #[test]
    fn test_radar_closes_polygon_and_names_series() {
        let table = inputs_table();
        let spec = radar(&table);

        assert_eq!(spec.categories.len(), 6);
        assert_eq!(spec.categories.first(), spec.categories.last());
        assert!(!spec.categories.iter().any(|c| c.contains("Dystopia")));
        assert_eq!(spec.series.len(), 2);
        assert_eq!(spec.series[0].name, "A");
        assert_eq!(spec.series[1].name, "row 2");
        assert_eq!(spec.series[0].values, vec![Some(0.5); 6]);
        assert_eq!(spec.radial_range, Some((0.0, 1.0)));
    }
}
