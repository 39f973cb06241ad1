use crate::charts::{ChartSpec, EmptyKind, SeriesKind};
use serde::Serialize;
use serde_json::{Value, json};

const MIN_MARKER: f64 = 8.0;
const MAX_MARKER: f64 = 40.0;
const HOVER_TEMPLATE: &str =
    "<b>%{text}</b><br>area_name=%{customdata}<br>housing_units=%{marker.color}<extra></extra>";

/// Figure payload handed to Plotly.js on the page.
#[derive(Debug, Clone, Serialize)]
pub struct Figure {
    pub data: Vec<Value>,
    pub layout: Value,
}

pub fn render(spec: &ChartSpec) -> Figure {
    match spec {
        ChartSpec::Series(chart) => {
            let data = chart
                .series
                .iter()
                .map(|series| {
                    let x: Vec<i32> = series.points.iter().map(|p| p.year).collect();
                    let y: Vec<f64> = series.points.iter().map(|p| p.value).collect();
                    match chart.kind {
                        SeriesKind::Line => json!({
                            "type": "scatter",
                            "mode": "lines+markers",
                            "name": series.area_code,
                            "x": x,
                            "y": y,
                            "connectgaps": false,
                        }),
                        SeriesKind::Bar => json!({
                            "type": "bar",
                            "name": series.area_code,
                            "x": x,
                            "y": y,
                        }),
                    }
                })
                .collect();

            let mut layout = json!({
                "title": { "text": chart.title },
                "xaxis": {
                    "title": { "text": chart.x_label },
                    "type": "linear",
                    "dtick": 1,
                    "tickformat": "d",
                },
                "yaxis": { "title": { "text": chart.y_label } },
                "legend": { "title": { "text": "area_code" } },
            });
            if chart.kind == SeriesKind::Bar {
                layout["barmode"] = json!("relative");
            }
            Figure { data, layout }
        }
        ChartSpec::Geo(chart) => {
            let units: Vec<f64> = chart.points.iter().map(|p| p.housing_units).collect();
            let sizes = marker_sizes(&units);
            let data = vec![json!({
                "type": "scattergeo",
                "mode": "markers",
                "lat": chart.points.iter().map(|p| p.latitude).collect::<Vec<_>>(),
                "lon": chart.points.iter().map(|p| p.longitude).collect::<Vec<_>>(),
                "text": chart.points.iter().map(|p| p.area_code.as_str()).collect::<Vec<_>>(),
                "customdata": chart.points.iter().map(|p| p.area_name.as_str()).collect::<Vec<_>>(),
                "hovertemplate": HOVER_TEMPLATE,
                "marker": {
                    "size": sizes,
                    "color": units,
                    "colorscale": "Viridis",
                    "showscale": true,
                    "colorbar": { "title": { "text": "housing_units" } },
                },
            })];
            let layout = json!({
                "title": { "text": chart.title },
                "geo": {
                    "scope": chart.view.scope,
                    "center": { "lat": chart.view.center_lat, "lon": chart.view.center_lon },
                    "projection": { "scale": chart.view.projection_scale },
                    "showcoastlines": true,
                    "coastlinecolor": "black",
                    "showland": true,
                    "landcolor": "lightgray",
                    "showocean": true,
                    "oceancolor": "lightblue",
                },
            });
            Figure { data, layout }
        }
        ChartSpec::Pie(chart) => {
            let data = vec![json!({
                "type": "pie",
                "labels": chart.slices.iter().map(|s| s.area_code.as_str()).collect::<Vec<_>>(),
                "values": chart.slices.iter().map(|s| s.housing_units).collect::<Vec<_>>(),
                "hole": chart.hole,
            })];
            Figure {
                data,
                layout: json!({ "title": { "text": chart.title } }),
            }
        }
        ChartSpec::CategoryBar(chart) => {
            let data = vec![json!({
                "type": "bar",
                "x": chart.bars.iter().map(|s| s.area_code.as_str()).collect::<Vec<_>>(),
                "y": chart.bars.iter().map(|s| s.housing_units).collect::<Vec<_>>(),
            })];
            let layout = json!({
                "title": { "text": chart.title },
                "xaxis": { "title": { "text": chart.x_label }, "type": "category" },
                "yaxis": { "title": { "text": chart.y_label } },
            });
            Figure { data, layout }
        }
        ChartSpec::Empty { title, kind } => {
            let mut layout = json!({
                "title": { "text": title },
                "annotations": [{
                    "text": title,
                    "showarrow": false,
                    "xref": "paper",
                    "yref": "paper",
                    "x": 0.5,
                    "y": 0.5,
                }],
            });
            match kind {
                EmptyKind::Geo => layout["geo"] = json!({ "scope": "europe" }),
                EmptyKind::Pie => {
                    layout["xaxis"] = json!({ "visible": false });
                    layout["yaxis"] = json!({ "visible": false });
                }
            }
            Figure { data: Vec::new(), layout }
        }
    }
}

/// Linear marker sizes between `MIN_MARKER` and `MAX_MARKER`.
fn marker_sizes(units: &[f64]) -> Vec<f64> {
    let max = units.iter().cloned().filter(|u| u.is_finite()).fold(0.0_f64, f64::max);
    units
        .iter()
        .map(|&u| {
            if max <= 0.0 || !u.is_finite() || u <= 0.0 {
                MIN_MARKER
            } else {
                MIN_MARKER + (MAX_MARKER - MIN_MARKER) * (u / max)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::{self, NO_DATA_TITLE};
    use crate::models::{EnrichedHousingRow, MetricMode, WaitingRow};

    fn waiting(code: &str, year: i32, count: f64) -> WaitingRow {
        WaitingRow {
            area_code: code.to_string(),
            year,
            households_count: count,
        }
    }

    fn housing(code: &str, year: i32, units: f64) -> EnrichedHousingRow {
        EnrichedHousingRow {
            area_code: code.to_string(),
            year,
            housing_units: units,
            area_name: None,
            latitude: None,
            longitude: None,
        }
    }

    fn both_areas() -> Vec<String> {
        vec!["A1".to_string(), "A2".to_string()]
    }

    #[test]
    fn line_series_render_one_trace_per_area_with_gaps() {
        let rows = vec![
            waiting("A1", 2020, 100.0),
            waiting("A1", 2021, 110.0),
            waiting("A2", 2020, 50.0),
        ];
        let spec = charts::trend_series(&rows, &both_areas(), MetricMode::PctChange);
        let figure = render(&spec);

        assert_eq!(figure.data.len(), 2);
        assert_eq!(figure.data[0]["type"], "scatter");
        assert_eq!(figure.data[0]["name"], "A1");

        let payload = serde_json::to_value(&figure).unwrap();
        assert_eq!(payload["data"][0]["y"][0], Value::Null);
        assert_eq!(payload["layout"]["yaxis"]["title"]["text"], "Percentage Change (%)");
    }

    #[test]
    fn year_axis_is_numeric_when_later_area_starts_earlier() {
        let rows = vec![
            housing("A1", 2020, 10.0),
            housing("A1", 2021, 12.0),
            housing("A2", 2019, 7.0),
        ];

        for figure in [
            render(&charts::supply_series(&rows, &both_areas(), MetricMode::Total)),
            render(&charts::trend_series(
                &[waiting("A1", 2020, 1.0), waiting("A2", 2019, 2.0)],
                &both_areas(),
                MetricMode::Total,
            )),
        ] {
            let xaxis = &figure.layout["xaxis"];
            assert_eq!(xaxis["type"], "linear");
            assert_eq!(xaxis["dtick"], 1);
            assert_eq!(figure.data[1]["x"], json!([2019]));
        }
    }

    #[test]
    fn empty_spec_renders_annotation_and_no_traces() {
        let spec = ChartSpec::Empty {
            title: NO_DATA_TITLE.to_string(),
            kind: EmptyKind::Geo,
        };
        let figure = render(&spec);
        assert!(figure.data.is_empty());
        assert_eq!(figure.layout["annotations"][0]["text"], NO_DATA_TITLE);
    }

    #[test]
    fn marker_sizes_scale_with_units() {
        let sizes = marker_sizes(&[0.0, 50.0, 100.0]);
        assert_eq!(sizes, vec![MIN_MARKER, 24.0, MAX_MARKER]);
    }
}
