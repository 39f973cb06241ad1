//! Turns the loaded tables into typed chart descriptions.
//!
//! Every function here is pure apart from `tracing` diagnostics on the empty
//! and degenerate paths. Rendering into browser figures lives in `figure`.

use crate::models::{EnrichedHousingRow, MetricMode, WaitingRow};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{info, warn};

pub const NO_DATA_TITLE: &str = "No Data Available for Selected Areas";
pub const NO_HOUSING_TITLE: &str = "No Housing Data Available";
pub const DONUT_HOLE: f64 = 0.4;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartSpec {
    Series(SeriesChart),
    Geo(GeoChart),
    Pie(PieChart),
    CategoryBar(CategoryBarChart),
    Empty { title: String, kind: EmptyKind },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyKind {
    Geo,
    Pie,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    Line,
    Bar,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesChart {
    pub kind: SeriesKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub area_code: String,
    pub points: Vec<SeriesPoint>,
}

/// `value` is NaN where the metric is undefined; it serializes as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub year: i32,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoChart {
    pub title: String,
    pub points: Vec<GeoPoint>,
    pub view: MapView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoPoint {
    pub area_code: String,
    pub area_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub housing_units: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub center_lat: f64,
    pub center_lon: f64,
    pub projection_scale: f64,
    pub scope: &'static str,
}

impl Default for MapView {
    fn default() -> Self {
        // Central London.
        Self {
            center_lat: 51.51,
            center_lon: -0.09,
            projection_scale: 50.0,
            scope: "europe",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieChart {
    pub title: String,
    pub slices: Vec<Slice>,
    pub hole: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice {
    pub area_code: String,
    pub housing_units: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub bars: Vec<Slice>,
}

/// Waiting-list line chart.
pub fn trend_series(waiting: &[WaitingRow], areas: &[String], mode: MetricMode) -> ChartSpec {
    let rows = waiting
        .iter()
        .map(|row| (row.area_code.as_str(), row.year, row.households_count));
    let y_label = match mode {
        MetricMode::Total => "Total Households",
        MetricMode::PctChange => "Percentage Change (%)",
        MetricMode::Normalized => "Normalized Value",
    };

    ChartSpec::Series(SeriesChart {
        kind: SeriesKind::Line,
        title: "Households Waiting List Over Time".to_string(),
        x_label: "Year".to_string(),
        y_label: y_label.to_string(),
        series: build_series(rows, areas, mode),
    })
}

/// Housing supply bar chart.
pub fn supply_series(
    housing: &[EnrichedHousingRow],
    areas: &[String],
    mode: MetricMode,
) -> ChartSpec {
    let rows = housing
        .iter()
        .map(|row| (row.area_code.as_str(), row.year, row.housing_units));
    let y_label = match mode {
        MetricMode::Total => "Total Housing Units",
        MetricMode::PctChange => "Percentage Change (%)",
        MetricMode::Normalized => "Normalized Value",
    };

    ChartSpec::Series(SeriesChart {
        kind: SeriesKind::Bar,
        title: "Housing Supply Over Time".to_string(),
        x_label: "Year".to_string(),
        y_label: y_label.to_string(),
        series: build_series(rows, areas, mode),
    })
}

/// One point per selected area that has coordinates, sized by total housing units.
pub fn geo_distribution(housing: &[EnrichedHousingRow], areas: &[String]) -> ChartSpec {
    let selected = selection(areas);
    let mut points: Vec<GeoPoint> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for row in housing.iter().filter(|row| selected.contains(row.area_code.as_str())) {
        let Some((latitude, longitude)) = row.coordinates() else {
            continue;
        };
        let slot = *index.entry(row.area_code.as_str()).or_insert_with(|| {
            points.push(GeoPoint {
                area_code: row.area_code.clone(),
                area_name: row.area_name.clone().unwrap_or_else(|| row.area_code.clone()),
                latitude,
                longitude,
                housing_units: 0.0,
            });
            points.len() - 1
        });
        if row.housing_units.is_finite() {
            points[slot].housing_units += row.housing_units;
        }
    }

    if points.is_empty() {
        warn!(?areas, "no mappable rows for selected areas");
        return ChartSpec::Empty {
            title: NO_DATA_TITLE.to_string(),
            kind: EmptyKind::Geo,
        };
    }

    ChartSpec::Geo(GeoChart {
        title: "Housing Supply Distribution".to_string(),
        points,
        view: MapView::default(),
    })
}

/// Share of housing units per area; falls back to a bar when only one area remains.
pub fn composition_breakdown(housing: &[EnrichedHousingRow], areas: &[String]) -> ChartSpec {
    let selected = selection(areas);
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for row in housing.iter().filter(|row| selected.contains(row.area_code.as_str())) {
        let total = totals.entry(row.area_code.as_str()).or_insert(0.0);
        if row.housing_units.is_finite() {
            *total += row.housing_units;
        }
    }

    if totals.is_empty() {
        warn!(?areas, "no data available for selected areas");
        return ChartSpec::Empty {
            title: NO_DATA_TITLE.to_string(),
            kind: EmptyKind::Pie,
        };
    }

    if totals.values().sum::<f64>() == 0.0 {
        warn!(?areas, "no valid housing data available");
        return ChartSpec::Empty {
            title: NO_HOUSING_TITLE.to_string(),
            kind: EmptyKind::Pie,
        };
    }

    let slices: Vec<Slice> = totals
        .into_iter()
        .map(|(area_code, housing_units)| Slice {
            area_code: area_code.to_string(),
            housing_units,
        })
        .collect();

    if slices.len() == 1 {
        info!(area = %slices[0].area_code, "only one area selected, switching to bar chart");
        return ChartSpec::CategoryBar(CategoryBarChart {
            title: "Housing Units for Selected Area".to_string(),
            x_label: "Area Code".to_string(),
            y_label: "Housing Units".to_string(),
            bars: slices,
        });
    }

    ChartSpec::Pie(PieChart {
        title: "Housing Distribution by Area".to_string(),
        slices,
        hole: DONUT_HOLE,
    })
}

fn selection(areas: &[String]) -> HashSet<&str> {
    areas.iter().map(String::as_str).collect()
}

/// Groups the selected rows by area (first-appearance order) and applies `mode`
/// to each area's own series. Row order within an area is preserved.
fn build_series<'a>(
    rows: impl Iterator<Item = (&'a str, i32, f64)>,
    areas: &[String],
    mode: MetricMode,
) -> Vec<Series> {
    let selected = selection(areas);
    let mut series: Vec<Series> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for (area_code, year, value) in rows.filter(|(code, _, _)| selected.contains(code)) {
        let slot = *index.entry(area_code).or_insert_with(|| {
            series.push(Series {
                area_code: area_code.to_string(),
                points: Vec::new(),
            });
            series.len() - 1
        });
        series[slot].points.push(SeriesPoint { year, value });
    }

    for item in &mut series {
        apply_mode(&mut item.points, mode);
    }
    series
}

pub fn apply_mode(points: &mut [SeriesPoint], mode: MetricMode) {
    match mode {
        MetricMode::Total => {}
        MetricMode::PctChange => pct_change(points),
        MetricMode::Normalized => normalize(points),
    }
}

/// Percent change against the previous year of the same area. The earliest
/// observation has no predecessor and becomes NaN.
fn pct_change(points: &mut [SeriesPoint]) {
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by_key(|&i| points[i].year);

    let originals: Vec<f64> = points.iter().map(|point| point.value).collect();
    let mut previous: Option<f64> = None;
    for i in order {
        let current = originals[i];
        points[i].value = match previous {
            Some(prev) => (current - prev) / prev * 100.0,
            None => f64::NAN,
        };
        previous = Some(current);
    }
}

/// Min-max scaling over the area's finite values. A flat series maps to 0.
fn normalize(points: &mut [SeriesPoint]) {
    let finite = points.iter().map(|point| point.value).filter(|value| value.is_finite());
    let (min, max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), value| {
        (min.min(value), max.max(value))
    });

    let range = max - min;
    for point in points.iter_mut().filter(|point| point.value.is_finite()) {
        point.value = if range > 0.0 { (point.value - min) / range } else { 0.0 };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn housing(code: &str, year: i32, units: f64) -> EnrichedHousingRow {
        EnrichedHousingRow {
            area_code: code.to_string(),
            year,
            housing_units: units,
            area_name: Some(format!("{code} name")),
            latitude: Some(51.5),
            longitude: Some(-0.1),
        }
    }

    fn waiting(code: &str, year: i32, count: f64) -> WaitingRow {
        WaitingRow {
            area_code: code.to_string(),
            year,
            households_count: count,
        }
    }

    fn areas(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|code| code.to_string()).collect()
    }

    fn sample_housing() -> Vec<EnrichedHousingRow> {
        vec![housing("A1", 2020, 100.0), housing("A1", 2021, 150.0), housing("A2", 2020, 200.0)]
    }

    fn series_of(spec: ChartSpec) -> SeriesChart {
        match spec {
            ChartSpec::Series(chart) => chart,
            other => panic!("expected series chart, got {other:?}"),
        }
    }

    #[test]
    fn total_mode_keeps_rows_unchanged() {
        let housing = sample_housing();
        let chart = series_of(supply_series(&housing, &areas(&["A1", "A2"]), MetricMode::Total));
        assert_eq!(chart.kind, SeriesKind::Bar);
        assert_eq!(chart.y_label, "Total Housing Units");

        let bars: Vec<(String, i32, f64)> = chart
            .series
            .iter()
            .flat_map(|s| s.points.iter().map(|p| (s.area_code.clone(), p.year, p.value)))
            .collect();
        assert_eq!(bars, vec![
            ("A1".to_string(), 2020, 100.0),
            ("A1".to_string(), 2021, 150.0),
            ("A2".to_string(), 2020, 200.0),
        ]);
    }

    #[test]
    fn unselected_areas_are_filtered_out() {
        let chart = series_of(supply_series(&sample_housing(), &areas(&["A2"]), MetricMode::Total));
        assert_eq!(chart.series.len(), 1);
        assert_eq!(chart.series[0].area_code, "A2");
    }

    #[test]
    fn pct_change_leaves_first_year_as_gap() {
        let rows = vec![
            waiting("A1", 2021, 150.0),
            waiting("A1", 2020, 100.0),
            waiting("A1", 2022, 120.0),
            waiting("B", 2020, 10.0),
        ];
        let chart = series_of(trend_series(&rows, &areas(&["A1", "B"]), MetricMode::PctChange));
        assert_eq!(chart.kind, SeriesKind::Line);
        assert_eq!(chart.y_label, "Percentage Change (%)");

        let a1 = &chart.series[0].points;
        assert_eq!(a1[0].year, 2021);
        assert!((a1[0].value - 50.0).abs() < 1e-9);
        assert!(a1[1].value.is_nan());
        assert!((a1[2].value - -20.0).abs() < 1e-9);

        let b = &chart.series[1].points;
        assert!(b[0].value.is_nan());
    }

    #[test]
    fn pct_change_after_zero_or_missing_value_is_a_gap() {
        let rows = vec![
            waiting("A1", 2020, 0.0),
            waiting("A1", 2021, 10.0),
            waiting("A2", 2020, f64::NAN),
            waiting("A2", 2021, 40.0),
        ];
        let spec = trend_series(&rows, &areas(&["A1", "A2"]), MetricMode::PctChange);
        let json = serde_json::to_value(&spec).unwrap();

        for series in json["series"].as_array().unwrap() {
            let values: Vec<&serde_json::Value> =
                series["points"].as_array().unwrap().iter().map(|p| &p["value"]).collect();
            assert_eq!(values, vec![&serde_json::Value::Null, &serde_json::Value::Null]);
        }
    }

    #[test]
    fn normalized_spans_zero_to_one_per_area() {
        let rows = vec![
            waiting("A1", 2020, 10.0),
            waiting("A1", 2021, 30.0),
            waiting("A1", 2022, 20.0),
            waiting("A2", 2020, 1000.0),
            waiting("A2", 2021, 3000.0),
        ];
        let chart = series_of(trend_series(&rows, &areas(&["A1", "A2"]), MetricMode::Normalized));
        for series in &chart.series {
            let values: Vec<f64> = series.points.iter().map(|p| p.value).collect();
            let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            assert_eq!(min, 0.0);
            assert_eq!(max, 1.0);
        }
        assert_eq!(chart.series[0].points[2].value, 0.5);
    }

    #[test]
    fn normalized_flat_series_does_not_divide_by_zero() {
        let rows = vec![housing("A1", 2020, 7.0), housing("A1", 2021, 7.0)];
        let chart = series_of(supply_series(&rows, &areas(&["A1"]), MetricMode::Normalized));
        assert!(chart.series[0].points.iter().all(|p| p.value == 0.0));
    }

    #[test]
    fn geo_without_coordinates_is_no_data() {
        let mut rows = sample_housing();
        for row in &mut rows {
            row.latitude = None;
        }
        let spec = geo_distribution(&rows, &areas(&["A1", "A2"]));
        assert_eq!(spec, ChartSpec::Empty {
            title: NO_DATA_TITLE.to_string(),
            kind: EmptyKind::Geo,
        });
    }

    #[test]
    fn geo_emits_one_point_per_area() {
        let mut rows = sample_housing();
        rows.push(EnrichedHousingRow {
            latitude: None,
            longitude: None,
            ..housing("A3", 2020, 5.0)
        });
        let spec = geo_distribution(&rows, &areas(&["A1", "A2", "A3"]));
        let ChartSpec::Geo(chart) = spec else {
            panic!("expected geo chart");
        };
        assert_eq!(chart.points.len(), 2);
        assert_eq!(chart.points[0].area_code, "A1");
        assert_eq!(chart.points[0].housing_units, 250.0);
        assert_eq!(chart.points[0].area_name, "A1 name");
        assert_eq!(chart.view, MapView::default());
    }

    #[test]
    fn composition_single_area_falls_back_to_bar() {
        let spec = composition_breakdown(&sample_housing(), &areas(&["A1"]));
        let ChartSpec::CategoryBar(chart) = spec else {
            panic!("expected category bar");
        };
        assert_eq!(chart.bars, vec![Slice {
            area_code: "A1".to_string(),
            housing_units: 250.0,
        }]);
    }

    #[test]
    fn composition_multiple_areas_is_pie() {
        let spec = composition_breakdown(&sample_housing(), &areas(&["A2", "A1"]));
        let ChartSpec::Pie(chart) = spec else {
            panic!("expected pie");
        };
        assert_eq!(chart.hole, DONUT_HOLE);
        let codes: Vec<&str> = chart.slices.iter().map(|s| s.area_code.as_str()).collect();
        assert_eq!(codes, vec!["A1", "A2"]);
    }

    #[test]
    fn composition_zero_total_is_no_housing_data() {
        let rows = vec![housing("A1", 2020, 0.0), housing("A2", 2020, 0.0)];
        let spec = composition_breakdown(&rows, &areas(&["A1", "A2"]));
        assert_eq!(spec, ChartSpec::Empty {
            title: NO_HOUSING_TITLE.to_string(),
            kind: EmptyKind::Pie,
        });
    }

    #[test]
    fn composition_unknown_areas_is_no_data() {
        let spec = composition_breakdown(&sample_housing(), &areas(&["Z9"]));
        assert_eq!(spec, ChartSpec::Empty {
            title: NO_DATA_TITLE.to_string(),
            kind: EmptyKind::Pie,
        });
    }

    #[test]
    fn nan_serializes_as_null() {
        let point = SeriesPoint { year: 2020, value: f64::NAN };
        let json = serde_json::to_value(point).unwrap();
        assert_eq!(json["value"], serde_json::Value::Null);
    }
}
