use crate::charts;
use crate::errors::AppError;
use crate::figure::{self, Figure};
use crate::models::{AreaOption, AreasResponse, ChartQuery, MetricMode};
use crate::state::AppState;
use crate::ui::render_index;
use axum::{
    extract::{Query, State},
    response::Html,
    Json,
};

pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_index(&state.area_codes, &state.data.loaded_at))
}

pub async fn get_areas(State(state): State<AppState>) -> Json<AreasResponse> {
    let options = state
        .area_codes
        .iter()
        .map(|code| AreaOption {
            label: code.clone(),
            value: code.clone(),
        })
        .collect();
    let default = state.area_codes.iter().take(1).cloned().collect();

    Json(AreasResponse { options, default })
}

pub async fn waiting_chart(
    State(state): State<AppState>,
    Query(query): Query<ChartQuery>,
) -> Result<Json<Figure>, AppError> {
    let areas = parse_areas(query.areas.as_deref())?;
    let mode = parse_mode(query.mode.as_deref())?;
    let spec = charts::trend_series(&state.data.waiting, &areas, mode);
    Ok(Json(figure::render(&spec)))
}

pub async fn housing_chart(
    State(state): State<AppState>,
    Query(query): Query<ChartQuery>,
) -> Result<Json<Figure>, AppError> {
    let areas = parse_areas(query.areas.as_deref())?;
    let mode = parse_mode(query.mode.as_deref())?;
    let spec = charts::supply_series(&state.data.housing, &areas, mode);
    Ok(Json(figure::render(&spec)))
}

pub async fn map_chart(
    State(state): State<AppState>,
    Query(query): Query<ChartQuery>,
) -> Result<Json<Figure>, AppError> {
    let areas = parse_areas(query.areas.as_deref())?;
    let spec = charts::geo_distribution(&state.data.housing, &areas);
    Ok(Json(figure::render(&spec)))
}

pub async fn composition_chart(
    State(state): State<AppState>,
    Query(query): Query<ChartQuery>,
) -> Result<Json<Figure>, AppError> {
    let areas = parse_areas(query.areas.as_deref())?;
    let spec = charts::composition_breakdown(&state.data.housing, &areas);
    Ok(Json(figure::render(&spec)))
}

/// Comma-separated area codes; at least one is required.
fn parse_areas(raw: Option<&str>) -> Result<Vec<String>, AppError> {
    let mut areas: Vec<String> = Vec::new();
    for code in raw.unwrap_or_default().split(',').map(str::trim) {
        if !code.is_empty() && !areas.iter().any(|seen| seen == code) {
            areas.push(code.to_string());
        }
    }

    if areas.is_empty() {
        return Err(AppError::bad_request("select at least one area code"));
    }
    Ok(areas)
}

fn parse_mode(raw: Option<&str>) -> Result<MetricMode, AppError> {
    let raw = raw.unwrap_or_default();
    MetricMode::parse(raw).ok_or_else(|| {
        AppError::bad_request("mode must be 'total', 'pct_change' or 'normalized'")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn areas_are_trimmed_and_deduplicated() {
        let areas = parse_areas(Some(" A1, A2,,A1 ")).unwrap();
        assert_eq!(areas, vec!["A1", "A2"]);
    }

    #[test]
    fn empty_selection_is_rejected() {
        let err = parse_areas(Some(" , ")).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(parse_areas(None).is_err());
    }

    #[test]
    fn mode_defaults_to_total() {
        assert_eq!(parse_mode(None).unwrap(), MetricMode::Total);
        assert_eq!(parse_mode(Some("pct_change")).unwrap(), MetricMode::PctChange);
        assert!(parse_mode(Some("median")).is_err());
    }
}
