use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaRecord {
    pub area_code: String,
    pub area_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HousingRow {
    pub area_code: String,
    pub year: i32,
    pub housing_units: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaitingRow {
    pub area_code: String,
    pub year: i32,
    pub households_count: f64,
}

/// One row of the coordinate file. Missing coordinates are written as empty fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoRecord {
    pub area_code: String,
    pub area_name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedHousingRow {
    pub area_code: String,
    pub year: i32,
    pub housing_units: f64,
    pub area_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl EnrichedHousingRow {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricMode {
    #[default]
    Total,
    PctChange,
    Normalized,
}

impl MetricMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "" | "total" => Some(Self::Total),
            "pct_change" => Some(Self::PctChange),
            "normalized" => Some(Self::Normalized),
            _ => None,
        }
    }
}

/// Everything the dashboard reads, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub housing: Vec<EnrichedHousingRow>,
    pub waiting: Vec<WaitingRow>,
    pub loaded_at: DateTime<Local>,
}

#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    pub areas: Option<String>,
    pub mode: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AreaOption {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct AreasResponse {
    pub options: Vec<AreaOption>,
    pub default: Vec<String>,
}
