use crate::models::{AreaRecord, Dataset, EnrichedHousingRow, GeoRecord, HousingRow, WaitingRow};
use anyhow::{Context, Result, anyhow, bail};
use chrono::Local;
use rusqlite::{Connection, OpenFlags, types::Value};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::path::Path;
use tracing::info;

const HOUSING_QUERY: &str = "SELECT area_code, year, housing_units FROM Affordable_Housing_Data";
const WAITING_QUERY: &str = "SELECT area_code, year, households_count FROM Waiting_List_Data";
const AREA_QUERY: &str = "SELECT area_code, area_name FROM Area";

/// Reads both fact tables and joins housing rows against the coordinate file.
pub fn load_dataset(db_path: &Path, geo_path: &Path) -> Result<Dataset> {
    if !geo_path.exists() {
        bail!("coordinate file not found: {}", geo_path.display());
    }

    let conn = open_read_only(db_path)?;
    let housing = read_metric_rows(&conn, HOUSING_QUERY)?
        .into_iter()
        .map(|(area_code, year, housing_units)| HousingRow {
            area_code,
            year,
            housing_units,
        })
        .collect::<Vec<_>>();
    let waiting = read_metric_rows(&conn, WAITING_QUERY)?
        .into_iter()
        .map(|(area_code, year, households_count)| WaitingRow {
            area_code,
            year,
            households_count,
        })
        .collect::<Vec<_>>();

    let geo = read_geo_records(geo_path)?;
    let housing = join_coordinates(housing, &geo);

    info!(
        housing_rows = housing.len(),
        waiting_rows = waiting.len(),
        geo_rows = geo.len(),
        "dataset loaded"
    );

    Ok(Dataset {
        housing,
        waiting,
        loaded_at: Local::now(),
    })
}

pub fn read_areas(db_path: &Path) -> Result<Vec<AreaRecord>> {
    let conn = open_read_only(db_path)?;
    let mut stmt = conn
        .prepare(AREA_QUERY)
        .with_context(|| format!("failed to prepare query: {AREA_QUERY}"))?;
    let rows = stmt.query_map([], |row| {
        Ok(AreaRecord {
            area_code: row.get(0)?,
            area_name: row.get(1)?,
        })
    })?;

    let mut areas = Vec::new();
    for row in rows {
        areas.push(row.context("failed to read Area row")?);
    }
    Ok(areas)
}

pub fn read_geo_records(path: &Path) -> Result<Vec<GeoRecord>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open coordinate file: {}", path.display()))?;
    let mut rdr = csv::Reader::from_reader(file);

    let mut records = Vec::new();
    for (index, result) in rdr.deserialize().enumerate() {
        let record: GeoRecord = result.with_context(|| {
            format!("malformed coordinate row {} in {}", index + 1, path.display())
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Overwrites `path` with the full coordinate table.
pub fn write_geo_records(path: &Path, records: &[GeoRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }

    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create coordinate file: {}", path.display()))?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Left join: housing rows without a coordinate match keep `None` coordinates.
pub fn join_coordinates(housing: Vec<HousingRow>, geo: &[GeoRecord]) -> Vec<EnrichedHousingRow> {
    let by_code: HashMap<&str, &GeoRecord> = geo
        .iter()
        .map(|record| (record.area_code.as_str(), record))
        .collect();

    housing
        .into_iter()
        .map(|row| {
            let matched = by_code.get(row.area_code.as_str());
            EnrichedHousingRow {
                area_name: matched.map(|record| record.area_name.clone()),
                latitude: matched.and_then(|record| record.latitude),
                longitude: matched.and_then(|record| record.longitude),
                area_code: row.area_code,
                year: row.year,
                housing_units: row.housing_units,
            }
        })
        .collect()
}

/// Distinct area codes in order of first appearance.
pub fn area_codes(housing: &[EnrichedHousingRow]) -> Vec<String> {
    let mut seen = HashSet::new();
    housing
        .iter()
        .filter(|row| seen.insert(row.area_code.as_str()))
        .map(|row| row.area_code.clone())
        .collect()
}

fn open_read_only(db_path: &Path) -> Result<Connection> {
    Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("failed to open database: {}", db_path.display()))
}

fn read_metric_rows(conn: &Connection, query: &str) -> Result<Vec<(String, i32, f64)>> {
    let mut stmt = conn
        .prepare(query)
        .with_context(|| format!("failed to prepare query: {query}"))?;
    let mut rows = stmt.query([])?;

    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let area_code: String = row.get(0)?;
        let year = coerce_year(row.get::<_, Value>(1)?)
            .with_context(|| format!("invalid year for area {area_code}"))?;
        let metric = coerce_metric(row.get::<_, Value>(2)?)
            .with_context(|| format!("invalid metric for area {area_code} in {year}"))?;
        out.push((area_code, year, metric));
    }
    Ok(out)
}

fn coerce_year(value: Value) -> Result<i32> {
    match value {
        Value::Integer(year) => year_in_range(year),
        Value::Real(year) => whole_year(year),
        Value::Text(text) => {
            let trimmed = text.trim();
            match trimmed.parse::<i64>() {
                Ok(year) => year_in_range(year),
                Err(_) => trimmed
                    .parse::<f64>()
                    .map_err(|_| anyhow!("year is not an integer: {text:?}"))
                    .and_then(whole_year),
            }
        }
        other => Err(anyhow!("year is not an integer: {other:?}")),
    }
}

fn whole_year(year: f64) -> Result<i32> {
    if !year.is_finite() || year.fract() != 0.0 {
        bail!("year is not an integer: {year}");
    }
    if year < f64::from(i32::MIN) || year > f64::from(i32::MAX) {
        bail!("year out of range: {year}");
    }
    Ok(year as i32)
}

fn year_in_range(year: i64) -> Result<i32> {
    i32::try_from(year).map_err(|_| anyhow!("year out of range: {year}"))
}

fn coerce_metric(value: Value) -> Result<f64> {
    match value {
        Value::Null => Ok(f64::NAN),
        Value::Integer(number) => Ok(number as f64),
        Value::Real(number) => Ok(number),
        Value::Text(text) if text.trim().is_empty() => Ok(f64::NAN),
        Value::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| anyhow!("metric is not numeric: {text:?}")),
        Value::Blob(_) => Err(anyhow!("metric is a blob")),
    }
}
