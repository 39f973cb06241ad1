use anyhow::{Context, Result, anyhow};
use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Area code to `(latitude, longitude)`.
pub type Corrections = BTreeMap<String, (f64, f64)>;

/// Known-bad geocoding results and their replacements.
pub fn default_corrections() -> Corrections {
    [
        ("E09000030", (51.5155, -0.0724)),     // Tower Hamlets
        ("E12000008", (51.2723, -0.5196)),     // South East
        ("E12000009", (51.4545, -2.5879)),     // South West
        ("E09000029", (51.3618, -0.1934)),     // Sutton
        ("E92000001", (51.509865, -0.118092)), // England
    ]
    .into_iter()
    .map(|(code, coords)| (code.to_string(), coords))
    .collect()
}

/// Reads a JSON object of `{"area_code": [lat, lon]}`.
pub fn load_corrections(path: &Path) -> Result<Corrections> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read corrections file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse corrections file: {}", path.display()))
}

/// Rewrites latitude/longitude for the listed area codes. Every other field
/// is written back as read, and CRLF input stays CRLF. Returns the new text
/// and the number of rows changed.
pub fn apply_corrections(input: &str, corrections: &Corrections) -> Result<(String, usize)> {
    let mut rdr = ReaderBuilder::new().from_reader(input.as_bytes());
    let headers = rdr.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| anyhow!("coordinate file has no '{name}' column"))
    };
    let code_idx = column("area_code")?;
    let lat_idx = column("latitude")?;
    let lon_idx = column("longitude")?;

    let terminator = if input.contains("\r\n") {
        Terminator::CRLF
    } else {
        Terminator::Any(b'\n')
    };
    let mut wtr = WriterBuilder::new()
        .terminator(terminator)
        .from_writer(Vec::new());
    wtr.write_record(&headers)?;

    let mut changed = 0;
    for result in rdr.records() {
        let record = result?;
        let fix = record.get(code_idx).and_then(|code| corrections.get(code));
        match fix {
            Some(&(lat, lon)) => {
                let fixed: StringRecord = record
                    .iter()
                    .enumerate()
                    .map(|(i, field)| {
                        if i == lat_idx {
                            lat.to_string()
                        } else if i == lon_idx {
                            lon.to_string()
                        } else {
                            field.to_string()
                        }
                    })
                    .collect();
                wtr.write_record(&fixed)?;
                changed += 1;
            }
            None => wtr.write_record(&record)?,
        }
    }

    let bytes = wtr.into_inner().map_err(|err| anyhow!("failed to flush csv: {err}"))?;
    Ok((String::from_utf8(bytes)?, changed))
}

/// Applies `corrections` to the coordinate file in place.
pub fn correct_file(path: &Path, corrections: &Corrections) -> Result<usize> {
    let input = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read coordinate file: {}", path.display()))?;
    let (output, changed) = apply_corrections(&input, corrections)?;
    std::fs::write(path, output)
        .with_context(|| format!("failed to write coordinate file: {}", path.display()))?;

    info!(path = %path.display(), changed, "coordinate corrections applied");
    Ok(changed)
}
