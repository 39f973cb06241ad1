use crate::config::GeocoderConfig;
use crate::models::{AreaRecord, GeoRecord};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` means the service answered but found no match.
    async fn lookup(&self, query: &str) -> Result<Option<(f64, f64)>>;
}

pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocoderConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .context("failed to build geocoder client")?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn lookup(&self, query: &str) -> Result<Option<(f64, f64)>> {
        let places: Vec<Place> = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(place) = places.into_iter().next() else {
            return Ok(None);
        };
        let lat = place.lat.parse::<f64>().context("latitude is not numeric")?;
        let lon = place.lon.parse::<f64>().context("longitude is not numeric")?;
        Ok(Some((lat, lon)))
    }
}

pub fn lookup_query(area_name: &str) -> String {
    format!("{area_name}, UK")
}

/// Geocodes every area. A failed or empty lookup leaves that area without
/// coordinates and the batch carries on.
pub async fn enrich_areas(geocoder: &dyn Geocoder, areas: &[AreaRecord]) -> Vec<GeoRecord> {
    let mut records = Vec::with_capacity(areas.len());
    let mut missed = 0usize;

    for area in areas {
        let coordinates = match geocoder.lookup(&lookup_query(&area.area_name)).await {
            Ok(Some(found)) => Some(found),
            Ok(None) => {
                warn!(
                    area_code = %area.area_code,
                    area_name = %area.area_name,
                    "no geocoding match"
                );
                None
            }
            Err(err) => {
                warn!(
                    area_code = %area.area_code,
                    area_name = %area.area_name,
                    "geocoding failed: {err:#}"
                );
                None
            }
        };
        if coordinates.is_none() {
            missed += 1;
        }

        records.push(GeoRecord {
            area_code: area.area_code.clone(),
            area_name: area.area_name.clone(),
            latitude: coordinates.map(|(lat, _)| lat),
            longitude: coordinates.map(|(_, lon)| lon),
        });
    }

    info!(
        total = areas.len(),
        matched = areas.len() - missed,
        missed,
        "geocoding batch finished"
    );
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeGeocoder {
        answers: HashMap<String, (f64, f64)>,
        failing: String,
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Geocoder for FakeGeocoder {
        async fn lookup(&self, query: &str) -> Result<Option<(f64, f64)>> {
            self.queries.lock().unwrap().push(query.to_string());
            if query == self.failing {
                return Err(anyhow!("service unavailable"));
            }
            Ok(self.answers.get(query).copied())
        }
    }

    fn area(code: &str, name: &str) -> AreaRecord {
        AreaRecord {
            area_code: code.to_string(),
            area_name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn failures_do_not_abort_the_batch() {
        let geocoder = FakeGeocoder {
            answers: HashMap::from([("Camden, UK".to_string(), (51.54, -0.16))]),
            failing: "Sutton, UK".to_string(),
            queries: Mutex::new(Vec::new()),
        };
        let areas = vec![
            area("E09000007", "Camden"),
            area("E09000029", "Sutton"),
            area("E99999999", "Nowhere"),
        ];

        let records = enrich_areas(&geocoder, &areas).await;

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].latitude, Some(51.54));
        assert_eq!(records[0].longitude, Some(-0.16));
        assert_eq!(records[1].latitude, None);
        assert_eq!(records[1].area_name, "Sutton");
        assert_eq!(records[2].longitude, None);
        assert_eq!(
            *geocoder.queries.lock().unwrap(),
            vec!["Camden, UK", "Sutton, UK", "Nowhere, UK"]
        );
    }
}
