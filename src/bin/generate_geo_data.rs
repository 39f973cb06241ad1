use housing_dashboard::config::{self, GeocoderConfig};
use housing_dashboard::geocode::{enrich_areas, NominatimGeocoder};
use housing_dashboard::loader::{read_areas, write_geo_records};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let db_path = config::resolve_db_path();
    let geo_path = config::resolve_geo_path();
    let geocoder_config = GeocoderConfig::from_env();

    let areas = read_areas(&db_path)?;
    info!(areas = areas.len(), geocoder = %geocoder_config.base_url, "geocoding areas");

    let geocoder = NominatimGeocoder::new(&geocoder_config)?;
    let records = enrich_areas(&geocoder, &areas).await;
    tokio::time::sleep(geocoder_config.delay).await;

    write_geo_records(&geo_path, &records)?;
    info!(path = %geo_path.display(), "coordinate data saved");
    Ok(())
}
