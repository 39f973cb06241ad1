use std::{env, net::SocketAddr, path::PathBuf, time::Duration};

pub const DEFAULT_PORT: u16 = 5050;
pub const DEFAULT_DB_PATH: &str = "data/local_authority_housing.db";
pub const DEFAULT_GEO_PATH: &str = "data/geo_locations.csv";
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_USER_AGENT: &str = "geo_locator";
pub const DEFAULT_GEOCODE_DELAY_MS: u64 = 1000;

pub fn resolve_db_path() -> PathBuf {
    path_from_env("HOUSING_DB_PATH", DEFAULT_DB_PATH)
}

pub fn resolve_geo_path() -> PathBuf {
    path_from_env("GEO_LOCATIONS_PATH", DEFAULT_GEO_PATH)
}

pub fn resolve_corrections_path() -> Option<PathBuf> {
    env::var("GEO_CORRECTIONS_PATH")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
}

pub fn resolve_addr() -> SocketAddr {
    let port = parse_port(env::var("PORT").ok().as_deref());
    SocketAddr::from(([127, 0, 0, 1], port))
}

#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub user_agent: String,
    pub delay: Duration,
}

impl GeocoderConfig {
    pub fn from_env() -> Self {
        let delay_ms = env::var("GEOCODE_DELAY_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(DEFAULT_GEOCODE_DELAY_MS);

        Self {
            base_url: env::var("GEOCODER_URL").unwrap_or_else(|_| DEFAULT_GEOCODER_URL.to_string()),
            user_agent: env::var("GEOCODER_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            delay: Duration::from_millis(delay_ms),
        }
    }
}

fn path_from_env(key: &str, default: &str) -> PathBuf {
    match env::var(key) {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => PathBuf::from(default),
    }
}

fn parse_port(value: Option<&str>) -> u16 {
    value
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT)
}
