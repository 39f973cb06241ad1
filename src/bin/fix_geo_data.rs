use housing_dashboard::config;
use housing_dashboard::corrections::{correct_file, default_corrections, load_corrections};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let geo_path = config::resolve_geo_path();
    let corrections = match config::resolve_corrections_path() {
        Some(path) => {
            info!(path = %path.display(), "using corrections file");
            load_corrections(&path)?
        }
        None => default_corrections(),
    };

    let changed = correct_file(&geo_path, &corrections)?;
    info!(path = %geo_path.display(), changed, "corrected coordinate data saved");
    Ok(())
}
