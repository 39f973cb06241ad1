use housing_dashboard::{config, load_dataset, router, AppState};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let db_path = config::resolve_db_path();
    let geo_path = config::resolve_geo_path();
    info!(db = %db_path.display(), geo = %geo_path.display(), "loading dataset");

    let dataset = load_dataset(&db_path, &geo_path)?;
    let app = router(AppState::new(dataset));

    let addr = config::resolve_addr();
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
