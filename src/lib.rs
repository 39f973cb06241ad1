pub mod app;
pub mod charts;
pub mod config;
pub mod corrections;
pub mod errors;
pub mod figure;
pub mod geocode;
pub mod handlers;
pub mod loader;
pub mod models;
pub mod state;
pub mod ui;

pub use app::router;
pub use loader::load_dataset;
pub use state::AppState;
