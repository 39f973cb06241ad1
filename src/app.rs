use crate::handlers;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/areas", get(handlers::get_areas))
        .route("/api/charts/waiting", get(handlers::waiting_chart))
        .route("/api/charts/housing", get(handlers::housing_chart))
        .route("/api/charts/map", get(handlers::map_chart))
        .route("/api/charts/composition", get(handlers::composition_chart))
        .with_state(state)
}
