use crate::models::Dataset;
use std::sync::Arc;

/// Read-only snapshot shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub data: Arc<Dataset>,
    pub area_codes: Arc<Vec<String>>,
}

impl AppState {
    pub fn new(data: Dataset) -> Self {
        let area_codes = crate::loader::area_codes(&data.housing);
        Self {
            data: Arc::new(data),
            area_codes: Arc::new(area_codes),
        }
    }
}
