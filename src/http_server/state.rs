//! Shared handler state

use std::sync::Arc;

use crate::catalog::Catalog;
use crate::observability::MetricsRegistry;

/// State shared across handlers
#[derive(Debug)]
pub struct AppState {
    pub catalog: Catalog,
    pub metrics: Arc<MetricsRegistry>,
}

impl AppState {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            metrics: Arc::new(MetricsRegistry::new()),
        }
    }
}
