//! Shared application state

use crate::config::Settings;
use crate::data::{MarketHistory, SnapshotLoader};
use crate::service::ForecastService;
use std::sync::Arc;

/// Shared state for all handlers
pub struct AppState {
    pub service: ForecastService,
}

impl AppState {
    /// Build the state from settings: load the market history (or fall
    /// back to the built-in sample) and train all models.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Arc<Self>> {
        let history = match &settings.data_dir {
            Some(dir) => match SnapshotLoader::from_dir(dir) {
                Ok(history) => history,
                Err(err) => {
                    tracing::warn!(data_dir = %dir, error = %err, "Failed to load snapshots, using built-in sample history");
                    MarketHistory::sample()
                }
            },
            None => {
                tracing::info!("No data directory configured, using built-in sample history");
                MarketHistory::sample()
            }
        };

        let service = ForecastService::train(history)?;
        Ok(Arc::new(Self { service }))
    }
}
