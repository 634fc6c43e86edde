//! Shared application state

use std::sync::Arc;

use anyhow::Result;

use crate::application::services::{CatalogService, LifecycleService};
use crate::infrastructure::catalog_loader::JsonCatalogSource;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::event_bus::BroadcastEventBus;
use crate::infrastructure::persistence::StateStoreBackend;

/// Shared application state
pub struct AppState {
    /// Lifecycle events; subscribe for audit logging or notifications
    pub event_bus: BroadcastEventBus,
    // Application services
    pub lifecycle_service: Arc<LifecycleService>,
}

impl AppState {
    pub async fn new(config: AppConfig) -> Result<Self> {
        // Fail fast on a missing or invalid catalog
        let catalog_source = Arc::new(JsonCatalogSource::new(&config.catalog.path));
        let catalog_service = Arc::new(CatalogService::load(catalog_source).await?);

        let store = StateStoreBackend::from_config(&config.store).await?;
        let event_bus = BroadcastEventBus::new();

        let lifecycle_service = Arc::new(LifecycleService::new(
            store,
            catalog_service,
            Arc::new(event_bus.clone()),
            config.lifecycle_policy(),
        ));

        Ok(Self {
            event_bus,
            lifecycle_service,
        })
    }
}
