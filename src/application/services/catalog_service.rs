//! Catalog Service - Owns the active catalog snapshot and its hot reload
//!
//! Readers clone an `Arc` of the current snapshot and keep using it for the
//! rest of their operation. A reload builds a complete new snapshot first and
//! only then swaps the pointer, so nobody observes a half-loaded catalog.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::application::dto::CatalogReloadDto;
use crate::application::ports::outbound::CatalogSourcePort;
use crate::domain::aggregates::{CatalogError, CatalogSnapshot};

pub struct CatalogService {
    source: Arc<dyn CatalogSourcePort>,
    current: RwLock<Arc<CatalogSnapshot>>,
}

impl CatalogService {
    /// Load the initial snapshot; an invalid catalog aborts startup
    pub async fn load(source: Arc<dyn CatalogSourcePort>) -> Result<Self> {
        let snapshot = Self::build(source.as_ref())
            .await
            .with_context(|| format!("Failed to load creature catalog from {}", source.describe()))?;

        Ok(Self {
            source,
            current: RwLock::new(Arc::new(snapshot)),
        })
    }

    /// The currently active snapshot
    pub async fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.current.read().await.clone()
    }

    /// Re-read the source and swap the snapshot in.
    ///
    /// On failure the previous snapshot stays active.
    #[instrument(skip(self))]
    pub async fn reload(&self) -> Result<CatalogReloadDto, CatalogError> {
        let snapshot = match Self::build(self.source.as_ref()).await {
            Ok(snapshot) => Arc::new(snapshot),
            Err(e) => {
                warn!(error = %e, "Catalog reload rejected, keeping previous snapshot");
                return Err(e);
            }
        };

        let report = CatalogReloadDto::from(snapshot.as_ref());
        *self.current.write().await = snapshot;
        info!(creatures = report.creature_count, "Catalog reloaded");
        Ok(report)
    }

    async fn build(source: &dyn CatalogSourcePort) -> Result<CatalogSnapshot, CatalogError> {
        let definitions = source.load().await?;
        let snapshot = CatalogSnapshot::new(definitions)?;

        for (source_id, target_id) in snapshot.dangling_edges() {
            warn!(
                source = %source_id,
                target = %target_id,
                "Evolution edge points at a creature missing from the catalog"
            );
        }

        info!(
            creatures = snapshot.len(),
            default_initial = %snapshot.default_initial().id,
            "Catalog snapshot built"
        );
        Ok(snapshot)
    }
}
