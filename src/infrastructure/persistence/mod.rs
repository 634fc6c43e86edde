//! Persistence adapters for creature state
//!
//! The backend is picked at runtime from `store.backend`; both variants
//! implement `CreatureStatePort` and the enum simply delegates.

mod memory_state_store;
mod sqlite_state_store;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use crate::application::ports::outbound::{CreatureStatePort, StoreError};
use crate::domain::entities::{CreatureProfile, CreatureState, TurnReceipt};
use crate::domain::value_objects::{CreatureId, PartitionKey};
use crate::infrastructure::config::{StoreBackend, StoreConfig};

pub use memory_state_store::InMemoryCreatureStore;
pub use sqlite_state_store::SqliteCreatureStore;

/// Runtime-selected state store
pub enum StateStoreBackend {
    Memory(InMemoryCreatureStore),
    Sqlite(SqliteCreatureStore),
}

impl StateStoreBackend {
    /// Build the configured backend, creating the SQLite file and schema if needed
    pub async fn from_config(config: &StoreConfig) -> Result<Arc<Self>> {
        let backend = match config.backend {
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory creature store; state is lost on restart");
                StateStoreBackend::Memory(InMemoryCreatureStore::new())
            }
            StoreBackend::Sqlite => {
                if let Some(parent) = std::path::Path::new(&config.sqlite_path).parent() {
                    std::fs::create_dir_all(parent)
                        .context("Failed to create creature database directory")?;
                }

                let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", config.sqlite_path))
                    .context("Invalid SQLite path")?
                    .create_if_missing(true)
                    .journal_mode(SqliteJournalMode::Wal)
                    .busy_timeout(Duration::from_millis(config.busy_timeout_ms));

                let pool = SqlitePoolOptions::new()
                    .max_connections(config.max_connections.max(1))
                    .connect_with(options)
                    .await
                    .context("Failed to connect to SQLite creature database")?;
                tracing::info!("Connected to SQLite creature database: {}", config.sqlite_path);

                let store = SqliteCreatureStore::new(pool)
                    .await
                    .context("Failed to create creature tables")?;
                StateStoreBackend::Sqlite(store)
            }
        };

        Ok(Arc::new(backend))
    }
}

#[async_trait]
impl CreatureStatePort for StateStoreBackend {
    async fn get_or_create(
        &self,
        key: &PartitionKey,
        default_id: &CreatureId,
    ) -> Result<CreatureState, StoreError> {
        match self {
            StateStoreBackend::Memory(s) => s.get_or_create(key, default_id).await,
            StateStoreBackend::Sqlite(s) => s.get_or_create(key, default_id).await,
        }
    }

    async fn get(&self, key: &PartitionKey) -> Result<Option<CreatureState>, StoreError> {
        match self {
            StateStoreBackend::Memory(s) => s.get(key).await,
            StateStoreBackend::Sqlite(s) => s.get(key).await,
        }
    }

    async fn save(&self, profile: &CreatureProfile) -> Result<(), StoreError> {
        match self {
            StateStoreBackend::Memory(s) => s.save(profile).await,
            StateStoreBackend::Sqlite(s) => s.save(profile).await,
        }
    }

    async fn reset(
        &self,
        key: &PartitionKey,
        default_id: &CreatureId,
    ) -> Result<CreatureState, StoreError> {
        match self {
            StateStoreBackend::Memory(s) => s.reset(key, default_id).await,
            StateStoreBackend::Sqlite(s) => s.reset(key, default_id).await,
        }
    }

    async fn update_current_id(
        &self,
        key: &PartitionKey,
        creature_id: &CreatureId,
    ) -> Result<(), StoreError> {
        match self {
            StateStoreBackend::Memory(s) => s.update_current_id(key, creature_id).await,
            StateStoreBackend::Sqlite(s) => s.update_current_id(key, creature_id).await,
        }
    }

    async fn record_turn(
        &self,
        key: &PartitionKey,
        turns_delta: u64,
        currency: u64,
    ) -> Result<TurnReceipt, StoreError> {
        match self {
            StateStoreBackend::Memory(s) => s.record_turn(key, turns_delta, currency).await,
            StateStoreBackend::Sqlite(s) => s.record_turn(key, turns_delta, currency).await,
        }
    }

    async fn commit_turn(
        &self,
        profile: &CreatureProfile,
        turns_delta: u64,
        currency: u64,
    ) -> Result<TurnReceipt, StoreError> {
        match self {
            StateStoreBackend::Memory(s) => s.commit_turn(profile, turns_delta, currency).await,
            StateStoreBackend::Sqlite(s) => s.commit_turn(profile, turns_delta, currency).await,
        }
    }

    async fn get_all(&self) -> Result<Vec<CreatureState>, StoreError> {
        match self {
            StateStoreBackend::Memory(s) => s.get_all().await,
            StateStoreBackend::Sqlite(s) => s.get_all().await,
        }
    }

    async fn balance(&self, owner: &str) -> Result<u64, StoreError> {
        match self {
            StateStoreBackend::Memory(s) => s.balance(owner).await,
            StateStoreBackend::Sqlite(s) => s.balance(owner).await,
        }
    }
}
