//! In-memory creature state store
//!
//! Records live in a sharded concurrent map keyed by partition, so writers on
//! different partitions never contend on a global lock. Every operation holds
//! at most one shard guard, and never across an await point.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::application::ports::outbound::{CreatureStatePort, StoreError};
use crate::domain::entities::{CreatureProfile, CreatureState, TurnReceipt};
use crate::domain::value_objects::{CreatureId, PartitionKey};

#[derive(Debug, Default)]
pub struct InMemoryCreatureStore {
    states: DashMap<PartitionKey, CreatureState>,
    /// Currency per raw owner id
    wallets: DashMap<String, u64>,
}

impl InMemoryCreatureStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CreatureStatePort for InMemoryCreatureStore {
    async fn get_or_create(
        &self,
        key: &PartitionKey,
        default_id: &CreatureId,
    ) -> Result<CreatureState, StoreError> {
        let state = self
            .states
            .entry(key.clone())
            .or_insert_with(|| {
                tracing::debug!(partition = %key, creature = %default_id, "Hatching new creature");
                CreatureState::hatch(key.clone(), default_id.clone())
            })
            .clone();
        Ok(state)
    }

    async fn get(&self, key: &PartitionKey) -> Result<Option<CreatureState>, StoreError> {
        Ok(self.states.get(key).map(|entry| entry.clone()))
    }

    async fn save(&self, profile: &CreatureProfile) -> Result<(), StoreError> {
        self.states
            .entry(profile.key.clone())
            .and_modify(|state| {
                state.current_id = profile.current_id.clone();
                state.emotions = profile.emotions;
                state.hatched_at = profile.hatched_at;
                state.last_active_at = profile.last_active_at;
            })
            .or_insert_with(|| CreatureState {
                key: profile.key.clone(),
                current_id: profile.current_id.clone(),
                emotions: profile.emotions,
                turns: 0,
                hatched_at: profile.hatched_at,
                last_active_at: profile.last_active_at,
            });
        Ok(())
    }

    async fn reset(
        &self,
        key: &PartitionKey,
        default_id: &CreatureId,
    ) -> Result<CreatureState, StoreError> {
        let fresh = CreatureState::hatch(key.clone(), default_id.clone());
        self.states.insert(key.clone(), fresh.clone());
        Ok(fresh)
    }

    async fn update_current_id(
        &self,
        key: &PartitionKey,
        creature_id: &CreatureId,
    ) -> Result<(), StoreError> {
        let mut state = self
            .states
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;
        state.current_id = creature_id.clone();
        Ok(())
    }

    async fn record_turn(
        &self,
        key: &PartitionKey,
        turns_delta: u64,
        currency: u64,
    ) -> Result<TurnReceipt, StoreError> {
        let turns = {
            let mut state = self
                .states
                .get_mut(key)
                .ok_or_else(|| StoreError::NotFound(key.clone()))?;
            state.turns = state.turns.saturating_add(turns_delta);
            state.turns
        };

        if currency > 0 {
            let mut balance = self.wallets.entry(key.owner().to_string()).or_insert(0);
            *balance = balance.saturating_add(currency);
        }

        Ok(TurnReceipt {
            turns,
            currency_credited: currency,
        })
    }

    async fn commit_turn(
        &self,
        profile: &CreatureProfile,
        turns_delta: u64,
        currency: u64,
    ) -> Result<TurnReceipt, StoreError> {
        let turns = {
            let mut state = self
                .states
                .entry(profile.key.clone())
                .or_insert_with(|| {
                    CreatureState::hatch(profile.key.clone(), profile.current_id.clone())
                });
            state.current_id = profile.current_id.clone();
            state.emotions = profile.emotions;
            state.hatched_at = profile.hatched_at;
            state.last_active_at = profile.last_active_at;
            state.turns = state.turns.saturating_add(turns_delta);
            state.turns
        };

        if currency > 0 {
            let mut balance = self.wallets.entry(profile.key.owner().to_string()).or_insert(0);
            *balance = balance.saturating_add(currency);
        }

        Ok(TurnReceipt {
            turns,
            currency_credited: currency,
        })
    }

    async fn get_all(&self) -> Result<Vec<CreatureState>, StoreError> {
        Ok(self.states.iter().map(|entry| entry.value().clone()).collect())
    }

    async fn balance(&self, owner: &str) -> Result<u64, StoreError> {
        Ok(self.wallets.get(owner).map(|balance| *balance).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::domain::value_objects::{EmotionValues, GroupMode};

    fn key(group: Option<i64>) -> PartitionKey {
        PartitionKey::resolve("1001", group, GroupMode::Separate)
    }

    #[tokio::test]
    async fn test_concurrent_first_contact_creates_one_record() {
        let store = Arc::new(InMemoryCreatureStore::new());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .get_or_create(&key(None), &CreatureId::new("botamon"))
                        .await
                        .unwrap()
                })
            })
            .collect();
        let mut hatched = Vec::new();
        for handle in handles {
            hatched.push(handle.await.unwrap().hatched_at);
        }

        assert_eq!(store.get_all().await.unwrap().len(), 1);
        assert!(hatched.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[tokio::test]
    async fn test_concurrent_increments_commute() {
        let store = Arc::new(InMemoryCreatureStore::new());
        store
            .get_or_create(&key(None), &CreatureId::new("botamon"))
            .await
            .unwrap();

        let a = {
            let store = store.clone();
            tokio::spawn(async move { store.record_turn(&key(None), 5, 1).await })
        };
        let b = {
            let store = store.clone();
            tokio::spawn(async move { store.record_turn(&key(None), 7, 1).await })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let state = store.get(&key(None)).await.unwrap().unwrap();
        assert_eq!(state.turns, 12);
        assert_eq!(store.balance("1001").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_stale_profile_save_keeps_counter() {
        let store = InMemoryCreatureStore::new();
        let stale = store
            .get_or_create(&key(Some(3)), &CreatureId::new("botamon"))
            .await
            .unwrap();

        store.record_turn(&key(Some(3)), 400, 40).await.unwrap();

        let mut profile = stale.profile();
        profile.emotions = EmotionValues::new(1, 2, 3, 4);
        store.save(&profile).await.unwrap();

        let state = store.get(&key(Some(3))).await.unwrap().unwrap();
        assert_eq!(state.turns, 400);
        assert_eq!(state.emotions, EmotionValues::new(1, 2, 3, 4));
    }

    #[tokio::test]
    async fn test_commit_turn_writes_profile_and_counter_together() {
        let store = InMemoryCreatureStore::new();
        let mut profile = store
            .get_or_create(&key(Some(4)), &CreatureId::new("botamon"))
            .await
            .unwrap()
            .profile();
        store.record_turn(&key(Some(4)), 100, 10).await.unwrap();

        profile.emotions = EmotionValues::new(3, 0, 0, 1);
        let receipt = store.commit_turn(&profile, 250, 25).await.unwrap();
        assert_eq!(receipt.turns, 350);
        assert_eq!(receipt.currency_credited, 25);

        let state = store.get(&key(Some(4))).await.unwrap().unwrap();
        assert_eq!(state.turns, 350);
        assert_eq!(state.emotions, EmotionValues::new(3, 0, 0, 1));
        assert_eq!(store.balance("1001").await.unwrap(), 35);
    }

    #[tokio::test]
    async fn test_reset_and_missing_records() {
        let store = InMemoryCreatureStore::new();
        assert!(matches!(
            store.update_current_id(&key(None), &CreatureId::new("x")).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.record_turn(&key(None), 1, 1).await,
            Err(StoreError::NotFound(_))
        ));

        store
            .get_or_create(&key(None), &CreatureId::new("agumon"))
            .await
            .unwrap();
        store.record_turn(&key(None), 900, 90).await.unwrap();

        let fresh = store
            .reset(&key(None), &CreatureId::new("botamon"))
            .await
            .unwrap();
        assert_eq!(fresh.turns, 0);
        assert_eq!(fresh.current_id.as_str(), "botamon");
        // wallet belongs to the owner and survives a creature reset
        assert_eq!(store.balance("1001").await.unwrap(), 90);
    }
}
