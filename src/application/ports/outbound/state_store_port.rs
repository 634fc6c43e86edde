//! Creature state store port - Durable storage of one record per partition
//!
//! The record has two independent writers:
//! - the profile writer (`save`, `update_current_id`) owns identity, current
//!   creature and emotion fields;
//! - the counter writer (`record_turn`) is the only writer of the turn
//!   counter and always pushes an increment, never an absolute value.
//!
//! Keeping them as separate operations means a stale profile save can never
//! roll back a concurrent counter increment. `commit_turn` runs both writers
//! as one atomic step so a chat turn is either fully stored or not at all.

use async_trait::async_trait;

use crate::domain::entities::{CreatureProfile, CreatureState, TurnReceipt};
use crate::domain::value_objects::{CreatureId, PartitionKey};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing store could not be reached, timed out, or was busy
    #[error("State store unavailable: {0}")]
    Unavailable(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("No creature record for partition {0}")]
    NotFound(PartitionKey),
    /// A stored row could not be mapped back into domain types
    #[error("Corrupt creature record: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Whether retrying the same call may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

#[async_trait]
pub trait CreatureStatePort: Send + Sync {
    /// Load the record, creating a zeroed one at `default_id` if absent.
    ///
    /// Concurrent first contact for the same key yields exactly one record.
    async fn get_or_create(
        &self,
        key: &PartitionKey,
        default_id: &CreatureId,
    ) -> Result<CreatureState, StoreError>;

    async fn get(&self, key: &PartitionKey) -> Result<Option<CreatureState>, StoreError>;

    /// Upsert the profile fields; the turn counter is never touched
    async fn save(&self, profile: &CreatureProfile) -> Result<(), StoreError>;

    /// Delete the record and recreate it zeroed at `default_id`
    async fn reset(
        &self,
        key: &PartitionKey,
        default_id: &CreatureId,
    ) -> Result<CreatureState, StoreError>;

    /// Switch the current creature id only
    async fn update_current_id(
        &self,
        key: &PartitionKey,
        creature_id: &CreatureId,
    ) -> Result<(), StoreError>;

    /// Increment the turn counter by `turns_delta` and credit `currency` to
    /// the owner's wallet, atomically
    async fn record_turn(
        &self,
        key: &PartitionKey,
        turns_delta: u64,
        currency: u64,
    ) -> Result<TurnReceipt, StoreError>;

    /// Upsert the profile fields and record a turn in one atomic step.
    ///
    /// On error nothing was written. A missing record is created from the
    /// profile, as `save` would.
    async fn commit_turn(
        &self,
        profile: &CreatureProfile,
        turns_delta: u64,
        currency: u64,
    ) -> Result<TurnReceipt, StoreError>;

    /// Snapshot of every record, for maintenance callers
    async fn get_all(&self) -> Result<Vec<CreatureState>, StoreError>;

    /// Current wallet balance of a raw user id (0 when no wallet exists)
    async fn balance(&self, owner: &str) -> Result<u64, StoreError>;
}
