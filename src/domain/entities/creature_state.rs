//! Creature state - The per-partition record of a growing creature

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::value_objects::{CreatureId, EmotionValues, PartitionKey};

/// Full persisted state of one creature
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatureState {
    pub key: PartitionKey,
    pub current_id: CreatureId,
    pub emotions: EmotionValues,
    /// Cumulative turn volume; only moves forward, except on a full restart
    pub turns: u64,
    pub hatched_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

impl CreatureState {
    /// A fresh, zeroed creature starting at `initial_id`
    pub fn hatch(key: PartitionKey, initial_id: CreatureId) -> Self {
        let now = Utc::now();
        Self {
            key,
            current_id: initial_id,
            emotions: EmotionValues::default(),
            turns: 0,
            hatched_at: now,
            last_active_at: now,
        }
    }

    /// The fields owned by the profile writer
    pub fn profile(&self) -> CreatureProfile {
        CreatureProfile {
            key: self.key.clone(),
            current_id: self.current_id.clone(),
            emotions: self.emotions,
            hatched_at: self.hatched_at,
            last_active_at: self.last_active_at,
        }
    }

    pub fn touch(&mut self) {
        self.last_active_at = Utc::now();
    }
}

/// Profile view of a creature: everything except the turn counter.
///
/// The profile writer only ever receives this type, so it has no way to
/// overwrite a concurrently incremented counter with a stale value.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatureProfile {
    pub key: PartitionKey,
    pub current_id: CreatureId,
    pub emotions: EmotionValues,
    pub hatched_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

/// Result of one counter write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TurnReceipt {
    /// Counter value after the increment
    pub turns: u64,
    /// Currency credited to the owner's wallet by this call
    pub currency_credited: u64,
}

/// Currency earned for a turn volume: `turns / divisor`, at least 1 for any non-zero volume
pub fn currency_for_turns(turns: u64, divisor: u64) -> u64 {
    if turns == 0 {
        return 0;
    }
    (turns / divisor.max(1)).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::GroupMode;

    #[test]
    fn test_hatch_is_zeroed() {
        let key = PartitionKey::resolve("42", Some(7), GroupMode::Separate);
        let state = CreatureState::hatch(key.clone(), CreatureId::new("botamon"));

        assert_eq!(state.key, key);
        assert_eq!(state.turns, 0);
        assert_eq!(state.emotions, EmotionValues::default());
        assert_eq!(state.hatched_at, state.last_active_at);
    }

    #[test]
    fn test_profile_excludes_counter() {
        let key = PartitionKey::resolve("42", None, GroupMode::Shared);
        let mut state = CreatureState::hatch(key, CreatureId::new("botamon"));
        state.turns = 900;
        state.emotions.courage = 12;

        let profile = state.profile();
        assert_eq!(profile.emotions.courage, 12);
        assert_eq!(profile.current_id, state.current_id);
    }

    #[test]
    fn test_currency_for_turns() {
        assert_eq!(currency_for_turns(0, 10), 0);
        assert_eq!(currency_for_turns(3, 10), 1);
        assert_eq!(currency_for_turns(25, 10), 2);
        assert_eq!(currency_for_turns(25, 0), 25);
    }
}
