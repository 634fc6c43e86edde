//! Lifecycle events - Notable things that happened to a creature
//!
//! Events are emitted by the lifecycle service after the corresponding write
//! has been persisted. They feed audit logging and any future notifier.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::value_objects::{CreatureId, EmotionDelta, EventId, PartitionKey};

/// Base data for all events
#[derive(Debug, Clone, Serialize)]
pub struct EventMetadata {
    pub event_id: EventId,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
}

impl Default for EventMetadata {
    fn default() -> Self {
        Self {
            event_id: EventId::new(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// The creature switched form (or was reborn)
    Evolved {
        metadata: EventMetadata,
        partition: PartitionKey,
        old_id: CreatureId,
        new_id: CreatureId,
        is_rebirth: bool,
        description: String,
    },

    /// A (clamped) emotion delta was applied
    EmotionChanged {
        metadata: EventMetadata,
        partition: PartitionKey,
        creature_id: CreatureId,
        delta: EmotionDelta,
    },

    /// Turn progress just crossed the approaching threshold
    EvolutionApproaching {
        metadata: EventMetadata,
        partition: PartitionKey,
        creature_id: CreatureId,
        turns: u64,
        required_turns: u64,
        percent: f64,
    },

    /// The record was restarted from scratch by an operator or the owner
    Reset {
        metadata: EventMetadata,
        partition: PartitionKey,
        initial_id: CreatureId,
    },
}

impl LifecycleEvent {
    pub fn partition(&self) -> &PartitionKey {
        match self {
            LifecycleEvent::Evolved { partition, .. }
            | LifecycleEvent::EmotionChanged { partition, .. }
            | LifecycleEvent::EvolutionApproaching { partition, .. }
            | LifecycleEvent::Reset { partition, .. } => partition,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            LifecycleEvent::Evolved { .. } => "evolved",
            LifecycleEvent::EmotionChanged { .. } => "emotion_changed",
            LifecycleEvent::EvolutionApproaching { .. } => "evolution_approaching",
            LifecycleEvent::Reset { .. } => "reset",
        }
    }
}
