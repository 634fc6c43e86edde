use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::CreatureState;
use crate::domain::services::{EvolutionOutcome, EvolutionProgress, PossibleEvolution};
use crate::domain::value_objects::{
    CreatureId, EmotionAttribute, EmotionDelta, EmotionValues, GrowthStage, PartitionKey,
    Personality, StageCapabilities,
};

// ============================================================================
// Requests
// ============================================================================

/// `?group_id=` on creature routes; absent means a private chat
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PartitionQuery {
    #[serde(default)]
    pub group_id: Option<i64>,
}

/// `?operator=` on admin-only routes without a request body
#[derive(Debug, Clone, Deserialize)]
pub struct OperatorQuery {
    pub operator: String,
}

/// One chat turn as reported by the conversation layer
#[derive(Debug, Clone, Deserialize)]
pub struct TurnRequestDto {
    pub user_id: String,
    #[serde(default)]
    pub group_id: Option<i64>,
    /// Judgment of the external emotion source, unclamped
    #[serde(default)]
    pub delta: EmotionDelta,
    /// Interaction volume of this turn
    #[serde(default)]
    pub turns: u64,
}

/// What an admin command does to the target's emotions
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EmotionCommandDto {
    Add {
        attribute: EmotionAttribute,
        amount: i64,
    },
    Set {
        attribute: EmotionAttribute,
        value: u32,
    },
    Clear,
}

/// Admin emotion command; `target` uses the `owner` / `owner@g<group>` form
#[derive(Debug, Clone, Deserialize)]
pub struct AdjustEmotionRequestDto {
    pub operator: String,
    pub target: String,
    #[serde(flatten)]
    pub command: EmotionCommandDto,
}

// ============================================================================
// Responses
// ============================================================================

/// Result of one handled turn.
///
/// `recorded == false` means the turn was processed but the store could not
/// persist it; no evolution is attempted in that case.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcomeDto {
    pub partition: String,
    pub recorded: bool,
    pub creature_id: Option<CreatureId>,
    pub emotions: Option<EmotionValues>,
    pub turns: Option<u64>,
    pub currency_credited: u64,
    /// The delta after clamping, as actually applied
    pub applied_delta: EmotionDelta,
    pub evolution: Option<EvolutionOutcome>,
}

impl TurnOutcomeDto {
    pub fn unrecorded(key: &PartitionKey, applied_delta: EmotionDelta) -> Self {
        Self {
            partition: key.to_string(),
            recorded: false,
            creature_id: None,
            emotions: None,
            turns: None,
            currency_credited: 0,
            applied_delta,
            evolution: None,
        }
    }
}

/// Everything a status command shows about one creature
#[derive(Debug, Clone, Serialize)]
pub struct CreatureStatusDto {
    pub partition: String,
    pub creature_id: CreatureId,
    /// `None` when the current id is missing from the catalog
    pub name: Option<String>,
    pub stage: Option<GrowthStage>,
    pub personality: Option<Personality>,
    /// Attribute the personality leans toward
    pub affinity: Option<EmotionAttribute>,
    pub capabilities: Option<StageCapabilities>,
    pub emotions: EmotionValues,
    pub dominant_emotion: EmotionAttribute,
    pub turns: u64,
    pub hatched_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    pub progress: EvolutionProgress,
    pub ready_to_evolve: bool,
    /// The current form declares at least one evolution
    pub can_evolve: bool,
    /// Wallet balance of the owner, shared by all of their partitions
    pub balance: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvolutionPathsDto {
    pub partition: String,
    pub creature_id: CreatureId,
    pub evolutions: Vec<PossibleEvolution>,
}

/// Result of a reset; `reset == false` is the neutral fallback after retries
#[derive(Debug, Clone, Serialize)]
pub struct ResetOutcomeDto {
    pub partition: String,
    pub reset: bool,
    pub creature_id: Option<CreatureId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmotionsOutcomeDto {
    pub partition: String,
    pub creature_id: CreatureId,
    pub emotions: EmotionValues,
}

impl From<&CreatureState> for EmotionsOutcomeDto {
    fn from(state: &CreatureState) -> Self {
        Self {
            partition: state.key.to_string(),
            creature_id: state.current_id.clone(),
            emotions: state.emotions,
        }
    }
}
