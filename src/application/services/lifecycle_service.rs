//! Lifecycle Service - Per-turn creature growth, evolution and admin commands
//!
//! Every entry point resolves its partition key through `PartitionKey::resolve`
//! (or `PartitionKey::parse` for admin targets copied from a snapshot listing),
//! so no caller builds storage identities by hand.
//!
//! Turn flow: load or hatch the record, apply the clamped emotion delta, save
//! the profile, push the turn increment, then let the evolution engine decide
//! on a transition and apply it.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::application::dto::{
    AdjustEmotionRequestDto, CatalogReloadDto, CreatureStatusDto, EmotionCommandDto,
    EmotionsOutcomeDto, EvolutionPathsDto, ResetOutcomeDto, TurnOutcomeDto, TurnRequestDto,
};
use crate::application::ports::outbound::{CreatureStatePort, EventBusPort, StoreError};
use crate::application::services::CatalogService;
use crate::domain::aggregates::{CatalogError, CatalogSnapshot};
use crate::domain::entities::{currency_for_turns, CreatureState};
use crate::domain::events::{EventMetadata, LifecycleEvent};
use crate::domain::services::{
    EvolutionEngine, EvolutionOutcome, EvolutionProgress, UNREACHABLE_TURNS,
};
use crate::domain::value_objects::{EmotionValues, GroupMode, PartitionKey};

const DEFAULT_CURRENCY_DIVISOR: u64 = 10;

/// Tunables of the turn flow
#[derive(Debug, Clone)]
pub struct LifecyclePolicy {
    pub group_mode: GroupMode,
    /// Per-component bound applied to every incoming emotion delta
    pub max_emotion_delta: u32,
    /// Turns per unit of currency; 0 falls back to the default of 10
    pub currency_divisor: u64,
    /// Fraction of required turns at which an approaching event fires
    pub approaching_threshold: f64,
    /// Raw user ids allowed to run admin commands
    pub admin_whitelist: HashSet<String>,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            group_mode: GroupMode::Separate,
            max_emotion_delta: 10,
            currency_divisor: DEFAULT_CURRENCY_DIVISOR,
            approaching_threshold: 0.8,
            admin_whitelist: HashSet::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("Operator {0} is not allowed to run admin commands")]
    Forbidden(String),
    #[error("Invalid target: {0}")]
    InvalidTarget(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

pub struct LifecycleService {
    store: Arc<dyn CreatureStatePort>,
    catalog: Arc<CatalogService>,
    events: Arc<dyn EventBusPort>,
    policy: LifecyclePolicy,
}

impl LifecycleService {
    pub fn new(
        store: Arc<dyn CreatureStatePort>,
        catalog: Arc<CatalogService>,
        events: Arc<dyn EventBusPort>,
        policy: LifecyclePolicy,
    ) -> Self {
        Self {
            store,
            catalog,
            events,
            policy,
        }
    }

    pub fn resolve(&self, raw_user_id: &str, group_id: Option<i64>) -> PartitionKey {
        PartitionKey::resolve(raw_user_id, group_id, self.policy.group_mode)
    }

    fn currency_divisor(&self) -> u64 {
        match self.policy.currency_divisor {
            0 => DEFAULT_CURRENCY_DIVISOR,
            divisor => divisor,
        }
    }

    /// Handle one chat turn.
    ///
    /// Never fails: store trouble is reported through `recorded == false`, and
    /// a transition that cannot be applied degrades to "no evolution".
    #[instrument(skip(self, request), fields(user = %request.user_id, group = ?request.group_id, turns = request.turns))]
    pub async fn handle_turn(&self, request: TurnRequestDto) -> TurnOutcomeDto {
        let key = self.resolve(&request.user_id, request.group_id);
        let catalog = self.catalog.snapshot().await;

        let delta = request.delta.clamped(self.policy.max_emotion_delta);
        if delta != request.delta {
            debug!(partition = %key, "Emotion delta clamped to +/-{}", self.policy.max_emotion_delta);
        }

        let mut state = match self
            .store
            .get_or_create(&key, &catalog.default_initial().id)
            .await
        {
            Ok(state) => state,
            Err(e) => {
                warn!(partition = %key, error = %e, "Turn not recorded: could not load creature");
                return TurnOutcomeDto::unrecorded(&key, delta);
            }
        };

        let progress_before = EvolutionEngine::progress_in(&state, &catalog);

        state.emotions.apply(&delta);
        state.touch();

        let currency = currency_for_turns(request.turns, self.currency_divisor());
        let receipt = match self
            .store
            .commit_turn(&state.profile(), request.turns, currency)
            .await
        {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(partition = %key, error = %e, "Turn not recorded: commit failed");
                return TurnOutcomeDto::unrecorded(&key, delta);
            }
        };
        state.turns = receipt.turns;

        if !delta.is_empty() {
            self.events.publish(LifecycleEvent::EmotionChanged {
                metadata: EventMetadata::default(),
                partition: key.clone(),
                creature_id: state.current_id.clone(),
                delta: delta.clone(),
            });
        }
        self.notify_if_approaching(&state, &catalog, &progress_before);

        if !catalog.contains(state.current_id.as_str()) {
            warn!(
                partition = %key,
                creature = %state.current_id,
                "Current creature is missing from the catalog, skipping evolution"
            );
        }

        let evolution = match EvolutionEngine::check_and_evolve(&state, &catalog) {
            Some(outcome) => self.apply_evolution(&key, outcome).await,
            None => None,
        };

        let (creature_id, emotions, turns) = match &evolution {
            Some(outcome) if outcome.is_rebirth => {
                (outcome.new_id.clone(), EmotionValues::default(), 0)
            }
            Some(outcome) => (outcome.new_id.clone(), state.emotions, state.turns),
            None => (state.current_id.clone(), state.emotions, state.turns),
        };

        TurnOutcomeDto {
            partition: key.to_string(),
            recorded: true,
            creature_id: Some(creature_id),
            emotions: Some(emotions),
            turns: Some(turns),
            currency_credited: receipt.currency_credited,
            applied_delta: delta,
            evolution,
        }
    }

    /// Publish an approaching event the first time turn progress crosses the threshold
    fn notify_if_approaching(
        &self,
        state: &CreatureState,
        catalog: &CatalogSnapshot,
        before: &EvolutionProgress,
    ) {
        let after = EvolutionEngine::progress_in(state, catalog);
        if after.required_turns == UNREACHABLE_TURNS {
            return;
        }

        let threshold = self.policy.approaching_threshold * 100.0;
        if before.turn_progress < threshold && after.turn_progress >= threshold {
            debug!(partition = %state.key, percent = after.turn_progress, "Evolution approaching");
            self.events.publish(LifecycleEvent::EvolutionApproaching {
                metadata: EventMetadata::default(),
                partition: state.key.clone(),
                creature_id: state.current_id.clone(),
                turns: state.turns,
                required_turns: after.required_turns,
                percent: after.turn_progress,
            });
        }
    }

    /// Persist a decided transition. Rebirth restarts the record the same way
    /// an admin reset does.
    async fn apply_evolution(
        &self,
        key: &PartitionKey,
        outcome: EvolutionOutcome,
    ) -> Option<EvolutionOutcome> {
        let store = &self.store;
        let (new_id, is_rebirth) = (&outcome.new_id, outcome.is_rebirth);
        let applied = retry_once("apply_evolution", || async move {
            if is_rebirth {
                store.reset(key, new_id).await.map(|_| ())
            } else {
                store.update_current_id(key, new_id).await
            }
        })
        .await;

        match applied {
            Ok(()) => {
                info!(
                    partition = %key,
                    from = %outcome.old_id,
                    to = %outcome.new_id,
                    rebirth = outcome.is_rebirth,
                    "Creature evolved"
                );
                self.events.publish(LifecycleEvent::Evolved {
                    metadata: EventMetadata::default(),
                    partition: key.clone(),
                    old_id: outcome.old_id.clone(),
                    new_id: outcome.new_id.clone(),
                    is_rebirth: outcome.is_rebirth,
                    description: outcome.description.clone(),
                });
                Some(outcome)
            }
            Err(e) => {
                warn!(
                    partition = %key,
                    to = %outcome.new_id,
                    error = %e,
                    "Evolution could not be applied, leaving creature unchanged"
                );
                None
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn status(
        &self,
        raw_user_id: &str,
        group_id: Option<i64>,
    ) -> Result<CreatureStatusDto, LifecycleError> {
        let key = self.resolve(raw_user_id, group_id);
        let catalog = self.catalog.snapshot().await;
        let state = self
            .store
            .get_or_create(&key, &catalog.default_initial().id)
            .await?;
        let balance = self.store.balance(key.owner()).await?;

        let definition = catalog.get(state.current_id.as_str());
        if definition.is_none() {
            warn!(partition = %key, creature = %state.current_id, "Status of a creature missing from the catalog");
        }

        let progress = EvolutionEngine::progress_in(&state, &catalog);
        let (dominant_emotion, _) = state.emotions.dominant();

        Ok(CreatureStatusDto {
            partition: key.to_string(),
            creature_id: state.current_id.clone(),
            name: definition.map(|d| d.name.clone()),
            stage: definition.map(|d| d.stage),
            personality: definition.map(|d| d.personality),
            affinity: definition.and_then(|d| d.personality.affinity()),
            capabilities: definition.map(|d| d.stage.capabilities()),
            emotions: state.emotions,
            dominant_emotion,
            turns: state.turns,
            hatched_at: state.hatched_at,
            last_active_at: state.last_active_at,
            ready_to_evolve: progress.is_ready(),
            can_evolve: definition.is_some_and(|d| !d.is_terminal()),
            progress,
            balance,
        })
    }

    #[instrument(skip(self))]
    pub async fn evolution_paths(
        &self,
        raw_user_id: &str,
        group_id: Option<i64>,
    ) -> Result<EvolutionPathsDto, LifecycleError> {
        let key = self.resolve(raw_user_id, group_id);
        let catalog = self.catalog.snapshot().await;
        let state = self
            .store
            .get_or_create(&key, &catalog.default_initial().id)
            .await?;

        let evolutions = match catalog.get(state.current_id.as_str()) {
            Some(definition) => EvolutionEngine::possible_evolutions(&state, definition, &catalog),
            None => {
                warn!(partition = %key, creature = %state.current_id, "No evolution paths for a creature missing from the catalog");
                Vec::new()
            }
        };

        Ok(EvolutionPathsDto {
            partition: key.to_string(),
            creature_id: state.current_id,
            evolutions,
        })
    }

    /// Start the partition over at the default initial creature.
    ///
    /// Retried once; a second failure yields `reset == false`.
    #[instrument(skip(self))]
    pub async fn reset(&self, raw_user_id: &str, group_id: Option<i64>) -> ResetOutcomeDto {
        let key = self.resolve(raw_user_id, group_id);
        let catalog = self.catalog.snapshot().await;
        let initial_id = catalog.default_initial().id.clone();

        match retry_once("reset", || self.store.reset(&key, &initial_id)).await {
            Ok(state) => {
                info!(partition = %key, creature = %initial_id, "Creature reset");
                self.events.publish(LifecycleEvent::Reset {
                    metadata: EventMetadata::default(),
                    partition: key.clone(),
                    initial_id,
                });
                ResetOutcomeDto {
                    partition: key.to_string(),
                    reset: true,
                    creature_id: Some(state.current_id),
                }
            }
            Err(e) => {
                warn!(partition = %key, error = %e, "Reset failed");
                ResetOutcomeDto {
                    partition: key.to_string(),
                    reset: false,
                    creature_id: None,
                }
            }
        }
    }

    fn authorize(&self, operator: &str) -> Result<(), LifecycleError> {
        if self.policy.admin_whitelist.contains(operator.trim()) {
            Ok(())
        } else {
            warn!(operator, "Rejected admin command from non-whitelisted operator");
            Err(LifecycleError::Forbidden(operator.to_string()))
        }
    }

    /// Admin emotion command (add, set or clear) against any partition
    #[instrument(skip(self, request), fields(operator = %request.operator, target = %request.target))]
    pub async fn adjust_emotions(
        &self,
        request: AdjustEmotionRequestDto,
    ) -> Result<EmotionsOutcomeDto, LifecycleError> {
        self.authorize(&request.operator)?;
        let key = PartitionKey::parse(&request.target).map_err(LifecycleError::InvalidTarget)?;

        let catalog = self.catalog.snapshot().await;
        let mut state = self
            .store
            .get_or_create(&key, &catalog.default_initial().id)
            .await?;

        match request.command {
            EmotionCommandDto::Add { attribute, amount } => {
                state.emotions.add_value(attribute, amount)
            }
            EmotionCommandDto::Set { attribute, value } => state.emotions.set(attribute, value),
            EmotionCommandDto::Clear => state.emotions = EmotionValues::default(),
        }
        state.touch();
        self.store.save(&state.profile()).await?;

        info!(partition = %key, emotions = ?state.emotions, "Emotions adjusted by admin");
        Ok(EmotionsOutcomeDto::from(&state))
    }

    /// Every stored record
    #[instrument(skip(self))]
    pub async fn snapshot(&self, operator: &str) -> Result<Vec<CreatureState>, LifecycleError> {
        self.authorize(operator)?;
        Ok(self.store.get_all().await?)
    }

    pub async fn catalog(&self) -> Arc<CatalogSnapshot> {
        self.catalog.snapshot().await
    }

    #[instrument(skip(self))]
    pub async fn reload_catalog(&self, operator: &str) -> Result<CatalogReloadDto, LifecycleError> {
        self.authorize(operator)?;
        Ok(self.catalog.reload().await?)
    }
}

/// Run a store operation, retrying once if the first failure is retryable
async fn retry_once<T, F, Fut>(operation: &str, mut attempt: F) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    match attempt().await {
        Err(e) if e.is_retryable() => {
            warn!(operation, error = %e, "Store operation failed, retrying once");
            attempt().await
        }
        result => result,
    }
}
