//! Evolution engine - Pure decision logic over the catalog's evolution edges
//!
//! The engine never mutates state. It inspects a `CreatureState` against a
//! `CatalogSnapshot` and reports what should happen; applying the result
//! (switching the creature id, restarting on rebirth) is the caller's job.
//!
//! Candidate selection among qualifying edges is lexicographic on
//! `(complexity, priority, match score)`, highest first. On a full tie the
//! edge declared first wins, so the choice is a pure function of its inputs.

use std::cmp::Ordering;

use serde::Serialize;

use crate::domain::aggregates::CatalogSnapshot;
use crate::domain::entities::{CreatureDefinition, CreatureState, EvolutionEdge};
use crate::domain::value_objects::{CreatureId, EmotionValues};

/// Sentinel `required_turns` for a creature with nowhere left to go
pub const UNREACHABLE_TURNS: u64 = u64::MAX;

/// A transition decided by the engine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvolutionOutcome {
    pub old_id: CreatureId,
    pub new_id: CreatureId,
    /// The creature was in a final form and restarts from the initial creature
    pub is_rebirth: bool,
    /// Description of the edge that qualified
    pub description: String,
}

/// How far a creature is from its closest evolution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvolutionProgress {
    pub turns: u64,
    pub required_turns: u64,
    /// `0..=100`
    pub turn_progress: f64,
    pub current_emotions: EmotionValues,
    pub required_emotions: Option<EmotionValues>,
    /// `0..=100`
    pub emotion_progress: f64,
}

impl EvolutionProgress {
    pub fn is_ready(&self) -> bool {
        self.turn_progress >= 100.0 && self.emotion_progress >= 100.0
    }
}

/// One declared edge with live closeness information
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PossibleEvolution {
    pub target_id: CreatureId,
    /// `None` when the target is missing from the catalog
    pub target_name: Option<String>,
    pub required_turns: u64,
    pub required_emotions: EmotionValues,
    pub match_percent: f64,
    pub priority: i32,
}

/// Ranking key of a qualifying edge
#[derive(Debug, Clone, Copy)]
struct CandidateRank {
    complexity: u64,
    priority: i32,
    match_score: f64,
}

impl CandidateRank {
    fn of(edge: &EvolutionEdge, emotions: &EmotionValues) -> Self {
        Self {
            complexity: edge.complexity(),
            priority: edge.priority,
            match_score: emotions.match_score(&edge.requirements),
        }
    }

    fn cmp(&self, other: &Self) -> Ordering {
        self.complexity
            .cmp(&other.complexity)
            .then(self.priority.cmp(&other.priority))
            .then(self.match_score.total_cmp(&other.match_score))
    }
}

/// Stateless evolution decision logic
pub struct EvolutionEngine;

impl EvolutionEngine {
    /// Decide whether `state` transitions, and to where.
    ///
    /// Returns `None` when nothing qualifies, and also when the current id is
    /// missing from the catalog; that is recoverable drift the caller should log.
    pub fn check_and_evolve(
        state: &CreatureState,
        catalog: &CatalogSnapshot,
    ) -> Option<EvolutionOutcome> {
        let current = catalog.get(state.current_id.as_str())?;

        let winner = Self::qualifying_edges(state, current).fold(
            None::<(&EvolutionEdge, CandidateRank)>,
            |best, edge| {
                let rank = CandidateRank::of(edge, &state.emotions);
                match best {
                    Some((_, best_rank)) if rank.cmp(&best_rank) != Ordering::Greater => best,
                    _ => Some((edge, rank)),
                }
            },
        );
        let (edge, _) = winner?;

        // The matched edge is only the gate for a final form; the destination is fixed.
        let is_rebirth = current.stage.is_final_form();
        let new_id = if is_rebirth {
            catalog.default_initial().id.clone()
        } else {
            if !catalog.contains(edge.target_id.as_str()) {
                return None;
            }
            edge.target_id.clone()
        };

        Some(EvolutionOutcome {
            old_id: state.current_id.clone(),
            new_id,
            is_rebirth,
            description: edge.description.clone(),
        })
    }

    fn qualifying_edges<'a>(
        state: &'a CreatureState,
        definition: &'a CreatureDefinition,
    ) -> impl Iterator<Item = &'a EvolutionEdge> + 'a {
        definition.next_evolutions.iter().filter(move |edge| {
            state.turns >= edge.min_turns && state.emotions.meets_requirements(&edge.requirements)
        })
    }

    /// Progress toward the closest edge of `definition`.
    ///
    /// "Closest" is the smallest remaining turn gap; ties go to the higher live
    /// match score, then to declaration order.
    pub fn progress(state: &CreatureState, definition: &CreatureDefinition) -> EvolutionProgress {
        let closest = definition.next_evolutions.iter().fold(
            None::<(&EvolutionEdge, u64, f64)>,
            |best, edge| {
                let gap = edge.min_turns.saturating_sub(state.turns);
                let score = state.emotions.match_score(&edge.requirements);
                match best {
                    Some((_, best_gap, best_score))
                        if gap > best_gap || (gap == best_gap && score <= best_score) =>
                    {
                        best
                    }
                    _ => Some((edge, gap, score)),
                }
            },
        );

        match closest {
            Some((edge, _, score)) => EvolutionProgress {
                turns: state.turns,
                required_turns: edge.min_turns,
                turn_progress: turn_percent(state.turns, edge.min_turns),
                current_emotions: state.emotions,
                required_emotions: Some(edge.requirements),
                emotion_progress: score * 100.0,
            },
            None => EvolutionProgress {
                turns: state.turns,
                required_turns: UNREACHABLE_TURNS,
                turn_progress: turn_percent(state.turns, UNREACHABLE_TURNS),
                current_emotions: state.emotions,
                required_emotions: None,
                emotion_progress: 100.0,
            },
        }
    }

    /// Like [`EvolutionEngine::progress`], resolving the definition from the catalog.
    ///
    /// A dangling current id yields a degenerate, never-ready progress report.
    pub fn progress_in(state: &CreatureState, catalog: &CatalogSnapshot) -> EvolutionProgress {
        match catalog.get(state.current_id.as_str()) {
            Some(definition) => Self::progress(state, definition),
            None => EvolutionProgress {
                turns: state.turns,
                required_turns: UNREACHABLE_TURNS,
                turn_progress: 0.0,
                current_emotions: state.emotions,
                required_emotions: None,
                emotion_progress: 0.0,
            },
        }
    }

    /// Every declared edge of `definition`, most important first.
    ///
    /// Purely informational: thresholds, complexity and rebirth are ignored.
    pub fn possible_evolutions(
        state: &CreatureState,
        definition: &CreatureDefinition,
        catalog: &CatalogSnapshot,
    ) -> Vec<PossibleEvolution> {
        let mut evolutions: Vec<PossibleEvolution> = definition
            .next_evolutions
            .iter()
            .map(|edge| PossibleEvolution {
                target_id: edge.target_id.clone(),
                target_name: catalog
                    .get(edge.target_id.as_str())
                    .map(|target| target.name.clone()),
                required_turns: edge.min_turns,
                required_emotions: edge.requirements,
                match_percent: state.emotions.match_score(&edge.requirements) * 100.0,
                priority: edge.priority,
            })
            .collect();

        // stable: equal priorities keep declaration order
        evolutions.sort_by(|a, b| b.priority.cmp(&a.priority));
        evolutions
    }
}

fn turn_percent(turns: u64, required: u64) -> f64 {
    if required == 0 {
        return 100.0;
    }
    (turns as f64 / required as f64 * 100.0).min(100.0)
}
