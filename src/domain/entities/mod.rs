//! Domain entities - Core business objects with identity

mod creature;
mod creature_state;

pub use creature::{CreatureDefinition, EvolutionEdge};
pub use creature_state::{currency_for_turns, CreatureProfile, CreatureState, TurnReceipt};
