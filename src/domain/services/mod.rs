//! Domain services - Pure business logic operating on several domain objects

mod evolution_engine;

pub use evolution_engine::{
    EvolutionEngine, EvolutionOutcome, EvolutionProgress, PossibleEvolution, UNREACHABLE_TURNS,
};
