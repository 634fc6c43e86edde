//! Data Transfer Objects - Request and response shapes of the use cases

mod catalog;
mod lifecycle;

pub use catalog::{CatalogListingDto, CatalogQuery, CatalogReloadDto};
pub use lifecycle::{
    AdjustEmotionRequestDto, CreatureStatusDto, EmotionCommandDto, EmotionsOutcomeDto,
    EvolutionPathsDto, OperatorQuery, PartitionQuery, ResetOutcomeDto, TurnOutcomeDto,
    TurnRequestDto,
};
