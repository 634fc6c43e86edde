//! Value objects - Immutable objects defined by their attributes

mod emotion;
mod ids;
mod partition;
mod personality;
mod stage;

pub use emotion::{EmotionAttribute, EmotionDelta, EmotionValues};
pub use ids::*;
pub use partition::{GroupMode, PartitionKey};
pub use personality::Personality;
pub use stage::{GrowthStage, StageCapabilities};
