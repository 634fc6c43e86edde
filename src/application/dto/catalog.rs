use serde::{Deserialize, Serialize};

use crate::domain::aggregates::CatalogSnapshot;
use crate::domain::entities::CreatureDefinition;
use crate::domain::value_objects::{CreatureId, GrowthStage};

/// `?stage=` filter on the catalog listing
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub stage: Option<GrowthStage>,
}

/// An evolution edge whose target is not in the catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DanglingEdgeDto {
    pub source_id: CreatureId,
    pub target_id: CreatureId,
}

/// Summary of a freshly swapped-in catalog
#[derive(Debug, Clone, Serialize)]
pub struct CatalogReloadDto {
    pub creature_count: usize,
    pub default_initial: CreatureId,
    pub dangling_edges: Vec<DanglingEdgeDto>,
}

impl From<&CatalogSnapshot> for CatalogReloadDto {
    fn from(snapshot: &CatalogSnapshot) -> Self {
        Self {
            creature_count: snapshot.len(),
            default_initial: snapshot.default_initial().id.clone(),
            dangling_edges: snapshot
                .dangling_edges()
                .into_iter()
                .map(|(source_id, target_id)| DanglingEdgeDto {
                    source_id,
                    target_id,
                })
                .collect(),
        }
    }
}

/// Full catalog listing, in source order
#[derive(Debug, Clone, Serialize)]
pub struct CatalogListingDto {
    pub default_initial: CreatureId,
    pub creatures: Vec<CreatureDefinition>,
}

impl CatalogListingDto {
    pub fn new(snapshot: &CatalogSnapshot, stage: Option<GrowthStage>) -> Self {
        let creatures = match stage {
            Some(stage) => snapshot.by_stage(stage).into_iter().cloned().collect(),
            None => snapshot.definitions().to_vec(),
        };

        Self {
            default_initial: snapshot.default_initial().id.clone(),
            creatures,
        }
    }
}
