//! Catalog aggregate - An immutable snapshot of every creature definition
//!
//! A snapshot is built once from a list of definitions and never mutated.
//! Reloading the catalog means building a new snapshot and swapping it in
//! wholesale (see `application::services::catalog_service`).

use std::collections::HashMap;

use crate::domain::entities::CreatureDefinition;
use crate::domain::value_objects::{CreatureId, GrowthStage};

/// Immutable view of the creature catalog
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    /// Definitions in source order
    definitions: Vec<CreatureDefinition>,
    /// Position of each id in `definitions`
    index: HashMap<CreatureId, usize>,
}

impl CatalogSnapshot {
    /// Build a snapshot, rejecting empty catalogs and duplicate ids
    pub fn new(definitions: Vec<CreatureDefinition>) -> Result<Self, CatalogError> {
        if definitions.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut index = HashMap::with_capacity(definitions.len());
        for (position, definition) in definitions.iter().enumerate() {
            if index.insert(definition.id.clone(), position).is_some() {
                return Err(CatalogError::DuplicateId(definition.id.to_string()));
            }
        }

        Ok(Self { definitions, index })
    }

    pub fn get(&self, id: &str) -> Option<&CreatureDefinition> {
        self.index.get(id).map(|&position| &self.definitions[position])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All definitions in source order
    pub fn definitions(&self) -> &[CreatureDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn by_stage(&self, stage: GrowthStage) -> Vec<&CreatureDefinition> {
        self.definitions
            .iter()
            .filter(|definition| definition.stage == stage)
            .collect()
    }

    /// The canonical starting creature: the first Baby1 in source order.
    ///
    /// Falls back to the first definition when no Baby1 exists; a snapshot is
    /// never empty, so this always returns something.
    pub fn default_initial(&self) -> &CreatureDefinition {
        self.definitions
            .iter()
            .find(|definition| definition.stage == GrowthStage::Baby1)
            .unwrap_or(&self.definitions[0])
    }

    /// Edges whose target is not part of this catalog, as `(source, target)` pairs
    pub fn dangling_edges(&self) -> Vec<(CreatureId, CreatureId)> {
        self.definitions
            .iter()
            .flat_map(|definition| {
                definition
                    .next_evolutions
                    .iter()
                    .filter(|edge| !self.contains(edge.target_id.as_str()))
                    .map(|edge| (definition.id.clone(), edge.target_id.clone()))
            })
            .collect()
    }
}

/// Errors raised while building or loading a catalog
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog contains no creature definitions")]
    Empty,
    #[error("Duplicate creature id in catalog: {0}")]
    DuplicateId(String),
    #[error("Failed to read catalog source: {0}")]
    Io(String),
    #[error("Failed to parse catalog: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::EvolutionEdge;
    use crate::domain::value_objects::EmotionValues;

    fn definition(id: &str, stage: GrowthStage) -> CreatureDefinition {
        CreatureDefinition::new(id, id.to_uppercase(), stage)
    }

    #[test]
    fn test_default_initial_is_first_baby1() {
        let snapshot = CatalogSnapshot::new(vec![
            definition("agumon", GrowthStage::Child),
            definition("botamon", GrowthStage::Baby1),
            definition("punimon", GrowthStage::Baby1),
        ])
        .unwrap();

        assert_eq!(snapshot.default_initial().id.as_str(), "botamon");
        assert_eq!(snapshot.by_stage(GrowthStage::Baby1).len(), 2);
    }

    #[test]
    fn test_default_initial_falls_back_to_first_entry() {
        let snapshot = CatalogSnapshot::new(vec![
            definition("agumon", GrowthStage::Child),
            definition("greymon", GrowthStage::Adult),
        ])
        .unwrap();

        assert_eq!(snapshot.default_initial().id.as_str(), "agumon");
    }

    #[test]
    fn test_rejects_empty_and_duplicates() {
        assert!(matches!(CatalogSnapshot::new(vec![]), Err(CatalogError::Empty)));

        let result = CatalogSnapshot::new(vec![
            definition("botamon", GrowthStage::Baby1),
            definition("botamon", GrowthStage::Baby2),
        ]);
        assert!(matches!(result, Err(CatalogError::DuplicateId(id)) if id == "botamon"));
    }

    #[test]
    fn test_lookup_and_dangling_edges() {
        let snapshot = CatalogSnapshot::new(vec![
            definition("botamon", GrowthStage::Baby1)
                .with_evolution(EvolutionEdge::new("koromon", EmotionValues::default(), 10))
                .with_evolution(EvolutionEdge::new("missingmon", EmotionValues::default(), 10)),
            definition("koromon", GrowthStage::Baby2),
        ])
        .unwrap();

        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.get("koromon").is_some());
        assert!(snapshot.get("agumon").is_none());
        assert_eq!(
            snapshot.dangling_edges(),
            vec![(CreatureId::new("botamon"), CreatureId::new("missingmon"))]
        );
    }
}
