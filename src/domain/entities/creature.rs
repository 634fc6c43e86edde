//! Creature definitions - Catalog entries and their evolution edges

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{CreatureId, EmotionValues, GrowthStage, Personality};

/// One creature form as authored in the catalog file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatureDefinition {
    pub id: CreatureId,
    pub name: String,
    pub stage: GrowthStage,
    #[serde(default)]
    pub personality: Personality,
    /// Base persona text handed to the conversation layer
    #[serde(default)]
    pub base_prompt: String,
    /// Appearance description
    #[serde(default)]
    pub appearance: String,
    #[serde(default)]
    pub next_evolutions: Vec<EvolutionEdge>,
}

impl CreatureDefinition {
    pub fn new(id: impl Into<CreatureId>, name: impl Into<String>, stage: GrowthStage) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            stage,
            personality: Personality::default(),
            base_prompt: String::new(),
            appearance: String::new(),
            next_evolutions: Vec::new(),
        }
    }

    pub fn with_personality(mut self, personality: Personality) -> Self {
        self.personality = personality;
        self
    }

    pub fn with_evolution(mut self, edge: EvolutionEdge) -> Self {
        self.next_evolutions.push(edge);
        self
    }

    /// A leaf with no outgoing edges at all (distinct from the final-form rebirth loop)
    pub fn is_terminal(&self) -> bool {
        self.next_evolutions.is_empty()
    }
}

/// A declared transition from one creature to another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvolutionEdge {
    pub target_id: CreatureId,
    /// Emotion thresholds; every attribute must be met simultaneously
    #[serde(default)]
    pub requirements: EmotionValues,
    /// Minimum cumulative turn volume
    #[serde(default, alias = "minTokens")]
    pub min_turns: u64,
    /// Author-declared priority (higher wins, after complexity)
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub description: String,
}

impl EvolutionEdge {
    pub fn new(target_id: impl Into<CreatureId>, requirements: EmotionValues, min_turns: u64) -> Self {
        Self {
            target_id: target_id.into(),
            requirements,
            min_turns,
            priority: 0,
            description: String::new(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn complexity(&self) -> u64 {
        self.requirements.complexity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_parses_catalog_json() {
        let json = r#"{
            "id": "koromon",
            "name": "Koromon",
            "stage": "Baby2",
            "personality": "Brave",
            "nextEvolutions": [
                {
                    "targetId": "agumon",
                    "requirements": { "courage": 10 },
                    "minTokens": 1000,
                    "priority": 2,
                    "description": "A small dinosaur emerges"
                }
            ]
        }"#;

        let definition: CreatureDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(definition.id.as_str(), "koromon");
        assert_eq!(definition.stage, GrowthStage::Baby2);
        assert_eq!(definition.personality, Personality::Brave);

        let edge = &definition.next_evolutions[0];
        assert_eq!(edge.target_id.as_str(), "agumon");
        assert_eq!(edge.min_turns, 1000);
        assert_eq!(edge.requirements, EmotionValues::new(10, 0, 0, 0));
        assert_eq!(edge.complexity(), 20);
    }

    #[test]
    fn test_terminal_definition() {
        let leaf = CreatureDefinition::new("omegamon", "Omegamon", GrowthStage::SuperUltimate);
        assert!(leaf.is_terminal());

        let growing = CreatureDefinition::new("botamon", "Botamon", GrowthStage::Baby1)
            .with_evolution(EvolutionEdge::new("koromon", EmotionValues::default(), 100));
        assert!(!growing.is_terminal());
    }
}
