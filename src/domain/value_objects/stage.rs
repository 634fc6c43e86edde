//! Growth stages and the capability profile attached to each

use serde::{Deserialize, Serialize};

/// Ordered growth stage of a creature definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GrowthStage {
    /// Freshly hatched; barely talks
    Baby1,
    /// Learns basic communication
    Baby2,
    /// Personality starts to show
    Child,
    Adult,
    Perfect,
    /// Peak form
    Ultimate,
    SuperUltimate,
}

/// Conversation limits a stage imposes on the creature's replies
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageCapabilities {
    pub max_response_length: u32,
    /// Vocabulary complexity, 1-5
    pub vocabulary_level: u8,
    pub can_use_complex_sentences: bool,
    pub can_discuss_abstract_topics: bool,
}

impl GrowthStage {
    /// Final forms loop back to the initial creature instead of evolving further
    pub fn is_final_form(&self) -> bool {
        matches!(self, GrowthStage::Ultimate | GrowthStage::SuperUltimate)
    }

    pub fn capabilities(&self) -> StageCapabilities {
        let (max_response_length, vocabulary_level, complex, abstract_topics) = match self {
            GrowthStage::Baby1 => (20, 1, false, false),
            GrowthStage::Baby2 => (50, 2, false, false),
            GrowthStage::Child => (150, 3, true, false),
            GrowthStage::Adult => (300, 4, true, true),
            GrowthStage::Perfect => (400, 5, true, true),
            GrowthStage::Ultimate => (500, 5, true, true),
            GrowthStage::SuperUltimate => (600, 5, true, true),
        };

        StageCapabilities {
            max_response_length,
            vocabulary_level,
            can_use_complex_sentences: complex,
            can_discuss_abstract_topics: abstract_topics,
        }
    }
}

impl std::fmt::Display for GrowthStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAGES: [GrowthStage; 7] = [
        GrowthStage::Baby1,
        GrowthStage::Baby2,
        GrowthStage::Child,
        GrowthStage::Adult,
        GrowthStage::Perfect,
        GrowthStage::Ultimate,
        GrowthStage::SuperUltimate,
    ];

    #[test]
    fn test_final_forms() {
        let finals: Vec<_> = STAGES
            .iter()
            .filter(|stage| stage.is_final_form())
            .collect();
        assert_eq!(finals, vec![&GrowthStage::Ultimate, &GrowthStage::SuperUltimate]);
    }

    #[test]
    fn test_capabilities_grow_with_stage() {
        let lengths: Vec<u32> = STAGES
            .iter()
            .map(|stage| stage.capabilities().max_response_length)
            .collect();
        assert!(lengths.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(!GrowthStage::Baby2.capabilities().can_use_complex_sentences);
        assert!(GrowthStage::Adult.capabilities().can_discuss_abstract_topics);
    }

    #[test]
    fn test_stage_deserializes_from_catalog_names() {
        let stage: GrowthStage = serde_json::from_str("\"SuperUltimate\"").unwrap();
        assert_eq!(stage, GrowthStage::SuperUltimate);
    }
}
