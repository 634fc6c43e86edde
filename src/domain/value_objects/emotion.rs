//! Emotion model - Four independent growth counters and their scoring

use serde::{Deserialize, Serialize};

/// The four emotional attributes a creature grows along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionAttribute {
    /// Initiative, taking on challenges, protecting others
    Courage,
    /// Companionship, cooperation, caring
    Friendship,
    /// Gentleness, healing, consideration
    Love,
    /// Learning, exploration, wisdom
    Knowledge,
}

impl EmotionAttribute {
    /// All attributes in declaration order
    pub const ALL: [EmotionAttribute; 4] = [
        EmotionAttribute::Courage,
        EmotionAttribute::Friendship,
        EmotionAttribute::Love,
        EmotionAttribute::Knowledge,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionAttribute::Courage => "courage",
            EmotionAttribute::Friendship => "friendship",
            EmotionAttribute::Love => "love",
            EmotionAttribute::Knowledge => "knowledge",
        }
    }
}

impl std::fmt::Display for EmotionAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EmotionAttribute {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "courage" | "c" => Ok(EmotionAttribute::Courage),
            "friendship" | "f" => Ok(EmotionAttribute::Friendship),
            "love" | "l" => Ok(EmotionAttribute::Love),
            "knowledge" | "k" => Ok(EmotionAttribute::Knowledge),
            other => Err(format!("Unknown emotion attribute: {}", other)),
        }
    }
}

/// Current emotion counters of a creature, or the thresholds of an evolution edge.
///
/// Counters are unsigned, so the non-negative invariant holds by construction:
/// every mutation saturates at zero instead of wrapping.
///
/// Catalog files may spell keys in PascalCase. Any other key is rejected, since
/// a misspelled threshold would otherwise read as 0 and always pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmotionValues {
    #[serde(alias = "Courage")]
    pub courage: u32,
    #[serde(alias = "Friendship")]
    pub friendship: u32,
    #[serde(alias = "Love")]
    pub love: u32,
    #[serde(alias = "Knowledge")]
    pub knowledge: u32,
}

impl EmotionValues {
    pub fn new(courage: u32, friendship: u32, love: u32, knowledge: u32) -> Self {
        Self {
            courage,
            friendship,
            love,
            knowledge,
        }
    }

    pub fn get(&self, attribute: EmotionAttribute) -> u32 {
        match attribute {
            EmotionAttribute::Courage => self.courage,
            EmotionAttribute::Friendship => self.friendship,
            EmotionAttribute::Love => self.love,
            EmotionAttribute::Knowledge => self.knowledge,
        }
    }

    fn slot_mut(&mut self, attribute: EmotionAttribute) -> &mut u32 {
        match attribute {
            EmotionAttribute::Courage => &mut self.courage,
            EmotionAttribute::Friendship => &mut self.friendship,
            EmotionAttribute::Love => &mut self.love,
            EmotionAttribute::Knowledge => &mut self.knowledge,
        }
    }

    pub fn set(&mut self, attribute: EmotionAttribute, value: u32) {
        *self.slot_mut(attribute) = value;
    }

    /// Add a signed amount to one attribute, flooring the result at zero
    pub fn add_value(&mut self, attribute: EmotionAttribute, delta: i64) {
        let slot = self.slot_mut(attribute);
        let next = (*slot as i64).saturating_add(delta);
        *slot = next.clamp(0, u32::MAX as i64) as u32;
    }

    /// Apply a (pre-clamped) delta to every attribute
    pub fn apply(&mut self, delta: &EmotionDelta) {
        for attribute in EmotionAttribute::ALL {
            self.add_value(attribute, delta.get(attribute) as i64);
        }
    }

    /// Normalized closeness to a requirement vector, in `[0, 1]`.
    ///
    /// Only attributes with a non-zero requirement contribute. A requirement with
    /// no non-zero attribute scores 0.
    pub fn match_score(&self, requirement: &EmotionValues) -> f64 {
        let mut total = 0.0;
        let mut counted = 0u32;

        for attribute in EmotionAttribute::ALL {
            let required = requirement.get(attribute);
            if required > 0 {
                let current = self.get(attribute) as f64;
                total += (current / required as f64).min(1.0);
                counted += 1;
            }
        }

        if counted == 0 {
            0.0
        } else {
            total / counted as f64
        }
    }

    /// Every attribute is at or above its threshold (zero thresholds always pass)
    pub fn meets_requirements(&self, requirement: &EmotionValues) -> bool {
        EmotionAttribute::ALL
            .iter()
            .all(|&attribute| self.get(attribute) >= requirement.get(attribute))
    }

    /// Tie-break signal: `10 * non_zero_count + sum`
    pub fn complexity(&self) -> u64 {
        let non_zero = EmotionAttribute::ALL
            .iter()
            .filter(|&&attribute| self.get(attribute) > 0)
            .count() as u64;
        10 * non_zero + self.sum()
    }

    pub fn sum(&self) -> u64 {
        EmotionAttribute::ALL
            .iter()
            .map(|&attribute| self.get(attribute) as u64)
            .sum()
    }

    /// Highest attribute; ties go to the earliest attribute in declaration order
    pub fn dominant(&self) -> (EmotionAttribute, u32) {
        EmotionAttribute::ALL
            .iter()
            .map(|&attribute| (attribute, self.get(attribute)))
            .fold((EmotionAttribute::Courage, self.courage), |best, candidate| {
                if candidate.1 > best.1 {
                    candidate
                } else {
                    best
                }
            })
    }
}

/// A signed per-turn change produced by the external emotion judge
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionDelta {
    #[serde(alias = "Courage")]
    pub courage: i32,
    #[serde(alias = "Friendship")]
    pub friendship: i32,
    #[serde(alias = "Love")]
    pub love: i32,
    #[serde(alias = "Knowledge")]
    pub knowledge: i32,
    /// Free-text justification from the judge, kept for event logs only
    #[serde(alias = "Reasoning")]
    pub reasoning: String,
}

impl EmotionDelta {
    pub fn get(&self, attribute: EmotionAttribute) -> i32 {
        match attribute {
            EmotionAttribute::Courage => self.courage,
            EmotionAttribute::Friendship => self.friendship,
            EmotionAttribute::Love => self.love,
            EmotionAttribute::Knowledge => self.knowledge,
        }
    }

    /// Bound every component to `[-max, max]`
    pub fn clamped(&self, max_magnitude: u32) -> Self {
        let bound = max_magnitude.min(i32::MAX as u32) as i32;
        Self {
            courage: self.courage.clamp(-bound, bound),
            friendship: self.friendship.clamp(-bound, bound),
            love: self.love.clamp(-bound, bound),
            knowledge: self.knowledge.clamp(-bound, bound),
            reasoning: self.reasoning.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        EmotionAttribute::ALL
            .iter()
            .all(|&attribute| self.get(attribute) == 0)
    }
}
