//! Personality tag carried by each creature definition

use serde::{Deserialize, Serialize};

use super::EmotionAttribute;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Personality {
    Brave,
    Friendly,
    Gentle,
    Curious,
    /// Balanced, playful
    Mischievous,
    /// Balanced, analytical
    #[default]
    Calm,
}

impl Personality {
    /// The attribute this personality tends to grow faster in, if any
    pub fn affinity(&self) -> Option<EmotionAttribute> {
        match self {
            Personality::Brave => Some(EmotionAttribute::Courage),
            Personality::Friendly => Some(EmotionAttribute::Friendship),
            Personality::Gentle => Some(EmotionAttribute::Love),
            Personality::Curious => Some(EmotionAttribute::Knowledge),
            Personality::Mischievous | Personality::Calm => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced_personalities_have_no_affinity() {
        assert_eq!(Personality::Brave.affinity(), Some(EmotionAttribute::Courage));
        assert_eq!(Personality::default(), Personality::Calm);
        assert_eq!(Personality::Calm.affinity(), None);
        assert_eq!(Personality::Mischievous.affinity(), None);
    }
}
