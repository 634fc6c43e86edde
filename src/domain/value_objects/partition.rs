//! Partition keys - The single identity under which one creature is stored

use serde::{Deserialize, Serialize};

/// How group conversations map onto creature records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupMode {
    /// One creature per user across every group and private chat
    #[serde(alias = "Shared")]
    Shared,
    /// One creature per (user, group); private chats use the bare user
    #[default]
    #[serde(alias = "Separate")]
    Separate,
}

/// Composite identity `(owner[, group])` of one creature record.
///
/// `owner` is always the raw user id, so wallet credits land on the person
/// regardless of which group the turn happened in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartitionKey {
    owner: String,
    group: Option<i64>,
}

impl PartitionKey {
    /// Map a raw user id and optional group onto a partition.
    ///
    /// A group id of `0` is treated as a private chat.
    pub fn resolve(raw_user_id: &str, group_id: Option<i64>, mode: GroupMode) -> Self {
        let group = match (mode, group_id) {
            (GroupMode::Separate, Some(group)) if group != 0 => Some(group),
            _ => None,
        };

        Self {
            owner: raw_user_id.trim().to_string(),
            group,
        }
    }

    /// Rebuild a key from its stored columns (`group_id` is `""` for none)
    pub fn from_columns(owner: impl Into<String>, group_column: &str) -> Result<Self, String> {
        let group = if group_column.is_empty() {
            None
        } else {
            Some(
                group_column
                    .parse::<i64>()
                    .map_err(|_| format!("Invalid group column: {}", group_column))?,
            )
        };

        Ok(Self {
            owner: owner.into(),
            group,
        })
    }

    /// Parse the textual form produced by `Display` (`owner` or `owner@g<group>`)
    pub fn parse(text: &str) -> Result<Self, String> {
        let text = text.trim();
        match text.rsplit_once("@g") {
            Some((owner, group)) if !owner.is_empty() => {
                let group = group
                    .parse::<i64>()
                    .map_err(|_| format!("Invalid partition key: {}", text))?;
                Ok(Self::resolve(owner, Some(group), GroupMode::Separate))
            }
            _ if !text.is_empty() => Ok(Self::resolve(text, None, GroupMode::Shared)),
            _ => Err("Partition key cannot be empty".to_string()),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Column value for the group part of the key
    pub fn group_column(&self) -> String {
        self.group.map(|g| g.to_string()).unwrap_or_default()
    }
}

impl std::fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.group {
            Some(group) => write!(f, "{}@g{}", self.owner, group),
            None => write!(f, "{}", self.owner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partitions_are_isolated() {
        let group_one = PartitionKey::resolve("123", Some(1), GroupMode::Separate);
        let group_two = PartitionKey::resolve("123", Some(2), GroupMode::Separate);
        let shared = PartitionKey::resolve("123", Some(1), GroupMode::Shared);

        assert_ne!(group_one, group_two);
        assert_ne!(group_two, shared);
        assert_ne!(group_one, shared);
    }

    #[test]
    fn test_shared_mode_ignores_group() {
        let a = PartitionKey::resolve("123", Some(1), GroupMode::Shared);
        let b = PartitionKey::resolve("123", Some(99), GroupMode::Shared);
        let private = PartitionKey::resolve("123", None, GroupMode::Shared);
        assert_eq!(a, b);
        assert_eq!(a, private);
        assert_eq!(a.to_string(), "123");
    }

    #[test]
    fn test_separate_mode_textual_form() {
        let key = PartitionKey::resolve("123", Some(456), GroupMode::Separate);
        assert_eq!(key.to_string(), "123@g456");
        assert_eq!(key.owner(), "123");

        // private chat and group 0 both collapse to the bare user
        assert_eq!(
            PartitionKey::resolve("123", None, GroupMode::Separate).to_string(),
            "123"
        );
        assert_eq!(
            PartitionKey::resolve("123", Some(0), GroupMode::Separate).to_string(),
            "123"
        );
    }

    #[test]
    fn test_parse_and_columns() {
        let key = PartitionKey::parse("777@g42").unwrap();
        assert_eq!(key, PartitionKey::resolve("777", Some(42), GroupMode::Separate));
        assert_eq!(key.group_column(), "42");

        let bare = PartitionKey::parse("777").unwrap();
        assert_eq!(bare.group_column(), "");
        assert_eq!(PartitionKey::from_columns("777", "").unwrap(), bare);
        assert_eq!(PartitionKey::from_columns("777", "42").unwrap(), key);

        assert!(PartitionKey::parse("").is_err());
        assert!(PartitionKey::parse("777@gabc").is_err());
    }

    #[test]
    fn test_group_mode_deserialization() {
        let mode: GroupMode = serde_json::from_str("\"Shared\"").unwrap();
        assert_eq!(mode, GroupMode::Shared);
        let mode: GroupMode = serde_json::from_str("\"separate\"").unwrap();
        assert_eq!(mode, GroupMode::Separate);
    }
}
