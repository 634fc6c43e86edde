//! JSON catalog source
//!
//! The catalog file is a JSON array of creature definitions in camelCase.
//! Array order matters: the first `Baby1` entry is the default initial creature.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::application::ports::outbound::CatalogSourcePort;
use crate::domain::aggregates::CatalogError;
use crate::domain::entities::CreatureDefinition;

pub struct JsonCatalogSource {
    path: PathBuf,
}

impl JsonCatalogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CatalogSourcePort for JsonCatalogSource {
    async fn load(&self) -> Result<Vec<CreatureDefinition>, CatalogError> {
        let json = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| CatalogError::Io(format!("{}: {}", self.path.display(), e)))?;

        let definitions: Vec<CreatureDefinition> = serde_json::from_str(&json)
            .map_err(|e| CatalogError::Parse(format!("{}: {}", self.path.display(), e)))?;

        tracing::debug!(
            path = %self.path.display(),
            creatures = definitions.len(),
            "Parsed catalog file"
        );
        Ok(definitions)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
