//! Catalog source port - Where creature definitions come from

use async_trait::async_trait;

use crate::domain::aggregates::CatalogError;
use crate::domain::entities::CreatureDefinition;

#[async_trait]
pub trait CatalogSourcePort: Send + Sync {
    /// Parse the source of truth into definitions, in source order
    async fn load(&self) -> Result<Vec<CreatureDefinition>, CatalogError>;

    /// Human-readable description of the source, for logs
    fn describe(&self) -> String;
}
