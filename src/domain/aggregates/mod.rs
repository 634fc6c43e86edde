//! Aggregates - Cluster of domain objects treated as a single unit

pub mod catalog;

pub use catalog::{CatalogError, CatalogSnapshot};
