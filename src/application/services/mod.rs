//! Application services - Use case implementations
//!
//! Services accept port dependencies and return domain types or DTOs.

pub mod catalog_service;
pub mod lifecycle_service;

pub use catalog_service::CatalogService;
pub use lifecycle_service::{LifecycleError, LifecyclePolicy, LifecycleService};
