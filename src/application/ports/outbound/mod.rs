//! Outbound ports - Interfaces that the application requires from external systems

mod catalog_source_port;
mod event_bus_port;
mod state_store_port;

pub use catalog_source_port::CatalogSourcePort;
pub use event_bus_port::EventBusPort;
pub use state_store_port::{CreatureStatePort, StoreError};
