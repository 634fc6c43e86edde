//! Domain events - Notifications of significant state changes

mod lifecycle_events;

pub use lifecycle_events::{EventMetadata, LifecycleEvent};
