//! Event bus port - Fan-out of lifecycle events

use crate::domain::events::LifecycleEvent;

pub trait EventBusPort: Send + Sync {
    /// Publish without blocking; having no subscribers is not an error
    fn publish(&self, event: LifecycleEvent);
}
