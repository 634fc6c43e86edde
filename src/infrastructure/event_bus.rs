//! In-process lifecycle event bus on a tokio broadcast channel

use tokio::sync::broadcast;

use crate::application::ports::outbound::EventBusPort;
use crate::domain::events::LifecycleEvent;

const EVENT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Clone)]
pub struct BroadcastEventBus {
    sender: broadcast::Sender<LifecycleEvent>,
}

impl BroadcastEventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBusPort for BroadcastEventBus {
    fn publish(&self, event: LifecycleEvent) {
        // Err only means nobody is subscribed right now
        if self.sender.send(event).is_err() {
            tracing::trace!("Lifecycle event dropped, no subscribers");
        }
    }
}

/// Log every lifecycle event until the bus is closed.
///
/// This should be spawned as a background task.
pub async fn run_event_logger(mut receiver: broadcast::Receiver<LifecycleEvent>) {
    loop {
        match receiver.recv().await {
            Ok(event) => log_event(&event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event logger lagged behind the lifecycle bus");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    tracing::info!("Lifecycle event logger shutting down");
}

fn log_event(event: &LifecycleEvent) {
    tracing::trace!(kind = event.kind(), partition = %event.partition(), "Lifecycle event received");
    match event {
        LifecycleEvent::Evolved {
            partition,
            old_id,
            new_id,
            is_rebirth,
            description,
            ..
        } => tracing::info!(
            partition = %partition,
            from = %old_id,
            to = %new_id,
            rebirth = is_rebirth,
            "{}",
            description
        ),
        LifecycleEvent::EmotionChanged {
            partition,
            creature_id,
            delta,
            ..
        } => tracing::debug!(
            partition = %partition,
            creature = %creature_id,
            courage = delta.courage,
            friendship = delta.friendship,
            love = delta.love,
            knowledge = delta.knowledge,
            reasoning = %delta.reasoning,
            "Emotions changed"
        ),
        LifecycleEvent::EvolutionApproaching {
            partition,
            creature_id,
            turns,
            required_turns,
            percent,
            ..
        } => tracing::info!(
            partition = %partition,
            creature = %creature_id,
            turns,
            required_turns,
            "Evolution approaching ({:.0}%)",
            percent
        ),
        LifecycleEvent::Reset {
            partition,
            initial_id,
            ..
        } => tracing::info!(partition = %partition, creature = %initial_id, "Creature reset"),
    }
}
