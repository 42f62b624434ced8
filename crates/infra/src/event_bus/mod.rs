//! In-process event bus (C10): synchronous fan-out over a registry
//! guarded by a single `RwLock`, read-locked on the (hot) publish path and
//! write-locked only on subscribe/unsubscribe.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tsic_core::ports::{EventBusPort, EventSubscriber, SubscriptionId, SyncEvent, TopicCounts};

struct Entry {
    id: SubscriptionId,
    subscriber: Arc<dyn EventSubscriber>,
}

/// Default [`EventBusPort`] implementation.
pub struct InProcessEventBus {
    subscribers: RwLock<Vec<Entry>>,
    next_id: AtomicU64,
}

impl InProcessEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self { subscribers: RwLock::new(Vec::new()), next_id: AtomicU64::new(1) }
    }

    /// Per-topic subscriber counts, for diagnostics and tests.
    #[must_use]
    pub fn topic_counts(&self) -> TopicCounts {
        // This bus delivers every event to every subscriber regardless of
        // topic, so the count is the same for each of the three topics.
        let count = self.subscribers.read().expect("subscribers poisoned").len();
        [
            tsic_domain::constants::TOPIC_SYNC_COMPLETED,
            tsic_domain::constants::TOPIC_TRANSCRIPT_AVAILABLE,
            tsic_domain::constants::TOPIC_CREDENTIAL_INVALIDATED,
        ]
        .into_iter()
        .map(|topic| (topic, count))
        .collect()
    }
}

impl Default for InProcessEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBusPort for InProcessEventBus {
    fn subscribe(&self, subscriber: Arc<dyn EventSubscriber>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.write().expect("subscribers poisoned").push(Entry { id, subscriber });
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.write().expect("subscribers poisoned").retain(|entry| entry.id != id);
    }

    fn publish(&self, event: SyncEvent) {
        let subscribers = self.subscribers.read().expect("subscribers poisoned");
        for entry in subscribers.iter() {
            entry.subscriber.handle(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct CountingSubscriber {
        count: AtomicUsize,
    }

    impl EventSubscriber for CountingSubscriber {
        fn handle(&self, _event: &SyncEvent) {
            self.count.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn delivers_events_to_every_subscriber_in_order() {
        let bus = InProcessEventBus::new();
        let sub_a = Arc::new(CountingSubscriber { count: AtomicUsize::new(0) });
        let sub_b = Arc::new(CountingSubscriber { count: AtomicUsize::new(0) });
        bus.subscribe(sub_a.clone());
        bus.subscribe(sub_b.clone());

        bus.publish(SyncEvent::TranscriptAvailable { user_id: "u1".into(), meeting_id: "m1".into() });

        assert_eq!(sub_a.count.load(Ordering::Relaxed), 1);
        assert_eq!(sub_b.count.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus = InProcessEventBus::new();
        let sub = Arc::new(CountingSubscriber { count: AtomicUsize::new(0) });
        let id = bus.subscribe(sub.clone());
        bus.unsubscribe(id);

        bus.publish(SyncEvent::TranscriptAvailable { user_id: "u1".into(), meeting_id: "m1".into() });

        assert_eq!(sub.count.load(Ordering::Relaxed), 0);
    }
}
