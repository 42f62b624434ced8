//! Event Bus port (C10): in-process typed pub/sub. Delivery is
//! best-effort synchronous fan-out on the publishing thread — subscribers
//! must not block, since a slow subscriber stalls every other subscriber
//! and the publisher itself.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// Per-step outcome recorded in a `SyncCompleted` event, one entry per
/// orchestrator cycle step (meetings, transcripts, issues, code).
#[derive(Debug, Clone)]
pub struct StepStats {
    pub step: String,
    pub succeeded: bool,
    pub items_processed: usize,
}

/// The three wire topics named in the component design.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// Emitted once per orchestrator cycle, on completion.
    SyncCompleted { user_id: String, at: DateTime<Utc>, per_step_stats: Vec<StepStats> },
    /// Emitted whenever C4's transcript state machine reaches `DONE_OK`.
    TranscriptAvailable { user_id: String, meeting_id: String },
    /// Emitted whenever C2 deletes a credential row after an unrecoverable
    /// refresh failure.
    CredentialInvalidated { user_id: String, service: String },
}

impl SyncEvent {
    /// The topic name this event is published under.
    #[must_use]
    pub fn topic(&self) -> &'static str {
        match self {
            Self::SyncCompleted { .. } => tsic_domain::constants::TOPIC_SYNC_COMPLETED,
            Self::TranscriptAvailable { .. } => tsic_domain::constants::TOPIC_TRANSCRIPT_AVAILABLE,
            Self::CredentialInvalidated { .. } => {
                tsic_domain::constants::TOPIC_CREDENTIAL_INVALIDATED
            }
        }
    }
}

/// A registered event handler. Implementors own their own fan-out to
/// channels/tasks if they need to do anything that could block.
pub trait EventSubscriber: Send + Sync {
    /// Handle one event, synchronously, on the publisher's thread.
    fn handle(&self, event: &SyncEvent);
}

/// Opaque handle returned by `subscribe`, used to `unsubscribe` later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// In-process event bus contract (C10).
pub trait EventBusPort: Send + Sync {
    /// Register a subscriber, delivered events in emission order.
    fn subscribe(&self, subscriber: std::sync::Arc<dyn EventSubscriber>) -> SubscriptionId;

    /// Remove a previously registered subscriber; a no-op if already gone.
    fn unsubscribe(&self, id: SubscriptionId);

    /// Publish `event` to every current subscriber, synchronously, in
    /// registration order.
    fn publish(&self, event: SyncEvent);
}

/// Convenience grouping of per-topic subscriber counts, useful for tests
/// and diagnostics; not part of the wire contract.
pub type TopicCounts = HashMap<&'static str, usize>;
