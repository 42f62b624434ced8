//! Port interfaces: the boundaries between core business logic and
//! infrastructure implementations. Everything in here is a trait; nothing
//! in here touches a database, an HTTP client, or the filesystem.

pub mod code_query;
pub mod credential_refresher;
pub mod event_bus;
pub mod llm;
pub mod providers;
pub mod store;

pub use code_query::{CodeChunkSource, CodeQueryOptions, CodeQueryPort, CodeQueryResult, RepoRef};
pub use credential_refresher::{CredentialRefresher, RefreshedToken};
pub use event_bus::{EventBusPort, EventSubscriber, StepStats, SubscriptionId, SyncEvent};
pub use llm::{LlmMessage, LlmPort, LlmRole};
pub use providers::{
    CalendarAttendee, CalendarEvent, CalendarProviderPort, CodeHostProviderPort, FileMetadata,
    IssuesProviderPort, OnlineMeetingRef, ProviderCommit, ProviderIssue, ProviderPullRequest,
    ProviderRepository, TranscriptHandle,
};
pub use store::{MeetingFilter, StorePort, UpdateFilter};
