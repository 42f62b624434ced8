//! Service implementations: one struct per component, each built from
//! `Arc<dyn Port>` dependencies injected by the daemon's wiring code.

pub mod context;
pub mod credential;
pub mod meeting;
pub mod task_code;
pub mod transcript;

pub use context::{AskOptions, AskResponse, ContextAssemblyService, ContextSource, ContextUsed, FilteredContext};
pub use credential::CredentialService;
pub use meeting::{IngestedMeeting, MeetingIntelligenceService};
pub use task_code::TaskCodeIntelligenceService;
pub use transcript::{AcquisitionOutcome, TranscriptEngine};
