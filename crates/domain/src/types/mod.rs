//! Domain entities: credentials, meetings, updates, and context references.

pub mod context_reference;
pub mod credential;
pub mod meeting;
pub mod update;

pub use context_reference::ContextReference;
pub use credential::{AuthType, CredentialPayload, IntegrationCredential};
pub use meeting::{ActionItem, Attendee, Meeting, MeetingMetadata};
pub use update::{Update, UpdateType};
