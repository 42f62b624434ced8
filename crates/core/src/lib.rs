//! # TSIC Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits) at every infrastructure boundary
//! - The services that implement the sync components against those ports
//!
//! ## Architecture Principles
//! - Only depends on `tsic-common` and `tsic-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits in `ports`

pub mod ports;
pub mod services;

pub use ports::{
    CalendarProviderPort, CodeHostProviderPort, CodeQueryPort, CredentialRefresher, EventBusPort,
    IssuesProviderPort, LlmPort, StorePort,
};
pub use services::{
    ContextAssemblyService, CredentialService, MeetingIntelligenceService,
    TaskCodeIntelligenceService, TranscriptEngine,
};
