//! # TSIC Infrastructure
//!
//! Infrastructure implementations of the core domain ports.
//!
//! This crate contains:
//! - Configuration loading
//! - SQLite store and credential store implementations
//! - HTTP client plumbing (retries, timeouts)
//! - OAuth loopback server and credential refreshers
//! - Provider clients (calendar, issues, code host)
//! - LLM and code-query adapters
//! - The in-process event bus
//! - The per-user sync orchestrator
//!
//! ## Architecture
//! - Implements traits defined in `tsic-core`
//! - Depends on `tsic-common` and `tsic-core`
//! - Contains all "impure" code (I/O, network, SQL)

pub mod code_query;
pub mod config;
pub mod db;
pub mod errors;
pub mod event_bus;
pub mod http;
pub mod llm;
pub mod oauth;
pub mod orchestrator;
pub mod providers;

// Re-export commonly used items
pub use code_query::HttpCodeQueryAdapter;
pub use config::load;
pub use db::{DbManager, SharedDb, SqliteCredentialStore, SqliteStore};
pub use errors::InfraError;
pub use event_bus::InProcessEventBus;
pub use http::{HttpClient, HttpClientBuilder};
pub use llm::OpenAiLlmClient;
pub use oauth::{AppInstallationRefresher, OAuthCallbackServer, OAuthTokenRefresher};
pub use orchestrator::SyncOrchestrator;
pub use providers::{GitHubCodeHostProvider, GraphCalendarProvider, JiraIssuesProvider};
