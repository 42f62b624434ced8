//! SQLite persistence: connection pool, `StorePort` implementation, and
//! the `CredentialStoreTrait` adapter used by the interactive OAuth login
//! flow.

pub mod credential_store;
pub mod manager;
pub mod store;

pub use credential_store::SqliteCredentialStore;
pub use manager::{DbManager, SharedDb};
pub use store::SqliteStore;
