//! # TSIC Domain
//!
//! Business domain types and models for the Team Sync Intelligence Core.
//!
//! This crate contains:
//! - Domain data types (Meeting, Update, IntegrationCredential, ...)
//! - The closed domain error taxonomy and `Result` alias
//! - Configuration structures and their defaults
//! - Domain constants and pure utility functions
//!
//! ## Architecture
//! - No dependencies on other TSIC crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures; no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;
pub mod utils;

pub use config::*;
pub use errors::*;
pub use types::*;
