//! Modular common utilities shared across TSIC crates.
//!
//! # Safety and Quality
//!
//! This crate enforces strict safety and quality standards to ensure
//! reliability across all TSIC components.
//!
//! # Modules
//!
//! - [`auth`]: OAuth 2.0 + PKCE client, token lifecycle management, and the
//!   store-backed credential persistence trait.
//! - [`cache`]: Generic in-process cache with configurable eviction and TTL.
//! - [`privacy`]: Secure hashing for privacy-preserving logging (email
//!   redaction).
//! - [`resilience`]: Retry strategies with configurable backoff and jitter.
//! - [`time`]: Duration parsing/formatting, intervals, timers.
//! - [`utils`]: Small serialization helpers and macros.
//! - [`testing`]: Mocks and fixtures shared by integration tests.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

#[macro_use]
pub mod utils;

pub mod auth;
pub mod cache;
pub mod privacy;
pub mod resilience;
pub mod time;

#[cfg(any(feature = "test-utils", test))]
pub mod testing;

// Note: configuration helpers live in tsic-domain.

pub use resilience::{
    retry, retry_with_policy, BackoffStrategy, Jitter, RetryConfig, RetryConfigBuilder,
    RetryDecision, RetryError, RetryExecutor, RetryPolicy, RetryResult,
};
pub use utils::serde::duration_millis;
