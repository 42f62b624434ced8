//! Resilience patterns for fault tolerance and error handling
//!
//! This module provides **generic, reusable** resilience building blocks:
//! - **Retry logic**: configurable retry strategies with exponential backoff
//!   and jitter
//! - **Clock abstraction**: a `Clock` trait so retry delays and cache TTLs can
//!   be tested deterministically without sleeping
//!
//! The implementations are generic over error types (`<E: std::error::Error>`)
//! and framework-agnostic with minimal dependencies.

pub mod clock;
pub mod retry;

// Re-export clock types
pub use clock::{Clock, MockClock, SystemClock};
// Re-export retry types
pub use retry::{
    policies, retry, retry_with_policy, BackoffStrategy, Jitter, RetryConfig, RetryConfigBuilder,
    RetryContext, RetryDecision, RetryError, RetryExecutor, RetryOutcome, RetryPolicy, RetryResult,
};
