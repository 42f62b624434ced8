//! Time mocking re-exports for tests.
//!
//! The `Clock` abstraction itself lives in [`crate::resilience::clock`] since
//! production code (the cache, in particular) depends on it outside of tests.
//! This module just re-exports it under `testing` for discoverability.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use tsic_common::testing::{Clock, MockClock, SystemClock};
//!
//! // Use system clock in production
//! let clock = SystemClock;
//! let now = clock.now();
//!
//! // Use mock clock in tests
//! let mock = MockClock::new();
//! let start = mock.now();
//! mock.advance(Duration::from_secs(5));
//! let end = mock.now();
//! assert_eq!(end.duration_since(start), Duration::from_secs(5));
//! ```

pub use crate::resilience::clock::{Clock, MockClock, SystemClock};
