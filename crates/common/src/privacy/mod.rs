//! Privacy Module - Portable Core
//!
//! This module provides portable, domain-independent privacy functionality,
//! currently limited to secure hashing for privacy-preserving logging (for
//! example, hashing an email address before it is written to a log line).

pub mod hash;

// Re-export commonly used types
pub use hash::{HashAlgorithm, HashConfig, HashError, HashResult, SecureHasher};
