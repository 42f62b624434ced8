//! Closed error taxonomy shared by every TSIC crate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for TSIC, modeled as a closed sum type (kinds, not
/// type names) per the error handling design.
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail")]
pub enum TsicError {
    /// No credential row for (user_id, service); caller reports "not connected".
    #[error("no credential for service {service}")]
    CredentialMissing {
        /// Service the credential was looked up for.
        service: String,
    },

    /// Refresh attempt failed transiently; current step is skipped.
    #[error("credential refresh failed for {service}: {message}")]
    CredentialRefreshFailed {
        /// Service the refresh was attempted for.
        service: String,
        /// Human-readable detail, for logs only.
        message: String,
    },

    /// Refresh failed unrecoverably (401/invalid_grant, or 410 Gone on any call).
    /// The credential row has been deleted and `credential-invalidated` emitted.
    #[error("credential invalidated for {service}")]
    CredentialInvalidated {
        /// Service whose credential was invalidated.
        service: String,
    },

    /// 5xx / timeout / network error from an external provider.
    #[error("transient provider error calling {provider}: {message}")]
    ProviderTransient {
        /// Provider name (calendar, issues, code, llm, code_query).
        provider: String,
        /// Human-readable detail, for logs only.
        message: String,
    },

    /// 403 from a provider on a specific resource.
    #[error("permission denied by {provider} for {resource}")]
    ProviderPermission {
        /// Provider name.
        provider: String,
        /// Resource identifier the call was scoped to.
        resource: String,
    },

    /// 404 from a provider; treated as "absent", not an error, by most callers.
    #[error("{resource} not found on {provider}")]
    ProviderNotFound {
        /// Provider name.
        provider: String,
        /// Resource identifier that was not found.
        resource: String,
    },

    /// Unexpected payload shape; raw payload retained, derived fields left empty.
    #[error("failed to parse {what}: {message}")]
    ParseFailure {
        /// What was being parsed (e.g. "calendar event", "llm summary json").
        what: String,
        /// Human-readable detail.
        message: String,
    },

    /// Store is unreachable or returned a transient error; abort current step only.
    #[error("store unavailable: {message}")]
    StoreUnavailable {
        /// Human-readable detail.
        message: String,
    },

    /// A programming invariant was violated; log with full context, abort the
    /// cycle for that user.
    #[error("internal invariant violated: {message}")]
    InternalInvariantViolated {
        /// Human-readable detail.
        message: String,
    },
}

/// Severity used only for log-level selection; not part of the wire taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    /// Expected, routine (e.g. CredentialMissing, ProviderNotFound).
    Info,
    /// Degraded but recoverable.
    Warn,
    /// Requires operator attention.
    Error,
}

/// Extension trait answering the two questions the orchestrator and provider
/// clients need to make retry/skip decisions, without string-matching errors.
pub trait ErrorClassification {
    /// Whether retrying the same call again has a chance of succeeding.
    fn is_retryable(&self) -> bool;

    /// Whether this error should abort the entire sync cycle for a user,
    /// as opposed to just the current step.
    fn is_cycle_fatal(&self) -> bool;

    /// Suggested log severity.
    fn severity(&self) -> ErrorSeverity;
}

impl ErrorClassification for TsicError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::ProviderTransient { .. } | Self::StoreUnavailable { .. })
    }

    fn is_cycle_fatal(&self) -> bool {
        matches!(self, Self::InternalInvariantViolated { .. })
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::CredentialMissing { .. } | Self::ProviderNotFound { .. } => ErrorSeverity::Info,
            Self::InternalInvariantViolated { .. } => ErrorSeverity::Error,
            _ => ErrorSeverity::Warn,
        }
    }
}

/// Result type alias for TSIC operations.
pub type Result<T> = std::result::Result<T, TsicError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_transient_is_retryable_but_not_cycle_fatal() {
        let err = TsicError::ProviderTransient {
            provider: "calendar".into(),
            message: "timeout".into(),
        };
        assert!(err.is_retryable());
        assert!(!err.is_cycle_fatal());
        assert_eq!(err.severity(), ErrorSeverity::Warn);
    }

    #[test]
    fn internal_invariant_is_cycle_fatal() {
        let err = TsicError::InternalInvariantViolated { message: "bad state".into() };
        assert!(err.is_cycle_fatal());
        assert_eq!(err.severity(), ErrorSeverity::Error);
    }

    #[test]
    fn serializes_with_tagged_kind() {
        let err = TsicError::CredentialMissing { service: "issues".into() };
        let json = serde_json::to_value(&err).expect("serialize");
        assert_eq!(json["kind"], "CredentialMissing");
        assert_eq!(json["detail"]["service"], "issues");
    }
}
