//! Credential refresh port: one implementation per `auth_type`, supplied
//! by `tsic-infra`. [`crate::services::credential::CredentialService`] (C2)
//! dispatches to the refresher matching a credential's `auth_type` and
//! never talks to a provider's token endpoint directly.

use async_trait::async_trait;
use tsic_domain::{CredentialPayload, Result};

/// The outcome of a successful refresh.
#[derive(Debug, Clone)]
pub struct RefreshedToken {
    /// New access token.
    pub access_token: String,
    /// New refresh token, if the provider rotated it.
    pub refresh_token: Option<String>,
    /// Seconds until `access_token` expires, from now.
    pub expires_in_seconds: i64,
    /// Updated per-auth-type metadata (e.g. a newly-discovered site id).
    pub metadata: Option<CredentialPayload>,
}

/// A provider-specific refresh strategy for one `auth_type`.
#[async_trait]
pub trait CredentialRefresher: Send + Sync {
    /// Exchange `refresh_token` (or mint a fresh installation token) for a
    /// new access token. Callers are responsible for the failure-mode
    /// mapping in §"Credential Store (C2)": a 401/invalid_grant must be
    /// surfaced as [`tsic_domain::TsicError::CredentialInvalidated`], and
    /// transient network/5xx as [`tsic_domain::TsicError::ProviderTransient`]
    /// (the caller retries twice with 1s/2s backoff before giving up).
    async fn refresh(
        &self,
        refresh_token: Option<&str>,
        metadata: &CredentialPayload,
    ) -> Result<RefreshedToken>;
}
