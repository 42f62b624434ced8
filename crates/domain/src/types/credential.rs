//! Integration credential: a per-(user, service) token lifecycle record.
//!
//! Modeled as a tagged variant rather than a dynamic JSON blob for
//! per-service metadata, per the credential-metadata redesign: `auth_type`
//! doubles as the serde tag on [`CredentialPayload`], so the store boundary
//! decodes a closed set of shapes instead of an opaque map.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The four supported authentication mechanisms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    /// Authorization-code + PKCE flow (no client secret).
    OauthPkce,
    /// Authorization-code flow with a confidential client secret.
    OauthSecret,
    /// App-installation JWT exchange (GitHub-App style).
    AppInstallation,
    /// Long-lived personal access token; never refreshed.
    PersonalToken,
}

/// Per-auth-type metadata payload. The serde tag is `auth_type`, matching
/// [`AuthType`] exactly, so a row's `auth_type` column and its payload shape
/// can never disagree once decoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "auth_type", rename_all = "snake_case")]
pub enum CredentialPayload {
    /// No extra routing metadata beyond the token itself.
    OauthPkce,
    /// Carries the canonical "site id" discovered after the post-exchange
    /// site-selection step (issues provider).
    OauthSecret {
        /// Canonical site id used for all subsequent API calls, once known.
        site_id: Option<String>,
    },
    /// Carries the installation id and app id needed to mint JWTs and
    /// exchange them for installation tokens.
    AppInstallation {
        /// Code-host app installation id.
        installation_id: i64,
        /// Code-host app id, used as the JWT `iss` claim.
        app_id: String,
    },
    /// No refresh metadata; the token is used as-is.
    PersonalToken,
}

impl CredentialPayload {
    /// The [`AuthType`] this payload corresponds to.
    #[must_use]
    pub fn auth_type(&self) -> AuthType {
        match self {
            Self::OauthPkce => AuthType::OauthPkce,
            Self::OauthSecret { .. } => AuthType::OauthSecret,
            Self::AppInstallation { .. } => AuthType::AppInstallation,
            Self::PersonalToken => AuthType::PersonalToken,
        }
    }

    /// Whether this auth type has a refresh protocol at all.
    #[must_use]
    pub fn is_refreshable(&self) -> bool {
        !matches!(self, Self::PersonalToken)
    }
}

/// A per-(user, service) token lifecycle record.
///
/// Identity: `(user_id, service_name)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationCredential {
    /// Owning user.
    pub user_id: String,
    /// One of `calendar`, `issues`, `code`.
    pub service_name: String,
    /// Opaque access token bytes (stored as text).
    pub access_token: String,
    /// Opaque refresh token; present for every `oauth_*` auth type.
    pub refresh_token: Option<String>,
    /// Instant at which `access_token` expires.
    pub token_expires_at: DateTime<Utc>,
    /// Granted OAuth scopes, if applicable.
    pub scopes: Vec<String>,
    /// Tagged per-auth-type metadata; also carries the auth type.
    pub metadata: CredentialPayload,
    /// When this credential was first connected.
    pub connected_at: DateTime<Utc>,
}

impl IntegrationCredential {
    /// `auth_type` invariant: if oauth_*, a refresh token must be present.
    #[must_use]
    pub fn upholds_refresh_token_invariant(&self) -> bool {
        match self.metadata.auth_type() {
            AuthType::OauthPkce | AuthType::OauthSecret => self.refresh_token.is_some(),
            AuthType::AppInstallation | AuthType::PersonalToken => true,
        }
    }

    /// Seconds remaining until `token_expires_at`, possibly negative.
    #[must_use]
    pub fn seconds_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        (self.token_expires_at - now).num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(metadata: CredentialPayload, refresh_token: Option<&str>) -> IntegrationCredential {
        let now = Utc::now();
        IntegrationCredential {
            user_id: "u1".into(),
            service_name: "issues".into(),
            access_token: "tok".into(),
            refresh_token: refresh_token.map(str::to_string),
            token_expires_at: now,
            scopes: vec![],
            metadata,
            connected_at: now,
        }
    }

    #[test]
    fn oauth_without_refresh_token_violates_invariant() {
        let cred = sample(CredentialPayload::OauthSecret { site_id: None }, None);
        assert!(!cred.upholds_refresh_token_invariant());
    }

    #[test]
    fn personal_token_never_requires_refresh_token() {
        let cred = sample(CredentialPayload::PersonalToken, None);
        assert!(cred.upholds_refresh_token_invariant());
        assert!(!cred.metadata.is_refreshable());
    }

    #[test]
    fn app_installation_round_trips_through_json_with_tag() {
        let payload =
            CredentialPayload::AppInstallation { installation_id: 42, app_id: "app-1".into() };
        let json = serde_json::to_value(&payload).expect("serialize");
        assert_eq!(json["auth_type"], "app_installation");
        assert_eq!(json["installation_id"], 42);
        let back: CredentialPayload = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back.auth_type(), AuthType::AppInstallation);
    }
}
