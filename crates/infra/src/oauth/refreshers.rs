//! [`CredentialRefresher`] implementations, one per service. The
//! oauth-based services wrap `tsic_common::auth::OAuthClient` directly at
//! the token-endpoint level rather than `OAuthService`, since
//! [`tsic_core::services::credential::CredentialService`] already owns the
//! refresh-threshold and retry orchestration `OAuthService`/`TokenManager`
//! would otherwise duplicate.

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use tsic_common::auth::OAuthClient;
use tsic_core::ports::{CredentialRefresher, RefreshedToken};
use tsic_domain::{CredentialPayload, Result, TsicError};

use crate::http::HttpClient;

/// Wraps `OAuthClient::refresh_access_token` for the calendar (PKCE) and
/// issues (client-secret) services.
pub struct OAuthTokenRefresher {
    client: OAuthClient,
    provider: &'static str,
}

impl OAuthTokenRefresher {
    #[must_use]
    pub fn new(client: OAuthClient, provider: &'static str) -> Self {
        Self { client, provider }
    }
}

#[async_trait]
impl CredentialRefresher for OAuthTokenRefresher {
    async fn refresh(
        &self,
        refresh_token: Option<&str>,
        metadata: &CredentialPayload,
    ) -> Result<RefreshedToken> {
        let refresh_token = refresh_token.ok_or_else(|| TsicError::CredentialInvalidated {
            service: self.provider.to_string(),
        })?;

        let tokens = self.client.refresh_access_token(refresh_token).await.map_err(|err| {
            map_oauth_error(self.provider, &err)
        })?;

        Ok(RefreshedToken {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_in_seconds: tokens.expires_in,
            metadata: Some(metadata.clone()),
        })
    }
}

fn map_oauth_error(provider: &str, err: &tsic_common::auth::OAuthClientError) -> TsicError {
    let message = err.to_string();
    let lowered = message.to_ascii_lowercase();
    if lowered.contains("invalid_grant") || lowered.contains("401") || lowered.contains("unauthorized") {
        TsicError::CredentialInvalidated { service: provider.to_string() }
    } else {
        TsicError::CredentialRefreshFailed { service: provider.to_string(), message }
    }
}

#[derive(Serialize)]
struct AppInstallationClaims {
    iat: i64,
    exp: i64,
    iss: String,
}

/// GitHub-App-style installation token refresher: signs a short-lived RS256
/// JWT with the app's private key and exchanges it for an installation
/// access token (~1 hour lifetime).
pub struct AppInstallationRefresher {
    http: HttpClient,
    private_key_pem: String,
    installation_token_url_template: String,
}

impl AppInstallationRefresher {
    /// `installation_token_url_template` must contain a single `{installation_id}`
    /// placeholder, e.g. `https://api.example.com/app/installations/{installation_id}/access_tokens`.
    #[must_use]
    pub fn new(http: HttpClient, private_key_pem: String, installation_token_url_template: String) -> Self {
        Self { http, private_key_pem, installation_token_url_template }
    }

    fn sign_jwt(&self, app_id: &str) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims =
            AppInstallationClaims { iat: now - 60, exp: now + 9 * 60, iss: app_id.to_string() };
        let key = EncodingKey::from_rsa_pem(self.private_key_pem.as_bytes()).map_err(|err| {
            TsicError::InternalInvariantViolated {
                message: format!("invalid app_installation private key: {err}"),
            }
        })?;
        encode(&Header::new(Algorithm::RS256), &claims, &key).map_err(|err| {
            TsicError::InternalInvariantViolated { message: format!("failed to sign app jwt: {err}") }
        })
    }
}

#[async_trait]
impl CredentialRefresher for AppInstallationRefresher {
    async fn refresh(
        &self,
        _refresh_token: Option<&str>,
        metadata: &CredentialPayload,
    ) -> Result<RefreshedToken> {
        let CredentialPayload::AppInstallation { installation_id, app_id } = metadata else {
            return Err(TsicError::InternalInvariantViolated {
                message: "AppInstallationRefresher invoked with non-app_installation metadata".into(),
            });
        };

        let jwt = self.sign_jwt(app_id)?;
        let url = self.installation_token_url_template.replace("{installation_id}", &installation_id.to_string());

        let response = self
            .http
            .send(self.http.request(reqwest::Method::POST, &url).bearer_auth(jwt))
            .await?;

        #[derive(serde::Deserialize)]
        struct InstallationTokenResponse {
            token: String,
            expires_at: chrono::DateTime<Utc>,
        }

        let body: InstallationTokenResponse = response
            .json()
            .await
            .map_err(|e| TsicError::ParseFailure {
                what: "installation token response".into(),
                message: e.to_string(),
            })?;

        let expires_in = (body.expires_at - Utc::now()).num_seconds().max(0);

        Ok(RefreshedToken {
            access_token: body.token,
            refresh_token: None,
            expires_in_seconds: expires_in,
            metadata: Some(metadata.clone()),
        })
    }
}
