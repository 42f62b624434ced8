//! High-level OAuth service orchestrator
//!
//! Combines the OAuth client, the credential store, and the token manager
//! into a single service for easy integration.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use super::client::{OAuthClient, OAuthClientError};
use super::token_manager::{TokenManager, TokenManagerError};
use super::types::{OAuthConfig, TokenSet};
use crate::auth::traits::CredentialStoreTrait;

/// Error type for OAuth service operations
#[derive(Debug)]
pub enum OAuthServiceError {
    /// Token manager error
    TokenManager(TokenManagerError),

    /// OAuth client error
    OAuthClient(OAuthClientError),

    /// Configuration error
    ConfigError(String),

    /// Browser launch failed
    BrowserError(String),
}

impl std::fmt::Display for OAuthServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TokenManager(e) => write!(f, "Token manager error: {e}"),
            Self::OAuthClient(e) => write!(f, "OAuth client error: {e}"),
            Self::ConfigError(msg) => write!(f, "Configuration error: {msg}"),
            Self::BrowserError(msg) => write!(f, "Browser launch failed: {msg}"),
        }
    }
}

impl std::error::Error for OAuthServiceError {}

impl From<TokenManagerError> for OAuthServiceError {
    fn from(err: TokenManagerError) -> Self {
        Self::TokenManager(err)
    }
}

impl From<OAuthClientError> for OAuthServiceError {
    fn from(err: OAuthClientError) -> Self {
        Self::OAuthClient(err)
    }
}

/// OAuth service for server-side authentication
///
/// High-level service that orchestrates:
/// - Browser-based OAuth PKCE flow
/// - Token storage via a `CredentialStoreTrait` implementation
/// - Automatic token refresh
/// - Authentication state management
#[derive(Clone)]
pub struct OAuthService<K>
where
    K: CredentialStoreTrait + 'static,
{
    oauth_client: Arc<OAuthClient>,
    token_manager: Arc<TokenManager<OAuthClient, K>>,
    pending_state: Arc<RwLock<Option<String>>>,
}

impl<K> OAuthService<K>
where
    K: CredentialStoreTrait + 'static,
{
    /// Create a new OAuth service
    ///
    /// # Arguments
    /// * `config` - OAuth configuration (domain, client_id, etc.)
    /// * `credential_store` - Store for persisting tokens
    /// * `service_name` - Logical service name (e.g., "calendar")
    /// * `account_name` - Account key within the service (e.g., a user id)
    /// * `refresh_threshold_seconds` - Refresh tokens this many seconds before
    ///   expiry (default: 300)
    #[must_use]
    pub fn new(
        config: OAuthConfig,
        credential_store: Arc<K>,
        service_name: String,
        account_name: String,
        refresh_threshold_seconds: i64,
    ) -> Self {
        let oauth_client = OAuthClient::new(config);
        let account_key = format!("{service_name}.{account_name}");

        let token_manager = TokenManager::new(
            oauth_client.clone(),
            credential_store,
            account_key,
            refresh_threshold_seconds,
        );

        Self {
            oauth_client: Arc::new(oauth_client),
            token_manager: Arc::new(token_manager),
            pending_state: Arc::new(RwLock::new(None)),
        }
    }

    /// Initialize service (load tokens from the credential store)
    ///
    /// Should be called on startup for the account.
    ///
    /// # Returns
    /// `true` if tokens were loaded, `false` if no tokens exist
    ///
    /// # Errors
    /// Returns error if the credential store access fails
    pub async fn initialize(&self) -> Result<bool, OAuthServiceError> {
        self.token_manager.initialize().await.map_err(Into::into)
    }

    /// Start OAuth login flow
    ///
    /// Generates authorization URL. Caller is responsible for opening a
    /// browser or redirecting the user.
    ///
    /// # Returns
    /// Tuple of (authorization_url, state) where state is used for CSRF
    /// protection
    ///
    /// # Errors
    /// Returns error if PKCE challenge generation fails
    pub async fn start_login(&self) -> Result<(String, String), OAuthServiceError> {
        let (auth_url, state) = self.oauth_client.generate_authorization_url().await?;

        *self.pending_state.write().await = Some(state.clone());

        info!("Generated OAuth authorization URL");

        Ok((auth_url, state))
    }

    /// Complete OAuth login (handle callback)
    ///
    /// Called when the loopback callback server receives the redirect with
    /// an authorization code. Validates state, exchanges the code for
    /// tokens, and persists them via the credential store.
    ///
    /// # Arguments
    /// * `code` - Authorization code from the callback URL
    /// * `state` - State parameter from the callback URL (CSRF protection)
    ///
    /// # Returns
    /// `TokenSet` containing access/refresh tokens
    ///
    /// # Errors
    /// Returns error if:
    /// - State mismatch (CSRF attack)
    /// - Token exchange fails
    /// - Credential store write fails
    pub async fn complete_login(
        &self,
        code: &str,
        state: &str,
    ) -> Result<TokenSet, OAuthServiceError> {
        let expected_state = self
            .pending_state
            .write()
            .await
            .take()
            .ok_or_else(|| OAuthServiceError::ConfigError("No pending login".to_string()))?;

        if expected_state != state {
            return Err(OAuthServiceError::OAuthClient(OAuthClientError::StateMismatch {
                expected: expected_state,
                received: state.to_string(),
            }));
        }

        let tokens = self.oauth_client.exchange_code_for_tokens(code, state).await?;

        self.token_manager.store_tokens(tokens.clone()).await?;

        info!("OAuth login completed successfully");

        Ok(tokens)
    }

    /// Get current access token (with auto-refresh)
    ///
    /// Primary method for retrieving access tokens.
    /// Automatically refreshes if token is expired or near expiry.
    ///
    /// # Errors
    /// Returns error if:
    /// - Not authenticated
    /// - Token refresh fails
    pub async fn get_access_token(&self) -> Result<String, OAuthServiceError> {
        self.token_manager.get_access_token().await.map_err(Into::into)
    }

    /// Get current token set (without auto-refresh)
    pub async fn get_tokens(&self) -> Option<TokenSet> {
        self.token_manager.get_tokens().await
    }

    /// Check if the account is authenticated
    #[must_use]
    pub async fn is_authenticated(&self) -> bool {
        self.token_manager.is_authenticated().await
    }

    /// Logout (clear all tokens)
    ///
    /// # Errors
    /// Returns error if credential store delete fails
    pub async fn logout(&self) -> Result<(), OAuthServiceError> {
        *self.pending_state.write().await = None;

        self.token_manager.clear_tokens().await.map_err(Into::into)
    }

    /// Start background auto-refresh task
    ///
    /// Spawns a background task that sleeps until tokens need refreshing
    /// and refreshes them automatically.
    pub fn start_auto_refresh(&self) {
        let token_manager = self.token_manager.clone();
        tokio::spawn(async move {
            token_manager.start_auto_refresh().await;
        });
    }

    /// Get the underlying token manager for advanced operations
    #[must_use]
    pub fn token_manager(&self) -> Arc<TokenManager<OAuthClient, K>> {
        self.token_manager.clone()
    }

    /// Get the underlying OAuth client for advanced operations
    #[must_use]
    pub fn oauth_client(&self) -> Arc<OAuthClient> {
        self.oauth_client.clone()
    }

    /// Get seconds until token expiry
    #[must_use]
    pub async fn seconds_until_expiry(&self) -> Option<i64> {
        self.token_manager.seconds_until_expiry().await
    }

    /// Clear pending state (useful for canceling an in-flight login flow)
    pub async fn clear_pending_state(&self) {
        *self.pending_state.write().await = None;
    }

    /// Check if there's a pending login flow
    #[must_use]
    pub async fn has_pending_login(&self) -> bool {
        self.pending_state.read().await.is_some()
    }
}

impl<K> std::fmt::Debug for OAuthService<K>
where
    K: CredentialStoreTrait + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthService")
            .field("oauth_client", &"OAuthClient")
            .field("token_manager", &"TokenManager")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::service.
    use std::sync::Once;

    use super::*;
    use crate::testing::MockCredentialStore;

    fn disable_proxy() {
        static INIT: Once = Once::new();
        INIT.call_once(|| std::env::set_var("TSIC_DISABLE_PROXY", "1"));
    }

    fn create_test_service() -> OAuthService<MockCredentialStore> {
        disable_proxy();
        let config = OAuthConfig::new(
            "dev-test.us.auth0.com".to_string(),
            "test_client".to_string(),
            "http://localhost:3000/callback".to_string(),
            vec!["openid".to_string(), "offline_access".to_string()],
            Some("https://api.tsic.example".to_string()),
        );

        let test_service = format!("TsicTest.oauth.{}", uuid::Uuid::new_v4());
        let credential_store = Arc::new(MockCredentialStore::new(test_service));

        OAuthService::new(
            config,
            credential_store,
            "test.service".to_string(),
            "test.account".to_string(),
            300,
        )
    }

    /// Validates the oauth service creation scenario.
    ///
    /// Assertions:
    /// - Ensures `!service.is_authenticated().await` evaluates to true.
    #[tokio::test]
    async fn test_oauth_service_creation() {
        let service = create_test_service();
        assert!(!service.is_authenticated().await);
    }

    /// Validates the start login flow scenario.
    ///
    /// Assertions:
    /// - Ensures `result.is_ok()` evaluates to true.
    /// - Ensures `url.starts_with("https://dev-test.us.auth0.com/authorize?")`
    ///   evaluates to true.
    /// - Ensures `!state.is_empty()` evaluates to true.
    /// - Ensures `service.has_pending_login().await` evaluates to true.
    #[tokio::test]
    async fn test_start_login_flow() {
        let service = create_test_service();

        let result = service.start_login().await;
        assert!(result.is_ok());

        let (url, state) = result.unwrap();
        assert!(url.starts_with("https://dev-test.us.auth0.com/authorize?"));
        assert!(!state.is_empty());

        assert!(service.has_pending_login().await);
    }

    /// Validates `OAuthServiceError::ConfigError` behavior for the complete
    /// login no pending state scenario.
    ///
    /// Assertions:
    /// - Ensures `matches!(result, Err(OAuthServiceError::ConfigError(_)))`
    ///   evaluates to true.
    #[tokio::test]
    async fn test_complete_login_no_pending_state() {
        let service = create_test_service();

        let result = service.complete_login("code123", "state456").await;
        assert!(matches!(result, Err(OAuthServiceError::ConfigError(_))));
    }

    /// Validates `TokenSet::new` behavior for the logout scenario.
    ///
    /// Assertions:
    /// - Ensures `!service.is_authenticated().await` evaluates to true.
    #[tokio::test]
    async fn test_logout() {
        let service = create_test_service();

        let tokens =
            TokenSet::new("access".to_string(), Some("refresh".to_string()), None, 3600, None);
        service.token_manager.store_tokens(tokens).await.unwrap();

        service.logout().await.unwrap();

        assert!(!service.is_authenticated().await);
    }

    /// Validates the clear pending state scenario.
    ///
    /// Assertions:
    /// - Ensures `service.has_pending_login().await` evaluates to true.
    /// - Ensures `!service.has_pending_login().await` evaluates to true.
    #[tokio::test]
    async fn test_clear_pending_state() {
        let service = create_test_service();

        service.start_login().await.unwrap();
        assert!(service.has_pending_login().await);

        service.clear_pending_state().await;
        assert!(!service.has_pending_login().await);
    }

    /// Validates `OAuthServiceError::TokenManager` behavior for the get access
    /// token not authenticated scenario.
    ///
    /// Assertions:
    /// - Ensures `matches!( result,
    ///   Err(OAuthServiceError::TokenManager(TokenManagerError::NotAuthenticated))
    ///   )` evaluates to true.
    #[tokio::test]
    async fn test_get_access_token_not_authenticated() {
        let service = create_test_service();

        let result = service.get_access_token().await;
        assert!(matches!(
            result,
            Err(OAuthServiceError::TokenManager(TokenManagerError::NotAuthenticated))
        ));
    }
}
