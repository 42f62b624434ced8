//! Adapter satisfying `tsic_common::auth::CredentialStoreTrait` on top of
//! the same `integration_credential` table [`super::store::SqliteStore`]
//! owns, so a login flow using `OAuthService` and C2's steady-state
//! refresh (via [`crate::oauth::CredentialRefresherAdapter`]) agree on one
//! row per `(user_id, service_name)`.
//!
//! `CredentialStoreTrait` is keyed by a single `account: &str`; `OAuthService`
//! builds it as `"{service_name}.{account_name}"`, so this adapter expects
//! that form and splits on the first `.`.

use async_trait::async_trait;
use chrono::Utc;
use tsic_common::auth::traits::CredentialStoreTrait;
use tsic_common::auth::types::TokenSet;
use tsic_domain::{CredentialPayload, IntegrationCredential};

use super::manager::SharedDb;
use super::store::SqliteStore;
use tsic_core::StorePort;

/// `CredentialStoreTrait` implementation used only during the interactive
/// OAuth login flow; steady-state refresh goes through
/// [`tsic_core::ports::StorePort`] directly via [`SqliteStore`].
pub struct SqliteCredentialStore {
    store: SqliteStore,
}

impl SqliteCredentialStore {
    #[must_use]
    pub fn new(db: SharedDb) -> Self {
        Self { store: SqliteStore::new(db) }
    }

    /// Returns `(user_id, service_name)`, the order `StorePort` expects.
    fn split_account(account: &str) -> Result<(String, String), String> {
        account
            .split_once('.')
            .map(|(service, user)| (user.to_string(), service.to_string()))
            .ok_or_else(|| format!("account '{account}' is not of the form service.user"))
    }
}

#[async_trait]
impl CredentialStoreTrait for SqliteCredentialStore {
    async fn store_tokens(&self, account: &str, tokens: &TokenSet) -> Result<(), String> {
        let (user_id, service_name) = Self::split_account(account)?;
        let now = Utc::now();
        let credential = IntegrationCredential {
            user_id,
            service_name,
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            token_expires_at: tokens.expires_at.unwrap_or(now),
            scopes: tokens
                .scope
                .as_deref()
                .map(|s| s.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
            metadata: CredentialPayload::OauthPkce,
            connected_at: now,
        };
        self.store.put_credential(credential).await.map_err(|e| e.to_string())
    }

    async fn retrieve_tokens(&self, account: &str) -> Result<TokenSet, String> {
        let (user_id, service_name) = Self::split_account(account)?;
        let credential = self
            .store
            .get_credential(&user_id, &service_name)
            .await
            .map_err(|e| e.to_string())?
            .ok_or_else(|| format!("no tokens stored for {account}"))?;

        Ok(TokenSet {
            access_token: credential.access_token,
            refresh_token: credential.refresh_token,
            id_token: None,
            token_type: "Bearer".to_string(),
            expires_in: (credential.token_expires_at - Utc::now()).num_seconds().max(0),
            expires_at: Some(credential.token_expires_at),
            scope: if credential.scopes.is_empty() { None } else { Some(credential.scopes.join(" ")) },
        })
    }

    async fn delete_tokens(&self, account: &str) -> Result<(), String> {
        let (user_id, service_name) = Self::split_account(account)?;
        self.store.delete_credential(&user_id, &service_name).await.map_err(|e| e.to_string())
    }

    async fn has_tokens(&self, account: &str) -> bool {
        let Ok((user_id, service_name)) = Self::split_account(account) else {
            return false;
        };
        matches!(self.store.get_credential(&user_id, &service_name).await, Ok(Some(_)))
    }
}
