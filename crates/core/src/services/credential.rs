//! Credential Store service (C2): `get_access_token` with a guaranteed
//! minimum remaining lifetime, refresh-on-demand, and the provider-facing
//! failure semantics (invalidate on 401/invalid_grant/410, retry-then-skip
//! on transient errors).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use tsic_common::resilience::retry::{policies, RetryError};
use tsic_common::{retry_with_policy, RetryConfig};
use tsic_domain::constants::{MIN_TOKEN_LIFETIME_GUARANTEE_SECONDS, TOKEN_REFRESH_THRESHOLD_SECONDS};
use tsic_domain::{AuthType, IntegrationCredential, Result, TsicError};

use crate::ports::{CredentialRefresher, EventBusPort, RefreshedToken, StorePort, SyncEvent};

/// Keys the per-(user, service) refresh mutex set.
type RefreshKey = (String, String);

/// Orchestrates credential lookup, refresh, and invalidation for every
/// `(user_id, service_name)` pair. One instance is shared across the
/// whole process; refreshers are registered per service at construction.
pub struct CredentialService {
    store: Arc<dyn StorePort>,
    event_bus: Arc<dyn EventBusPort>,
    refreshers: HashMap<String, Arc<dyn CredentialRefresher>>,
    refresh_locks: Mutex<HashMap<RefreshKey, Arc<Mutex<()>>>>,
}

impl CredentialService {
    /// Create a service with one [`CredentialRefresher`] registered per
    /// service name (`calendar`, `issues`, `code`).
    pub fn new(
        store: Arc<dyn StorePort>,
        event_bus: Arc<dyn EventBusPort>,
        refreshers: HashMap<String, Arc<dyn CredentialRefresher>>,
    ) -> Self {
        Self { store, event_bus, refreshers, refresh_locks: Mutex::new(HashMap::new()) }
    }

    /// Return a valid access token for `(user_id, service)`, refreshing it
    /// first if fewer than [`TOKEN_REFRESH_THRESHOLD_SECONDS`] remain.
    /// Guarantees the returned token is valid for at least
    /// [`MIN_TOKEN_LIFETIME_GUARANTEE_SECONDS`].
    pub async fn get_access_token(&self, user_id: &str, service: &str) -> Result<String> {
        let credential = self
            .store
            .get_credential(user_id, service)
            .await?
            .ok_or_else(|| TsicError::CredentialMissing { service: service.to_string() })?;

        let remaining = credential.seconds_until_expiry(Utc::now());
        if remaining >= TOKEN_REFRESH_THRESHOLD_SECONDS {
            return Ok(credential.access_token);
        }

        let refreshed = self.refresh(user_id, service, credential).await?;
        if refreshed.seconds_until_expiry(Utc::now()) < MIN_TOKEN_LIFETIME_GUARANTEE_SECONDS {
            warn!(user_id, service, "refreshed token still below minimum lifetime guarantee");
        }
        Ok(refreshed.access_token)
    }

    /// Force a refresh regardless of remaining lifetime, for provider
    /// clients that received a 401 on a token `get_access_token` considered
    /// still valid. Called at most once per request by the caller.
    pub async fn force_refresh_access_token(&self, user_id: &str, service: &str) -> Result<String> {
        let credential = self
            .store
            .get_credential(user_id, service)
            .await?
            .ok_or_else(|| TsicError::CredentialMissing { service: service.to_string() })?;
        let refreshed = self.refresh(user_id, service, credential).await?;
        Ok(refreshed.access_token)
    }

    /// Force a refresh of `(user_id, service)`, serialized per key so two
    /// concurrent callers never double-refresh.
    async fn refresh(
        &self,
        user_id: &str,
        service: &str,
        credential: IntegrationCredential,
    ) -> Result<IntegrationCredential> {
        let key = (user_id.to_string(), service.to_string());
        let lock = {
            let mut locks = self.refresh_locks.lock().await;
            locks.entry(key).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
        };
        let _guard = lock.lock().await;

        // Re-read: another caller may have refreshed while we waited for the lock.
        let current = self
            .store
            .get_credential(user_id, service)
            .await?
            .ok_or_else(|| TsicError::CredentialMissing { service: service.to_string() })?;
        if current.seconds_until_expiry(Utc::now()) >= TOKEN_REFRESH_THRESHOLD_SECONDS {
            return Ok(current);
        }

        if current.metadata.auth_type() == AuthType::PersonalToken {
            return Ok(current);
        }

        let refresher = self
            .refreshers
            .get(service)
            .ok_or_else(|| TsicError::InternalInvariantViolated {
                message: format!("no credential refresher registered for service {service}"),
            })?;

        match self.do_refresh(refresher.as_ref(), &credential).await {
            Ok(refreshed) => self.apply_refresh(user_id, service, current, refreshed).await,
            Err(TsicError::CredentialInvalidated { service }) => {
                self.invalidate(user_id, &service).await
            }
            Err(err) => Err(err),
        }
    }

    /// Retry a transient refresh failure twice with 1s/2s backoff, per the
    /// failure semantics in the component design; a 401/invalid_grant is not
    /// retried at all.
    async fn do_refresh(
        &self,
        refresher: &dyn CredentialRefresher,
        credential: &IntegrationCredential,
    ) -> Result<RefreshedToken> {
        let refresh_token = credential.refresh_token.as_deref();
        let metadata = &credential.metadata;
        let config = RetryConfig::builder()
            .max_attempts(3)
            .linear_backoff(std::time::Duration::from_secs(1), std::time::Duration::from_secs(1))
            .no_jitter()
            .build()
            .map_err(|err| TsicError::InternalInvariantViolated { message: err.to_string() })?;

        let policy = policies::PredicateRetry::new(|err: &TsicError, _attempt: u32| {
            !matches!(err, TsicError::CredentialInvalidated { .. })
        });

        retry_with_policy(config, policy, || async {
            refresher.refresh(refresh_token, metadata).await.map_err(|err| match err {
                TsicError::CredentialInvalidated { .. } => err,
                other => TsicError::ProviderTransient {
                    provider: credential.service_name.clone(),
                    message: other.to_string(),
                },
            })
        })
        .await
        .map_err(|err| match err {
            RetryError::NonRetryable { source: TsicError::CredentialInvalidated { service } } => {
                TsicError::CredentialInvalidated { service }
            }
            RetryError::NonRetryable { source } => source,
            other => TsicError::CredentialRefreshFailed {
                service: credential.service_name.clone(),
                message: other.to_string(),
            },
        })
    }

    async fn apply_refresh(
        &self,
        user_id: &str,
        service: &str,
        mut current: IntegrationCredential,
        refreshed: RefreshedToken,
    ) -> Result<IntegrationCredential> {
        current.access_token = refreshed.access_token;
        if let Some(refresh_token) = refreshed.refresh_token {
            current.refresh_token = Some(refresh_token);
        }
        current.token_expires_at = Utc::now() + chrono::Duration::seconds(refreshed.expires_in_seconds);
        if let Some(metadata) = refreshed.metadata {
            current.metadata = metadata;
        }
        self.store.put_credential(current.clone()).await?;
        info!(user_id, service, "credential refreshed");
        Ok(current)
    }

    /// 401/invalid_grant, or a provider-wide 410 Gone: delete the row and
    /// tell dependents the service is disconnected.
    async fn invalidate(&self, user_id: &str, service: &str) -> Result<IntegrationCredential> {
        self.store.delete_credential(user_id, service).await?;
        self.event_bus.publish(SyncEvent::CredentialInvalidated {
            user_id: user_id.to_string(),
            service: service.to_string(),
        });
        warn!(user_id, service, "credential invalidated and deleted");
        Err(TsicError::CredentialInvalidated { service: service.to_string() })
    }

    /// Fetch the stored credential metadata for `(user_id, service)`, e.g.
    /// the issues provider's selected `site_id` or the code host's
    /// `installation_id`/`app_id`.
    pub async fn get_credential_metadata(
        &self,
        user_id: &str,
        service: &str,
    ) -> Result<tsic_domain::CredentialPayload> {
        let credential = self
            .store
            .get_credential(user_id, service)
            .await?
            .ok_or_else(|| TsicError::CredentialMissing { service: service.to_string() })?;
        Ok(credential.metadata)
    }

    /// Explicitly invalidate a credential after a provider call reports
    /// `410 Gone` (the referenced site no longer exists), independent of
    /// the refresh path.
    pub async fn invalidate_on_gone(&self, user_id: &str, service: &str) -> Result<()> {
        self.store.delete_credential(user_id, service).await?;
        self.event_bus.publish(SyncEvent::CredentialInvalidated {
            user_id: user_id.to_string(),
            service: service.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use tsic_domain::CredentialPayload;

    use super::*;
    use crate::ports::{MeetingFilter, UpdateFilter};

    struct FakeStore {
        credentials: StdMutex<HashMap<(String, String), IntegrationCredential>>,
    }

    #[async_trait]
    impl StorePort for FakeStore {
        async fn upsert_meeting(
            &self,
            _user_id: &str,
            meeting: tsic_domain::Meeting,
        ) -> Result<tsic_domain::Meeting> {
            Ok(meeting)
        }
        async fn update_meeting_transcript(
            &self,
            _user_id: &str,
            _external_meeting_id: &str,
            _transcript: &str,
            _copilot_notes: Option<&str>,
            _online_meeting_id: Option<&str>,
        ) -> Result<()> {
            Ok(())
        }
        async fn get_meeting(
            &self,
            _user_id: &str,
            _external_meeting_id: &str,
        ) -> Result<Option<tsic_domain::Meeting>> {
            Ok(None)
        }
        async fn list_meetings(
            &self,
            _user_id: &str,
            _filter: MeetingFilter,
        ) -> Result<Vec<tsic_domain::Meeting>> {
            Ok(vec![])
        }
        async fn upsert_update(
            &self,
            _user_id: &str,
            update: tsic_domain::Update,
        ) -> Result<tsic_domain::Update> {
            Ok(update)
        }
        async fn delete_updates_missing_from(
            &self,
            _user_id: &str,
            _update_type: tsic_domain::UpdateType,
            _window_start: chrono::DateTime<Utc>,
            _current_external_ids: &[String],
        ) -> Result<usize> {
            Ok(0)
        }
        async fn list_updates(
            &self,
            _user_id: &str,
            _filter: UpdateFilter,
        ) -> Result<Vec<tsic_domain::Update>> {
            Ok(vec![])
        }
        async fn upsert_context_reference(
            &self,
            _reference: tsic_domain::ContextReference,
        ) -> Result<()> {
            Ok(())
        }
        async fn get_credential(
            &self,
            user_id: &str,
            service: &str,
        ) -> Result<Option<IntegrationCredential>> {
            Ok(self.credentials.lock().unwrap().get(&(user_id.to_string(), service.to_string())).cloned())
        }
        async fn put_credential(&self, credential: IntegrationCredential) -> Result<()> {
            self.credentials
                .lock()
                .unwrap()
                .insert((credential.user_id.clone(), credential.service_name.clone()), credential);
            Ok(())
        }
        async fn delete_credential(&self, user_id: &str, service: &str) -> Result<()> {
            self.credentials.lock().unwrap().remove(&(user_id.to_string(), service.to_string()));
            Ok(())
        }
    }

    struct NoopEventBus;
    impl EventBusPort for NoopEventBus {
        fn subscribe(&self, _subscriber: Arc<dyn crate::ports::EventSubscriber>) -> crate::ports::SubscriptionId {
            crate::ports::SubscriptionId(0)
        }
        fn unsubscribe(&self, _id: crate::ports::SubscriptionId) {}
        fn publish(&self, _event: SyncEvent) {}
    }

    struct AlwaysRefreshes;
    #[async_trait]
    impl CredentialRefresher for AlwaysRefreshes {
        async fn refresh(
            &self,
            _refresh_token: Option<&str>,
            _metadata: &CredentialPayload,
        ) -> Result<RefreshedToken> {
            Ok(RefreshedToken {
                access_token: "new-token".into(),
                refresh_token: None,
                expires_in_seconds: 3600,
                metadata: None,
            })
        }
    }

    struct AlwaysInvalidates;
    #[async_trait]
    impl CredentialRefresher for AlwaysInvalidates {
        async fn refresh(
            &self,
            _refresh_token: Option<&str>,
            _metadata: &CredentialPayload,
        ) -> Result<RefreshedToken> {
            Err(TsicError::CredentialInvalidated { service: "issues".into() })
        }
    }

    fn expiring_credential(seconds_left: i64) -> IntegrationCredential {
        IntegrationCredential {
            user_id: "u1".into(),
            service_name: "issues".into(),
            access_token: "old-token".into(),
            refresh_token: Some("rt".into()),
            token_expires_at: Utc::now() + chrono::Duration::seconds(seconds_left),
            scopes: vec![],
            metadata: CredentialPayload::OauthSecret { site_id: Some("site-1".into()) },
            connected_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn returns_existing_token_when_not_near_expiry() {
        let store = Arc::new(FakeStore { credentials: StdMutex::new(HashMap::new()) });
        store.put_credential(expiring_credential(3600)).await.unwrap();
        let mut refreshers: HashMap<String, Arc<dyn CredentialRefresher>> = HashMap::new();
        refreshers.insert("issues".into(), Arc::new(AlwaysRefreshes));
        let service = CredentialService::new(store, Arc::new(NoopEventBus), refreshers);

        let token = service.get_access_token("u1", "issues").await.unwrap();
        assert_eq!(token, "old-token");
    }

    #[tokio::test]
    async fn refreshes_when_near_expiry() {
        let store = Arc::new(FakeStore { credentials: StdMutex::new(HashMap::new()) });
        store.put_credential(expiring_credential(60)).await.unwrap();
        let mut refreshers: HashMap<String, Arc<dyn CredentialRefresher>> = HashMap::new();
        refreshers.insert("issues".into(), Arc::new(AlwaysRefreshes));
        let service = CredentialService::new(store, Arc::new(NoopEventBus), refreshers);

        let token = service.get_access_token("u1", "issues").await.unwrap();
        assert_eq!(token, "new-token");
    }

    #[tokio::test]
    async fn invalidates_credential_on_unrecoverable_refresh_failure() {
        let store = Arc::new(FakeStore { credentials: StdMutex::new(HashMap::new()) });
        store.put_credential(expiring_credential(10)).await.unwrap();
        let mut refreshers: HashMap<String, Arc<dyn CredentialRefresher>> = HashMap::new();
        refreshers.insert("issues".into(), Arc::new(AlwaysInvalidates));
        let service = CredentialService::new(store.clone(), Arc::new(NoopEventBus), refreshers);

        let result = service.get_access_token("u1", "issues").await;
        assert!(matches!(result, Err(TsicError::CredentialInvalidated { .. })));
        assert!(store.get_credential("u1", "issues").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn personal_token_is_never_refreshed() {
        let mut credential = expiring_credential(10);
        credential.metadata = CredentialPayload::PersonalToken;
        let store = Arc::new(FakeStore { credentials: StdMutex::new(HashMap::new()) });
        store.put_credential(credential).await.unwrap();
        let refreshers: HashMap<String, Arc<dyn CredentialRefresher>> = HashMap::new();
        let service = CredentialService::new(store, Arc::new(NoopEventBus), refreshers);

        let token = service.get_access_token("u1", "issues").await.unwrap();
        assert_eq!(token, "old-token");
    }
}
