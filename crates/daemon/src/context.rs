//! Wires the library crates together: one `AppContext` built once at
//! startup and shared across every CLI subcommand.

use std::collections::HashMap;
use std::sync::Arc;

use tsic_common::auth::{OAuthClient, OAuthConfig};
use tsic_core::ports::{CredentialRefresher, EventBusPort};
use tsic_core::{
    ContextAssemblyService, CredentialService, MeetingIntelligenceService, TaskCodeIntelligenceService,
    TranscriptEngine,
};
use tsic_domain::constants::{SERVICE_CALENDAR, SERVICE_CODE, SERVICE_ISSUES};
use tsic_domain::{Config, Result, TsicError};
use tsic_infra::oauth::{AppInstallationRefresher, OAuthTokenRefresher};
use tsic_infra::{
    load, GitHubCodeHostProvider, GraphCalendarProvider, HttpClient, HttpCodeQueryAdapter, InProcessEventBus,
    JiraIssuesProvider, OpenAiLlmClient, SqliteStore, SyncOrchestrator,
};

/// Every long-lived collaborator the CLI subcommands need.
pub struct AppContext {
    pub config: Config,
    pub event_bus: Arc<dyn EventBusPort>,
    pub credential_service: Arc<CredentialService>,
    pub meeting_service: Arc<MeetingIntelligenceService>,
    pub task_code_service: Arc<TaskCodeIntelligenceService>,
    pub transcript_engine: Arc<TranscriptEngine>,
    pub context_service: Arc<ContextAssemblyService>,
    pub orchestrator: Arc<SyncOrchestrator>,
}

impl AppContext {
    /// Build every collaborator from `TSIC_*`/provider environment
    /// variables and the configured SQLite store.
    pub fn bootstrap() -> Result<Self> {
        let config = load()?;

        let store = Arc::new(SqliteStore::open(&config.database.path, config.database.pool_size)?);
        let event_bus: Arc<dyn EventBusPort> = Arc::new(InProcessEventBus::new());

        let http = HttpClient::new()?;
        let refreshers = build_refreshers(http.clone())?;
        let credential_service =
            Arc::new(CredentialService::new(store.clone(), event_bus.clone(), refreshers));

        let calendar = Arc::new(GraphCalendarProvider::new(http.clone(), credential_service.clone()));
        let issues = Arc::new(JiraIssuesProvider::new(http.clone(), credential_service.clone()));
        let code_host = Arc::new(GitHubCodeHostProvider::new(http.clone(), credential_service.clone()));

        let llm_api_key = env_var("TSIC_OPENAI_API_KEY")?;
        let llm_model = std::env::var("TSIC_OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let llm = Arc::new(OpenAiLlmClient::new(llm_api_key, llm_model)?);

        let code_query_endpoint = env_var("TSIC_CODE_QUERY_ENDPOINT")?;
        let code_query = Arc::new(HttpCodeQueryAdapter::new(http, code_query_endpoint));

        let meeting_service =
            Arc::new(MeetingIntelligenceService::new(store.clone(), calendar.clone(), llm.clone()));
        let task_code_service =
            Arc::new(TaskCodeIntelligenceService::new(store.clone(), issues, code_host));
        let transcript_engine = Arc::new(TranscriptEngine::new(
            store.clone(),
            calendar,
            event_bus.clone(),
            config.transcript.clone(),
        ));
        let context_service =
            Arc::new(ContextAssemblyService::new(store, code_query, llm, config.context.clone()));

        let orchestrator = Arc::new(SyncOrchestrator::new(
            meeting_service.clone(),
            task_code_service.clone(),
            transcript_engine.clone(),
            event_bus.clone(),
            config.sync.clone(),
        ));

        Ok(Self {
            config,
            event_bus,
            credential_service,
            meeting_service,
            task_code_service,
            transcript_engine,
            context_service,
            orchestrator,
        })
    }
}

/// One [`CredentialRefresher`] per provider service, keyed the way
/// [`CredentialService`] expects.
fn build_refreshers(http: HttpClient) -> Result<HashMap<String, Arc<dyn CredentialRefresher>>> {
    let mut refreshers: HashMap<String, Arc<dyn CredentialRefresher>> = HashMap::new();

    let calendar_oauth = OAuthClient::new(OAuthConfig {
        domain: env_var("TSIC_CALENDAR_OAUTH_DOMAIN")?,
        client_id: env_var("TSIC_CALENDAR_OAUTH_CLIENT_ID")?,
        redirect_uri: env_var("TSIC_CALENDAR_OAUTH_REDIRECT_URI")?,
        scopes: vec!["offline_access".to_string(), "Calendars.Read".to_string()],
        audience: None,
    });
    refreshers.insert(
        SERVICE_CALENDAR.to_string(),
        Arc::new(OAuthTokenRefresher::new(calendar_oauth, "microsoft_graph")),
    );

    let issues_oauth = OAuthClient::new(OAuthConfig {
        domain: env_var("TSIC_ISSUES_OAUTH_DOMAIN")?,
        client_id: env_var("TSIC_ISSUES_OAUTH_CLIENT_ID")?,
        redirect_uri: env_var("TSIC_ISSUES_OAUTH_REDIRECT_URI")?,
        scopes: vec!["offline_access".to_string(), "read:jira-work".to_string()],
        audience: None,
    });
    refreshers.insert(SERVICE_ISSUES.to_string(), Arc::new(OAuthTokenRefresher::new(issues_oauth, "jira")));

    let code_host_refresher = AppInstallationRefresher::new(
        http,
        env_var("TSIC_CODE_HOST_PRIVATE_KEY_PEM")?,
        env_var("TSIC_CODE_HOST_TOKEN_URL_TEMPLATE")?,
    );
    refreshers.insert(SERVICE_CODE.to_string(), Arc::new(code_host_refresher));

    Ok(refreshers)
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| TsicError::InternalInvariantViolated { message: format!("missing required environment variable: {key}") })
}
