//! Issues provider client (C3.2), backed by Jira Cloud.
//!
//! Every call is scoped to the site the credential's client-secret OAuth
//! flow resolved at connect time (`CredentialPayload::OauthSecret::site_id`),
//! per the accessible-resources lookup Jira's OAuth flow requires.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use tsic_core::ports::{IssuesProviderPort, ProviderIssue};
use tsic_core::CredentialService;
use tsic_domain::constants::SERVICE_ISSUES;
use tsic_domain::{CredentialPayload, Result, TsicError};

use super::send_authorized;
use crate::http::HttpClient;

const API_BASE: &str = "https://api.atlassian.com/ex/jira";

/// Jira Cloud-backed implementation of [`IssuesProviderPort`].
pub struct JiraIssuesProvider {
    http: HttpClient,
    credential_service: Arc<CredentialService>,
}

impl JiraIssuesProvider {
    #[must_use]
    pub fn new(http: HttpClient, credential_service: Arc<CredentialService>) -> Self {
        Self { http, credential_service }
    }

    async fn site_id(&self, user_id: &str) -> Result<String> {
        match self.credential_service.get_credential_metadata(user_id, SERVICE_ISSUES).await? {
            CredentialPayload::OauthSecret { site_id: Some(site_id) } => Ok(site_id),
            CredentialPayload::OauthSecret { site_id: None } => {
                Err(TsicError::InternalInvariantViolated {
                    message: "issues credential has no site_id selected".into(),
                })
            }
            _ => Err(TsicError::InternalInvariantViolated {
                message: "issues credential is not an oauth_secret credential".into(),
            }),
        }
    }

    async fn search(&self, user_id: &str, jql: &str, max_results: usize) -> Result<Vec<ProviderIssue>> {
        let site_id = self.site_id(user_id).await?;
        let url = format!("{API_BASE}/{site_id}/rest/api/3/search");
        let fields = "summary,description,status,priority,assignee,project,updated,created";
        let body = serde_json::json!({
            "jql": jql,
            "maxResults": max_results,
            "fields": fields.split(',').collect::<Vec<_>>(),
        });

        let response = send_authorized(&self.http, &self.credential_service, user_id, SERVICE_ISSUES, |token| {
            self.http.request(Method::POST, &url).bearer_auth(token).json(&body)
        })
        .await?;

        if response.status() == reqwest::StatusCode::GONE {
            self.credential_service.invalidate_on_gone(user_id, SERVICE_ISSUES).await?;
            return Err(TsicError::CredentialInvalidated { service: SERVICE_ISSUES.to_string() });
        }

        let parsed: JiraSearchResponse = response.json().await.map_err(|e| TsicError::ParseFailure {
            what: "jira search response".into(),
            message: e.to_string(),
        })?;

        parsed.issues.into_iter().map(convert_issue).collect()
    }
}

#[async_trait]
impl IssuesProviderPort for JiraIssuesProvider {
    async fn search_issues(
        &self,
        user_id: &str,
        jql_expression: &str,
        max_results: usize,
    ) -> Result<Vec<ProviderIssue>> {
        self.search(user_id, jql_expression, max_results).await
    }

    async fn list_recent_updates(&self, user_id: &str, window_days: i64) -> Result<Vec<ProviderIssue>> {
        let jql = format!("updated >= -{window_days}d ORDER BY updated DESC");
        self.search(user_id, &jql, 200).await
    }
}

fn convert_issue(raw: JiraIssue) -> Result<ProviderIssue> {
    let updated = parse_instant(&raw.fields.updated)?;
    let created = parse_instant(&raw.fields.created)?;

    Ok(ProviderIssue {
        key: raw.key,
        summary: raw.fields.summary,
        description: flatten_adf(raw.fields.description.as_ref()),
        status: raw.fields.status.name,
        priority: raw.fields.priority.map(|p| p.name),
        assignee: raw.fields.assignee.map(|a| a.display_name),
        project: raw.fields.project.key,
        updated,
        created,
    })
}

fn parse_instant(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| TsicError::ParseFailure { what: "jira timestamp".into(), message: e.to_string() })
}

/// Flatten Jira's Atlassian Document Format description to plain text,
/// concatenating every `text` node found in the tree.
fn flatten_adf(doc: Option<&serde_json::Value>) -> String {
    let mut out = String::new();
    if let Some(doc) = doc {
        collect_text(doc, &mut out);
    }
    out.trim().to_string()
}

fn collect_text(node: &serde_json::Value, out: &mut String) {
    if let Some(text) = node.get("text").and_then(|v| v.as_str()) {
        out.push_str(text);
        out.push(' ');
    }
    if let Some(content) = node.get("content").and_then(|v| v.as_array()) {
        for child in content {
            collect_text(child, out);
        }
    }
}

#[derive(Debug, Deserialize)]
struct JiraSearchResponse {
    issues: Vec<JiraIssue>,
}

#[derive(Debug, Deserialize)]
struct JiraIssue {
    key: String,
    fields: JiraIssueFields,
}

#[derive(Debug, Deserialize)]
struct JiraIssueFields {
    summary: String,
    description: Option<serde_json::Value>,
    status: JiraStatus,
    priority: Option<JiraPriority>,
    assignee: Option<JiraUser>,
    project: JiraProject,
    updated: String,
    created: String,
}

#[derive(Debug, Deserialize)]
struct JiraStatus {
    name: String,
}

#[derive(Debug, Deserialize)]
struct JiraPriority {
    name: String,
}

#[derive(Debug, Deserialize)]
struct JiraUser {
    #[serde(rename = "displayName")]
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct JiraProject {
    key: String,
}
