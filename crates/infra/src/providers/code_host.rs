//! Code host provider client (C3.3), backed by the GitHub REST API.
//!
//! When `repo` is `None`, the relevant endpoint is queried once per
//! repository the installation can access (fetched via
//! `list_repositories`), since GitHub's PR/commit listings are always
//! scoped to a single repository.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use tsic_core::ports::{CodeHostProviderPort, ProviderCommit, ProviderPullRequest, ProviderRepository};
use tsic_core::CredentialService;
use tsic_domain::constants::SERVICE_CODE;
use tsic_domain::{Result, TsicError};

use super::send_authorized;
use crate::http::HttpClient;

const API_BASE: &str = "https://api.github.com";

/// GitHub-backed implementation of [`CodeHostProviderPort`].
pub struct GitHubCodeHostProvider {
    http: HttpClient,
    credential_service: Arc<CredentialService>,
}

impl GitHubCodeHostProvider {
    #[must_use]
    pub fn new(http: HttpClient, credential_service: Arc<CredentialService>) -> Self {
        Self { http, credential_service }
    }

    async fn send(
        &self,
        user_id: &str,
        build: impl Fn(&str) -> reqwest::RequestBuilder,
    ) -> Result<reqwest::Response> {
        send_authorized(&self.http, &self.credential_service, user_id, SERVICE_CODE, build).await
    }

    async fn target_repos(
        &self,
        user_id: &str,
        repo: Option<&ProviderRepository>,
    ) -> Result<Vec<ProviderRepository>> {
        match repo {
            Some(repo) => Ok(vec![repo.clone()]),
            None => self.list_repositories(user_id).await,
        }
    }
}

#[async_trait]
impl CodeHostProviderPort for GitHubCodeHostProvider {
    async fn list_pull_requests(
        &self,
        user_id: &str,
        repo: Option<&ProviderRepository>,
        since: DateTime<Utc>,
    ) -> Result<Vec<ProviderPullRequest>> {
        let repos = self.target_repos(user_id, repo).await?;
        let mut all = Vec::new();

        for repo in repos {
            let url = format!("{API_BASE}/repos/{}/{}/pulls", repo.owner, repo.name);
            let response = self
                .send(user_id, |token| {
                    self.http
                        .request(Method::GET, &url)
                        .bearer_auth(token)
                        .query(&[("state", "all"), ("sort", "updated"), ("direction", "desc")])
                })
                .await?;

            let prs: Vec<GitHubPullRequest> = parse_json(response).await?;
            for pr in prs {
                let updated = parse_instant(&pr.updated_at)?;
                if updated < since {
                    continue;
                }
                all.push(ProviderPullRequest {
                    id: pr.number.to_string(),
                    title: pr.title,
                    body: pr.body.unwrap_or_default(),
                    author: pr.user.map(|u| u.login),
                    state: pr.state,
                    merged_at: pr.merged_at.as_deref().map(parse_instant).transpose()?,
                    url: pr.html_url,
                    repo: format!("{}/{}", repo.owner, repo.name),
                });
            }
        }

        Ok(all)
    }

    async fn list_commits(
        &self,
        user_id: &str,
        repo: Option<&ProviderRepository>,
        since: DateTime<Utc>,
    ) -> Result<Vec<ProviderCommit>> {
        let repos = self.target_repos(user_id, repo).await?;
        let mut all = Vec::new();

        for repo in repos {
            let url = format!("{API_BASE}/repos/{}/{}/commits", repo.owner, repo.name);
            let since_str = since.to_rfc3339();
            let response = self
                .send(user_id, |token| {
                    self.http.request(Method::GET, &url).bearer_auth(token).query(&[("since", &since_str)])
                })
                .await?;

            let commits: Vec<GitHubCommit> = parse_json(response).await?;
            for commit in commits {
                all.push(ProviderCommit {
                    sha: commit.sha,
                    message: commit.commit.message,
                    author: commit.author.map(|a| a.login),
                    url: commit.html_url,
                    repo: format!("{}/{}", repo.owner, repo.name),
                    timestamp: parse_instant(&commit.commit.author.date)?,
                });
            }
        }

        Ok(all)
    }

    async fn list_repositories(&self, user_id: &str) -> Result<Vec<ProviderRepository>> {
        let url = format!("{API_BASE}/installation/repositories");
        let response = self
            .send(user_id, |token| self.http.request(Method::GET, &url).bearer_auth(token))
            .await?;

        let body: GitHubInstallationRepositories = parse_json(response).await?;
        Ok(body
            .repositories
            .into_iter()
            .map(|r| ProviderRepository { owner: r.owner.login, name: r.name })
            .collect())
    }
}

async fn parse_json<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> Result<T> {
    response.json().await.map_err(|e| TsicError::ParseFailure {
        what: "github provider response".into(),
        message: e.to_string(),
    })
}

fn parse_instant(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| TsicError::ParseFailure { what: "github timestamp".into(), message: e.to_string() })
}

#[derive(Debug, Deserialize)]
struct GitHubPullRequest {
    number: i64,
    title: String,
    body: Option<String>,
    user: Option<GitHubUser>,
    state: String,
    merged_at: Option<String>,
    html_url: String,
    updated_at: String,
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct GitHubCommit {
    sha: String,
    commit: GitHubCommitDetail,
    author: Option<GitHubUser>,
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct GitHubCommitDetail {
    message: String,
    author: GitHubCommitAuthor,
}

#[derive(Debug, Deserialize)]
struct GitHubCommitAuthor {
    date: String,
}

#[derive(Debug, Deserialize)]
struct GitHubInstallationRepositories {
    repositories: Vec<GitHubRepository>,
}

#[derive(Debug, Deserialize)]
struct GitHubRepository {
    name: String,
    owner: GitHubUser,
}
