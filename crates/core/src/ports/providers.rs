//! Provider client ports (C3): calendar, issues, and code host. Each
//! concrete implementation in `tsic-infra` calls
//! [`crate::services::credential::CredentialService::get_access_token`]
//! for a token and retries once on 401 after forcing a refresh.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tsic_domain::Result;

/// One attendee as returned by the calendar provider.
#[derive(Debug, Clone)]
pub struct CalendarAttendee {
    pub name: Option<String>,
    pub email: String,
}

/// An online-meeting reference embedded in a calendar event.
#[derive(Debug, Clone)]
pub struct OnlineMeetingRef {
    pub id: Option<String>,
    pub join_url: Option<String>,
}

/// A calendar event in provider-local time (never UTC-coerced).
#[derive(Debug, Clone)]
pub struct CalendarEvent {
    pub id: String,
    pub subject: String,
    pub start_naive: chrono::NaiveDateTime,
    pub start_timezone: String,
    pub end_naive: chrono::NaiveDateTime,
    pub end_timezone: String,
    pub location: Option<String>,
    pub url: Option<String>,
    pub attendees: Vec<CalendarAttendee>,
    pub is_online_meeting: bool,
    pub is_recurring: bool,
    pub online_meeting: Option<OnlineMeetingRef>,
}

/// A transcript artifact listed for an online meeting.
#[derive(Debug, Clone)]
pub struct TranscriptHandle {
    pub transcript_id: String,
    pub created_at: DateTime<Utc>,
}

/// A file-provider search hit, considered as a transcript fallback source.
#[derive(Debug, Clone)]
pub struct FileMetadata {
    pub file_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Calendar client (C3.1).
#[async_trait]
pub trait CalendarProviderPort: Send + Sync {
    /// List events in `[window_start, window_end)`, in provider-local time.
    async fn list_events(
        &self,
        user_id: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>>;

    /// Fetch one event, including its `online_meeting` object.
    async fn get_event(&self, user_id: &str, event_id: &str) -> Result<CalendarEvent>;

    /// List transcripts recorded against an online meeting.
    async fn list_transcripts(
        &self,
        user_id: &str,
        online_meeting_id: &str,
    ) -> Result<Vec<TranscriptHandle>>;

    /// Fetch transcript text content. `format` is a MIME type hint, e.g. `text/vtt`.
    async fn fetch_transcript_content(
        &self,
        user_id: &str,
        online_meeting_id: &str,
        transcript_id: &str,
        format: &str,
    ) -> Result<String>;

    /// Search the file provider (fallback transcript source).
    async fn search_files(
        &self,
        user_id: &str,
        query: &str,
        folder: Option<&str>,
    ) -> Result<Vec<FileMetadata>>;

    /// Download file bytes by id.
    async fn download_file(&self, user_id: &str, file_id: &str) -> Result<Vec<u8>>;
}

/// An issue as returned by the issues provider, description already
/// flattened from rich text to plain text.
#[derive(Debug, Clone)]
pub struct ProviderIssue {
    pub key: String,
    pub summary: String,
    pub description: String,
    pub status: String,
    pub priority: Option<String>,
    pub assignee: Option<String>,
    pub project: String,
    pub updated: DateTime<Utc>,
    pub created: DateTime<Utc>,
}

/// Issues client (C3.2).
#[async_trait]
pub trait IssuesProviderPort: Send + Sync {
    /// Run `jql_expression` against the provider's search endpoint.
    async fn search_issues(
        &self,
        user_id: &str,
        jql_expression: &str,
        max_results: usize,
    ) -> Result<Vec<ProviderIssue>>;

    /// Issues updated within the last `window_days` days.
    async fn list_recent_updates(&self, user_id: &str, window_days: i64) -> Result<Vec<ProviderIssue>>;
}

/// A pull request as returned by the code host.
#[derive(Debug, Clone)]
pub struct ProviderPullRequest {
    pub id: String,
    pub title: String,
    pub body: String,
    pub author: Option<String>,
    pub state: String,
    pub merged_at: Option<DateTime<Utc>>,
    pub url: String,
    pub repo: String,
}

/// A commit as returned by the code host.
#[derive(Debug, Clone)]
pub struct ProviderCommit {
    pub sha: String,
    pub message: String,
    pub author: Option<String>,
    pub url: String,
    pub repo: String,
    pub timestamp: DateTime<Utc>,
}

/// A repository the current credential can access.
#[derive(Debug, Clone)]
pub struct ProviderRepository {
    pub owner: String,
    pub name: String,
}

/// Code host client (C3.3).
#[async_trait]
pub trait CodeHostProviderPort: Send + Sync {
    /// List PRs updated since `since`, optionally scoped to one repo.
    async fn list_pull_requests(
        &self,
        user_id: &str,
        repo: Option<&ProviderRepository>,
        since: DateTime<Utc>,
    ) -> Result<Vec<ProviderPullRequest>>;

    /// List commits since `since`, optionally scoped to one repo.
    async fn list_commits(
        &self,
        user_id: &str,
        repo: Option<&ProviderRepository>,
        since: DateTime<Utc>,
    ) -> Result<Vec<ProviderCommit>>;

    /// List repositories reachable by the current credential.
    async fn list_repositories(&self, user_id: &str) -> Result<Vec<ProviderRepository>>;
}
