//! Update entity: normalized issue/code activity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of external activity an update row represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateType {
    IssueCreated,
    IssueUpdated,
    IssueComment,
    CodePr,
    CodeCommit,
}

impl UpdateType {
    /// String form used as the `update_type` store column value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IssueCreated => "issue_created",
            Self::IssueUpdated => "issue_updated",
            Self::IssueComment => "issue_comment",
            Self::CodePr => "code_pr",
            Self::CodeCommit => "code_commit",
        }
    }

    /// Whether this update type participates in issue dynamic-deletion
    /// reconciliation.
    #[must_use]
    pub fn is_issue_kind(self) -> bool {
        matches!(self, Self::IssueCreated | Self::IssueUpdated)
    }
}

/// A normalized issue-tracker or code-host activity row.
///
/// Identity: `(user_id, update_type, external_id)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    /// Owning user.
    pub user_id: String,
    /// Kind of activity.
    pub update_type: UpdateType,
    /// Provider-assigned identifier (issue key, PR id, commit sha, ...).
    pub external_id: String,
    /// Title/summary.
    pub title: String,
    /// Plain-text description (rich text already flattened by the provider client).
    pub description: String,
    /// Denormalized search blob; regenerated on every upsert.
    pub content_text: String,
    /// Author/assignee display name.
    pub author: Option<String>,
    /// Workflow status, if applicable.
    pub status: Option<String>,
    /// Priority, if applicable.
    pub priority: Option<String>,
    /// Owning project/repo name.
    pub project: Option<String>,
    /// Back-reference to a meeting this update was discussed in, if known.
    pub linked_meeting_id: Option<String>,
    /// Issue keys extracted from commit/PR messages that reference this row
    /// (or that this row's own message references).
    pub linked_external_keys: Vec<String>,
    /// Provider deep link.
    pub url: Option<String>,
    /// Additive metadata bag.
    pub metadata: serde_json::Map<String, serde_json::Value>,
    /// Row creation instant.
    pub created_at: DateTime<Utc>,
    /// Provider-reported last-modified instant.
    pub updated_at: DateTime<Utc>,
}

impl Update {
    /// Regenerate `content_text` from the fields it is defined to concatenate:
    /// title, description, status, and priority (when present).
    pub fn regenerate_content_text(&mut self) {
        let mut parts = vec![self.title.clone(), self.description.clone()];
        if let Some(status) = &self.status {
            parts.push(status.clone());
        }
        if let Some(priority) = &self.priority {
            parts.push(priority.clone());
        }
        if let Some(project) = &self.project {
            parts.push(project.clone());
        }
        self.content_text = parts.join(" ");
    }
}
