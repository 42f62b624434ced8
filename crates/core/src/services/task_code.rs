//! Task/Code Intelligence service (C6): issue and code-activity
//! ingestion, dynamic deletion reconciliation, and issue-key linking
//! between commit/PR messages and issue updates.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, warn};
use tsic_domain::utils::extract_issue_keys;
use tsic_domain::{Result, Update, UpdateType};

use crate::ports::{CodeHostProviderPort, IssuesProviderPort, ProviderIssue, StorePort};

/// C6: issue-tracker and code-host ingestion.
pub struct TaskCodeIntelligenceService {
    store: Arc<dyn StorePort>,
    issues: Arc<dyn IssuesProviderPort>,
    code_host: Arc<dyn CodeHostProviderPort>,
}

impl TaskCodeIntelligenceService {
    pub fn new(
        store: Arc<dyn StorePort>,
        issues: Arc<dyn IssuesProviderPort>,
        code_host: Arc<dyn CodeHostProviderPort>,
    ) -> Self {
        Self { store, issues, code_host }
    }

    /// Ingest issues updated within `window_days`, then delete rows for
    /// issues no longer present in the provider response for the same
    /// window. A reconciliation failure is logged and swallowed — it must
    /// never abort the sync cycle.
    pub async fn ingest_issues(&self, user_id: &str, window_days: i64) -> Result<usize> {
        let issues = self.issues.list_recent_updates(user_id, window_days).await?;
        let window_start = Utc::now() - chrono::Duration::days(window_days);
        let mut seen = HashSet::with_capacity(issues.len());

        for issue in &issues {
            let update_type = if self.is_first_sighting(user_id, &issue.key).await? {
                UpdateType::IssueCreated
            } else {
                UpdateType::IssueUpdated
            };
            self.store.upsert_update(user_id, Self::issue_to_update(issue, update_type)).await?;
            seen.insert(issue.key.clone());
        }

        let current_ids: Vec<String> = seen.into_iter().collect();
        for update_type in [UpdateType::IssueCreated, UpdateType::IssueUpdated] {
            if let Err(err) = self
                .store
                .delete_updates_missing_from(user_id, update_type, window_start, &current_ids)
                .await
            {
                warn!(user_id, update_type = update_type.as_str(), error = %err, "issue reconciliation failed, skipping");
            }
        }

        Ok(issues.len())
    }

    async fn is_first_sighting(&self, user_id: &str, issue_key: &str) -> Result<bool> {
        let existing = self
            .store
            .list_updates(
                user_id,
                crate::ports::UpdateFilter {
                    ids: Some(vec![issue_key.to_string()]),
                    ..Default::default()
                },
            )
            .await?;
        Ok(existing.is_empty())
    }

    fn issue_to_update(issue: &ProviderIssue, update_type: UpdateType) -> Update {
        let mut update = Update {
            user_id: String::new(),
            update_type,
            external_id: issue.key.clone(),
            title: issue.summary.clone(),
            description: issue.description.clone(),
            content_text: String::new(),
            author: issue.assignee.clone(),
            status: Some(issue.status.clone()),
            priority: issue.priority.clone(),
            project: Some(issue.project.clone()),
            linked_meeting_id: None,
            linked_external_keys: vec![],
            url: None,
            metadata: serde_json::Map::new(),
            created_at: issue.created,
            updated_at: issue.updated,
        };
        update.regenerate_content_text();
        update
    }

    /// Ingest PRs and commits since `window_start`; extract issue keys from
    /// every message and back-link matching issue updates.
    pub async fn ingest_code(&self, user_id: &str, window_start: DateTime<Utc>) -> Result<usize> {
        let prs = self.code_host.list_pull_requests(user_id, None, window_start).await?;
        let commits = self.code_host.list_commits(user_id, None, window_start).await?;
        let total = prs.len() + commits.len();

        for pr in prs {
            self.ingest_code_item(user_id, UpdateType::CodePr, pr.id.clone(), pr.title.clone(), pr.body.clone(), pr.url.clone(), pr.author.clone()).await?;
        }
        for commit in commits {
            self.ingest_code_item(
                user_id,
                UpdateType::CodeCommit,
                commit.sha.clone(),
                commit.message.clone(),
                commit.message.clone(),
                commit.url.clone(),
                commit.author.clone(),
            )
            .await?;
        }

        Ok(total)
    }

    #[allow(clippy::too_many_arguments)]
    async fn ingest_code_item(
        &self,
        user_id: &str,
        update_type: UpdateType,
        external_id: String,
        title: String,
        message_text: String,
        url: String,
        author: Option<String>,
    ) -> Result<()> {
        let linked_keys = extract_issue_keys(&message_text);
        let now = Utc::now();
        let mut update = Update {
            user_id: String::new(),
            update_type,
            external_id,
            title,
            description: message_text,
            content_text: String::new(),
            author,
            status: None,
            priority: None,
            project: None,
            linked_meeting_id: None,
            linked_external_keys: linked_keys.clone(),
            url: Some(url),
            metadata: serde_json::Map::new(),
            created_at: now,
            updated_at: now,
        };
        update.regenerate_content_text();
        self.store.upsert_update(user_id, update).await?;

        for key in linked_keys {
            if let Err(err) = self.link_back_reference(user_id, &key).await {
                error!(user_id, issue_key = %key, error = %err, "failed to set back-reference, continuing");
            }
        }

        Ok(())
    }

    /// If `issue_key` matches an existing issue update, record the
    /// back-reference so the issue knows this code item mentions it.
    async fn link_back_reference(&self, user_id: &str, issue_key: &str) -> Result<()> {
        let matches = self
            .store
            .list_updates(
                user_id,
                crate::ports::UpdateFilter { ids: Some(vec![issue_key.to_string()]), ..Default::default() },
            )
            .await?;

        for mut existing in matches {
            if !existing.linked_external_keys.contains(&issue_key.to_string()) {
                existing.linked_external_keys.push(issue_key.to_string());
                self.store.upsert_update(user_id, existing).await?;
            }
        }
        Ok(())
    }
}
