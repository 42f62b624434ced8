//! Store port (C1): typed CRUD and idempotent upsert over the four
//! persisted entities. Every other component reaches persistence only
//! through this trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tsic_domain::{ContextReference, IntegrationCredential, Meeting, Result, Update, UpdateType};

/// Filter for `list_meetings`.
#[derive(Debug, Clone, Default)]
pub struct MeetingFilter {
    /// Restrict to these `external_meeting_id`s, if given.
    pub ids: Option<Vec<String>>,
    /// Restrict to meetings starting within this range.
    pub time_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    /// Restrict to `is_important = true` rows only.
    pub is_important: Option<bool>,
    /// Max rows to return, newest-start-first.
    pub limit: Option<usize>,
}

/// Filter for `list_updates`.
#[derive(Debug, Clone, Default)]
pub struct UpdateFilter {
    /// Restrict to these `external_id`s, if given.
    pub ids: Option<Vec<String>>,
    /// Restrict to these update types, if given.
    pub types: Option<Vec<UpdateType>>,
    /// Restrict to rows with `updated_at` in this range.
    pub window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    /// Case-insensitive substring match over `content_text`.
    pub content_contains: Option<String>,
    /// Max rows to return, newest-`updated_at`-first.
    pub limit: Option<usize>,
}

/// The persistence boundary. One implementation (`tsic-infra`'s SQLite
/// adapter) in production; an in-memory fake in tests.
#[async_trait]
pub trait StorePort: Send + Sync {
    /// Create or update the row identified by `(user_id, meeting.external_meeting_id)`.
    /// Manual-flag-preservation fields are read-modify-write merged: an
    /// existing non-null value always wins over an incoming null/default.
    /// Returns the merged row as persisted.
    async fn upsert_meeting(&self, user_id: &str, meeting: Meeting) -> Result<Meeting>;

    /// Write only transcript-shaped fields, leaving every user-authored
    /// field untouched. `online_meeting_id` and `copilot_notes` are
    /// optional partial updates.
    async fn update_meeting_transcript(
        &self,
        user_id: &str,
        external_meeting_id: &str,
        transcript: &str,
        copilot_notes: Option<&str>,
        online_meeting_id: Option<&str>,
    ) -> Result<()>;

    /// Fetch one meeting by its natural key, if present.
    async fn get_meeting(&self, user_id: &str, external_meeting_id: &str) -> Result<Option<Meeting>>;

    /// List meetings for a user matching `filter`.
    async fn list_meetings(&self, user_id: &str, filter: MeetingFilter) -> Result<Vec<Meeting>>;

    /// Create or update the row identified by `(user_id, update.update_type, update.external_id)`.
    /// `content_text` is always regenerated from the incoming row before
    /// the write, per the denormalized-search-blob invariant.
    async fn upsert_update(&self, user_id: &str, update: Update) -> Result<Update>;

    /// Delete rows matching `update_type`, with `updated_at >= window_start`,
    /// whose `external_id` is not in `current_external_ids`. Returns the
    /// number of rows deleted. Used by C6's dynamic deletion reconciliation.
    async fn delete_updates_missing_from(
        &self,
        user_id: &str,
        update_type: UpdateType,
        window_start: DateTime<Utc>,
        current_external_ids: &[String],
    ) -> Result<usize>;

    /// List updates for a user matching `filter`.
    async fn list_updates(&self, user_id: &str, filter: UpdateFilter) -> Result<Vec<Update>>;

    /// Record (or refresh) a context cross-reference hint.
    async fn upsert_context_reference(&self, reference: ContextReference) -> Result<()>;

    /// Fetch a credential row, if present.
    async fn get_credential(
        &self,
        user_id: &str,
        service: &str,
    ) -> Result<Option<IntegrationCredential>>;

    /// Create or replace a credential row.
    async fn put_credential(&self, credential: IntegrationCredential) -> Result<()>;

    /// Delete a credential row. A no-op (not an error) if absent.
    async fn delete_credential(&self, user_id: &str, service: &str) -> Result<()>;
}
