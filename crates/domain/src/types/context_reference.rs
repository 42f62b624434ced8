//! Context reference: a denormalized search hint linking a meeting to an
//! update when an issue key appears in the meeting's notes or a related
//! commit message. Optional — the system functions without this index,
//! it only accelerates cross-referencing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A per-user meeting<->update cross-reference hint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextReference {
    /// Owning user.
    pub user_id: String,
    /// Referenced meeting's `external_meeting_id`.
    pub meeting_external_id: String,
    /// Referenced update's `external_id`.
    pub update_external_id: String,
    /// The issue key that produced this link.
    pub issue_key: String,
    /// When this link was recorded.
    pub created_at: DateTime<Utc>,
}
