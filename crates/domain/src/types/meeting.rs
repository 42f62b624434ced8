//! Meeting entity.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A meeting attendee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    /// Display name, if known.
    pub name: Option<String>,
    /// Email address.
    pub email: String,
}

/// A single action item extracted from a summary or transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    /// What needs to be done.
    pub task: String,
    /// Who owns it, if identified.
    pub owner: Option<String>,
    /// Due date, if stated, as an opaque string (provider/LLM phrasing varies).
    pub due: Option<String>,
}

/// Opaque, additive metadata bag. Carries fields C4 and C5 produce that have
/// no first-class column: `online_meeting_id`, `transcript`, `transcript_id`,
/// `transcript_fetched_at`, `platform`, and any fallback-source provenance.
pub type MeetingMetadata = serde_json::Map<String, serde_json::Value>;

/// A calendar meeting, enriched over time by meeting intelligence and
/// transcript acquisition.
///
/// Identity: `(user_id, external_meeting_id)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    /// Owning user.
    pub user_id: String,
    /// Provider-assigned event id.
    pub external_meeting_id: String,
    /// Meeting title/subject.
    pub title: String,
    /// Naive local start timestamp; interpret using `start_timezone`.
    pub start_time: NaiveDateTime,
    /// Naive local end timestamp; interpret using `end_timezone`.
    pub end_time: NaiveDateTime,
    /// IANA timezone name the start timestamp is expressed in.
    pub start_timezone: String,
    /// IANA timezone name the end timestamp is expressed in.
    pub end_timezone: String,
    /// Physical location, if any.
    pub location: Option<String>,
    /// Event URL (provider deep link).
    pub url: Option<String>,
    /// Ordered attendee list.
    pub attendees: Vec<Attendee>,
    /// User-authored flag; never overwritten by re-ingestion once set.
    pub is_important: bool,
    /// 0-100 heuristic score; computed once on first ingestion, never again.
    pub importance_score: i32,
    /// User-authored free text; never overwritten by re-ingestion once set.
    pub manual_notes: Option<String>,
    /// LLM-generated summary; never overwritten by re-ingestion once set.
    pub ai_summary: Option<String>,
    /// LLM-extracted decisions; never overwritten by re-ingestion once set.
    pub key_decisions: Vec<String>,
    /// LLM-extracted action items; never overwritten by re-ingestion once set.
    pub action_items: Vec<ActionItem>,
    /// Provider-generated recap notes, distinct from a transcript.
    pub copilot_notes: Option<String>,
    /// Additive metadata bag (online meeting id, transcript fields, ...).
    pub metadata: MeetingMetadata,
    /// Row creation instant.
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Row last-modified instant.
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Meeting {
    /// Whether this meeting already carries transcript content.
    #[must_use]
    pub fn has_transcript(&self) -> bool {
        self.metadata.get("transcript").and_then(|v| v.as_str()).is_some_and(|s| !s.is_empty())
    }

    /// The resolved online-meeting id, if known.
    #[must_use]
    pub fn online_meeting_id(&self) -> Option<&str> {
        self.metadata.get("online_meeting_id").and_then(|v| v.as_str())
    }

    /// Clamp a raw importance score into the valid `[0, 100]` range.
    #[must_use]
    pub fn clamp_importance_score(raw: i32) -> i32 {
        raw.clamp(0, 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_importance_score_bounds_both_directions() {
        assert_eq!(Meeting::clamp_importance_score(-10), 0);
        assert_eq!(Meeting::clamp_importance_score(150), 100);
        assert_eq!(Meeting::clamp_importance_score(42), 42);
    }
}
