//! Meeting Intelligence service (C5): calendar ingestion, one-time
//! importance scoring, and LLM-backed summary generation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;
use tsic_domain::utils::score_new_meeting;
use tsic_domain::{ActionItem, Meeting, MeetingMetadata, Result};

use crate::ports::{CalendarEvent, CalendarProviderPort, LlmMessage, LlmPort, LlmRole, StorePort};

/// Structured shape requested from the LLM for summary generation.
#[derive(Debug, Deserialize)]
struct SummaryResponse {
    summary: String,
    #[serde(default)]
    key_decisions: Vec<String>,
    #[serde(default)]
    action_items: Vec<ActionItem>,
    #[serde(default)]
    #[allow(dead_code)]
    topics: Vec<String>,
}

/// Outcome of one meeting-ingestion pass, consumed by the orchestrator to
/// decide which meetings to hand to the transcript engine.
#[derive(Debug, Clone)]
pub struct IngestedMeeting {
    pub meeting: Meeting,
    /// `true` only for rows that did not previously exist (and therefore
    /// received a freshly computed importance score).
    pub newly_inserted: bool,
}

/// C5: meeting ingestion, importance scoring, and summary generation.
pub struct MeetingIntelligenceService {
    store: Arc<dyn StorePort>,
    calendar: Arc<dyn CalendarProviderPort>,
    llm: Arc<dyn LlmPort>,
}

impl MeetingIntelligenceService {
    pub fn new(
        store: Arc<dyn StorePort>,
        calendar: Arc<dyn CalendarProviderPort>,
        llm: Arc<dyn LlmPort>,
    ) -> Self {
        Self { store, calendar, llm }
    }

    /// List events in `[window_start, window_end)` and upsert each,
    /// preserving manual fields and scoring importance only for rows that
    /// did not already exist.
    pub async fn ingest_window(
        &self,
        user_id: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<IngestedMeeting>> {
        let events = self.calendar.list_events(user_id, window_start, window_end).await?;
        let mut ingested = Vec::with_capacity(events.len());

        for event in events {
            let existed_before =
                self.store.get_meeting(user_id, &event.id).await?.is_some();
            let draft = self.event_to_new_meeting(&event);
            let merged = self.store.upsert_meeting(user_id, draft).await?;

            if !existed_before {
                self.score_new_meeting_in_place(user_id, &merged, &event).await?;
            }

            ingested.push(IngestedMeeting {
                meeting: self.store.get_meeting(user_id, &event.id).await?.unwrap_or(merged),
                newly_inserted: !existed_before,
            });
        }

        Ok(ingested)
    }

    fn event_to_new_meeting(&self, event: &CalendarEvent) -> Meeting {
        let mut metadata = MeetingMetadata::new();
        if let Some(online_meeting) = &event.online_meeting {
            if let Some(id) = &online_meeting.id {
                metadata.insert("online_meeting_id".into(), serde_json::Value::String(id.clone()));
            }
        }

        let now = Utc::now();
        Meeting {
            user_id: String::new(), // set by the store on upsert keying
            external_meeting_id: event.id.clone(),
            title: event.subject.clone(),
            start_time: event.start_naive,
            end_time: event.end_naive,
            start_timezone: event.start_timezone.clone(),
            end_timezone: event.end_timezone.clone(),
            location: event.location.clone(),
            url: event.url.clone(),
            attendees: event
                .attendees
                .iter()
                .map(|a| tsic_domain::Attendee { name: a.name.clone(), email: a.email.clone() })
                .collect(),
            is_important: false,
            importance_score: 50,
            manual_notes: None,
            ai_summary: None,
            key_decisions: vec![],
            action_items: vec![],
            copilot_notes: None,
            metadata,
            created_at: now,
            updated_at: now,
        }
    }

    /// Compute and persist the importance score for a meeting seen for the
    /// first time this cycle. Never invoked for a pre-existing row.
    async fn score_new_meeting_in_place(
        &self,
        user_id: &str,
        merged: &Meeting,
        event: &CalendarEvent,
    ) -> Result<()> {
        let score = score_new_meeting(tsic_domain::utils::importance::MeetingScoringInput {
            title: &merged.title,
            attendee_count: merged.attendees.len(),
            is_recurring: event.is_recurring,
            has_online_meeting: event.is_online_meeting,
        });

        let mut scored = merged.clone();
        scored.importance_score = score;
        scored.is_important = score >= 70;
        self.store.upsert_meeting(user_id, scored).await?;
        Ok(())
    }

    /// Generate `ai_summary`/`key_decisions`/`action_items` from transcript
    /// or notes text, only called when `copilot_notes` is absent. Parse
    /// failures degrade to storing the raw LLM text as `ai_summary`.
    pub async fn generate_summary(
        &self,
        user_id: &str,
        external_meeting_id: &str,
        notes_or_transcript: &str,
    ) -> Result<()> {
        let prompt = format!(
            "Summarize this meeting content and respond with a JSON object of the form \
             {{\"summary\": string, \"key_decisions\": [string], \
             \"action_items\": [{{\"task\": string, \"owner\": string|null, \"due\": string|null}}], \
             \"topics\": [string]}}.\n\nContent:\n{notes_or_transcript}"
        );

        let raw = self
            .llm
            .complete(vec![LlmMessage { role: LlmRole::User, content: prompt }])
            .await?;

        let mut meeting = self
            .store
            .get_meeting(user_id, external_meeting_id)
            .await?
            .ok_or_else(|| tsic_domain::TsicError::InternalInvariantViolated {
                message: format!("meeting {external_meeting_id} vanished during summarization"),
            })?;

        match serde_json::from_str::<SummaryResponse>(&raw) {
            Ok(parsed) => {
                meeting.ai_summary = Some(parsed.summary);
                meeting.key_decisions = parsed.key_decisions;
                meeting.action_items = parsed.action_items;
            }
            Err(err) => {
                warn!(user_id, external_meeting_id, error = %err, "llm summary was not valid json; storing raw text");
                meeting.ai_summary = Some(raw);
            }
        }

        self.store.upsert_meeting(user_id, meeting).await?;
        Ok(())
    }
}
