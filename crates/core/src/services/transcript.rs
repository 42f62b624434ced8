//! Transcript Acquisition Engine (C4): per-meeting state machine that
//! resolves the online-meeting id, fetches the API transcript, falls back
//! to file search, and retries on a capped exponential schedule.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};
use tsic_domain::constants::{
    TRANSCRIPT_EXCLUDED_EXTENSIONS, TRANSCRIPT_FALLBACK_EXTENSIONS,
};
use tsic_domain::utils::parse_online_meeting_id_from_join_url;
use tsic_domain::{Meeting, Result, TranscriptConfig};

use crate::ports::{CalendarProviderPort, EventBusPort, FileMetadata, StorePort, SyncEvent};

/// Terminal or retry-pending outcome of one acquisition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionOutcome {
    /// Transcript (or fallback file) content was written.
    DoneOk,
    /// No online-meeting identity could be derived; never retried.
    DoneUnavailableNotOnlineMeeting,
    /// Exhausted the retry budget with no content.
    DoneUnavailableExhausted,
    /// No content yet; caller should reschedule per the retry policy.
    RetryScheduled { attempt: u32, delay: std::time::Duration },
}

/// C4: transcript acquisition per (user_id, meeting).
pub struct TranscriptEngine {
    store: Arc<dyn StorePort>,
    calendar: Arc<dyn CalendarProviderPort>,
    event_bus: Arc<dyn EventBusPort>,
    config: TranscriptConfig,
    active_jobs: Mutex<HashSet<(String, String)>>,
}

impl TranscriptEngine {
    pub fn new(
        store: Arc<dyn StorePort>,
        calendar: Arc<dyn CalendarProviderPort>,
        event_bus: Arc<dyn EventBusPort>,
        config: TranscriptConfig,
    ) -> Self {
        Self { store, calendar, event_bus, config, active_jobs: Mutex::new(HashSet::new()) }
    }

    /// Whether `meeting` is eligible to be enqueued: important, ended
    /// within the eligibility window, not already done, and not in flight.
    pub async fn is_eligible(&self, user_id: &str, meeting: &Meeting, now: chrono::DateTime<chrono::Utc>) -> bool {
        if !meeting.is_important || meeting.has_transcript() {
            return false;
        }
        let end_utc = meeting.end_time.and_utc();
        let elapsed = (now - end_utc).num_seconds();
        if elapsed < 0 || elapsed > self.config.eligible_window_seconds {
            return false;
        }
        let key = (user_id.to_string(), meeting.external_meeting_id.clone());
        !self.active_jobs.lock().await.contains(&key)
    }

    /// Meetings that ended within this many seconds of now get the
    /// aggressive (inline, multi-attempt) retry path rather than a single
    /// attempt.
    pub fn recent_window_seconds(&self) -> i64 {
        self.config.recent_window_seconds
    }

    /// Run the acquisition attempts for one meeting, attempt by attempt, up
    /// to `max_attempts`, sleeping the computed backoff between attempts.
    /// Returns the terminal outcome. Callers decide whether to run this
    /// inline (aggressive, recently-ended meetings) or as a single attempt
    /// (older meetings), per the orchestrator's enqueue policy.
    pub async fn run_to_completion(
        &self,
        user_id: &str,
        external_meeting_id: &str,
        single_attempt_only: bool,
    ) -> Result<AcquisitionOutcome> {
        let key = (user_id.to_string(), external_meeting_id.to_string());
        self.active_jobs.lock().await.insert(key.clone());
        let result = self.run_attempts(user_id, external_meeting_id, single_attempt_only).await;
        self.active_jobs.lock().await.remove(&key);
        result
    }

    async fn run_attempts(
        &self,
        user_id: &str,
        external_meeting_id: &str,
        single_attempt_only: bool,
    ) -> Result<AcquisitionOutcome> {
        let max_attempts = if single_attempt_only { 1 } else { self.config.max_attempts };

        for attempt in 1..=max_attempts {
            match self.attempt_once(user_id, external_meeting_id).await? {
                Some(outcome @ AcquisitionOutcome::DoneOk) => return Ok(outcome),
                Some(outcome @ AcquisitionOutcome::DoneUnavailableNotOnlineMeeting) => {
                    return Ok(outcome)
                }
                _ if single_attempt_only => {
                    let delay = self.backoff_delay(attempt);
                    return Ok(AcquisitionOutcome::RetryScheduled { attempt, delay });
                }
                _ if attempt == max_attempts => {
                    return Ok(AcquisitionOutcome::DoneUnavailableExhausted)
                }
                _ => {
                    let delay = self.backoff_delay(attempt);
                    tokio::time::sleep(delay).await;
                }
            }
        }

        Ok(AcquisitionOutcome::DoneUnavailableExhausted)
    }

    /// `d_i = min(d_max, d_0 * backoff_factor^(i-1))`.
    fn backoff_delay(&self, attempt: u32) -> std::time::Duration {
        let raw = self.config.initial_delay_seconds as f64
            * self.config.backoff_factor.powi(attempt as i32 - 1);
        let capped = raw.min(self.config.max_delay_seconds as f64);
        std::time::Duration::from_secs_f64(capped)
    }

    /// One pass through RESOLVING_ID -> FETCHING_API -> FETCHING_FALLBACK.
    /// Returns `None` when nothing was found this attempt (retry-eligible).
    async fn attempt_once(
        &self,
        user_id: &str,
        external_meeting_id: &str,
    ) -> Result<Option<AcquisitionOutcome>> {
        let meeting = self
            .store
            .get_meeting(user_id, external_meeting_id)
            .await?
            .ok_or_else(|| tsic_domain::TsicError::InternalInvariantViolated {
                message: format!("meeting {external_meeting_id} vanished during acquisition"),
            })?;

        let online_meeting_id = match self.resolve_online_meeting_id(user_id, &meeting).await? {
            Some(id) => id,
            None => return Ok(Some(AcquisitionOutcome::DoneUnavailableNotOnlineMeeting)),
        };

        if let Some(content) = self.try_api_transcript(user_id, &online_meeting_id).await? {
            self.store
                .update_meeting_transcript(
                    user_id,
                    external_meeting_id,
                    &content,
                    None,
                    Some(&online_meeting_id),
                )
                .await?;
            self.event_bus.publish(SyncEvent::TranscriptAvailable {
                user_id: user_id.to_string(),
                meeting_id: external_meeting_id.to_string(),
            });
            info!(user_id, external_meeting_id, "transcript acquired via api");
            return Ok(Some(AcquisitionOutcome::DoneOk));
        }

        if let Some(content) = self.try_file_fallback(user_id, &meeting.title).await? {
            self.store
                .update_meeting_transcript(user_id, external_meeting_id, &content, None, None)
                .await?;
            self.event_bus.publish(SyncEvent::TranscriptAvailable {
                user_id: user_id.to_string(),
                meeting_id: external_meeting_id.to_string(),
            });
            info!(user_id, external_meeting_id, "transcript acquired via file fallback");
            return Ok(Some(AcquisitionOutcome::DoneOk));
        }

        Ok(None)
    }

    async fn resolve_online_meeting_id(
        &self,
        user_id: &str,
        meeting: &Meeting,
    ) -> Result<Option<String>> {
        if let Some(id) = meeting.online_meeting_id() {
            return Ok(Some(id.to_string()));
        }

        let event = self.calendar.get_event(user_id, &meeting.external_meeting_id).await?;
        if let Some(online_meeting) = event.online_meeting {
            if let Some(id) = online_meeting.id {
                self.store
                    .update_meeting_transcript(
                        user_id,
                        &meeting.external_meeting_id,
                        "",
                        None,
                        Some(&id),
                    )
                    .await
                    .ok();
                return Ok(Some(id));
            }
            if let Some(join_url) = online_meeting.join_url {
                if let Some(id) = parse_online_meeting_id_from_join_url(&join_url) {
                    self.store
                        .update_meeting_transcript(
                            user_id,
                            &meeting.external_meeting_id,
                            "",
                            None,
                            Some(&id),
                        )
                        .await
                        .ok();
                    return Ok(Some(id));
                }
            }
        }

        Ok(None)
    }

    async fn try_api_transcript(
        &self,
        user_id: &str,
        online_meeting_id: &str,
    ) -> Result<Option<String>> {
        let transcripts = self.calendar.list_transcripts(user_id, online_meeting_id).await?;
        let Some(newest) = transcripts.into_iter().max_by_key(|t| t.created_at) else {
            return Ok(None);
        };

        let content = self
            .calendar
            .fetch_transcript_content(user_id, online_meeting_id, &newest.transcript_id, "text/vtt")
            .await?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(content))
    }

    async fn try_file_fallback(&self, user_id: &str, meeting_title: &str) -> Result<Option<String>> {
        let candidates = self.calendar.search_files(user_id, "transcript", None).await?;
        let best = Self::pick_best_fallback_file(&candidates, meeting_title);

        let Some(file) = best else {
            return Ok(None);
        };

        let bytes = self.calendar.download_file(user_id, &file.file_id).await?;
        match String::from_utf8(bytes) {
            Ok(text) if !text.trim().is_empty() => Ok(Some(text)),
            _ => {
                warn!(user_id, file_id = %file.file_id, "fallback file was empty or not utf-8 text");
                Ok(None)
            }
        }
    }

    fn pick_best_fallback_file<'a>(
        candidates: &'a [FileMetadata],
        meeting_title: &str,
    ) -> Option<&'a FileMetadata> {
        let title_lower = meeting_title.to_lowercase();
        candidates
            .iter()
            .filter(|f| Self::is_plausible_transcript_file(&f.name))
            .max_by(|a, b| {
                let a_rank = a.name.to_lowercase().contains(&title_lower);
                let b_rank = b.name.to_lowercase().contains(&title_lower);
                (a_rank, a.created_at).cmp(&(b_rank, b.created_at))
            })
    }

    fn is_plausible_transcript_file(name: &str) -> bool {
        let lower = name.to_lowercase();
        let extension = lower.rsplit('.').next().unwrap_or("");
        if TRANSCRIPT_EXCLUDED_EXTENSIONS.contains(&extension) {
            return false;
        }
        TRANSCRIPT_FALLBACK_EXTENSIONS.contains(&extension) || lower.contains("transcript")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use tsic_domain::{Attendee, IntegrationCredential, MeetingMetadata};

    use super::*;
    use crate::ports::{
        CalendarAttendee, CalendarEvent, MeetingFilter, OnlineMeetingRef, SyncEvent,
        TranscriptHandle, UpdateFilter,
    };

    #[derive(Default)]
    struct FakeStore {
        meetings: StdMutex<std::collections::HashMap<String, Meeting>>,
    }

    #[async_trait]
    impl StorePort for FakeStore {
        async fn upsert_meeting(&self, _user_id: &str, meeting: Meeting) -> Result<Meeting> {
            self.meetings.lock().unwrap().insert(meeting.external_meeting_id.clone(), meeting.clone());
            Ok(meeting)
        }
        async fn update_meeting_transcript(
            &self,
            _user_id: &str,
            external_meeting_id: &str,
            transcript: &str,
            _copilot_notes: Option<&str>,
            online_meeting_id: Option<&str>,
        ) -> Result<()> {
            let mut meetings = self.meetings.lock().unwrap();
            if let Some(meeting) = meetings.get_mut(external_meeting_id) {
                if !transcript.is_empty() {
                    meeting
                        .metadata
                        .insert("transcript".into(), serde_json::Value::String(transcript.to_string()));
                }
                if let Some(id) = online_meeting_id {
                    meeting
                        .metadata
                        .insert("online_meeting_id".into(), serde_json::Value::String(id.to_string()));
                }
            }
            Ok(())
        }
        async fn get_meeting(&self, _user_id: &str, external_meeting_id: &str) -> Result<Option<Meeting>> {
            Ok(self.meetings.lock().unwrap().get(external_meeting_id).cloned())
        }
        async fn list_meetings(&self, _user_id: &str, _filter: MeetingFilter) -> Result<Vec<Meeting>> {
            Ok(self.meetings.lock().unwrap().values().cloned().collect())
        }
        async fn upsert_update(&self, _user_id: &str, update: tsic_domain::Update) -> Result<tsic_domain::Update> {
            Ok(update)
        }
        async fn delete_updates_missing_from(
            &self,
            _user_id: &str,
            _update_type: tsic_domain::UpdateType,
            _window_start: DateTime<Utc>,
            _current_external_ids: &[String],
        ) -> Result<usize> {
            Ok(0)
        }
        async fn list_updates(&self, _user_id: &str, _filter: UpdateFilter) -> Result<Vec<tsic_domain::Update>> {
            Ok(vec![])
        }
        async fn upsert_context_reference(&self, _reference: tsic_domain::ContextReference) -> Result<()> {
            Ok(())
        }
        async fn get_credential(&self, _user_id: &str, _service: &str) -> Result<Option<IntegrationCredential>> {
            Ok(None)
        }
        async fn put_credential(&self, _credential: IntegrationCredential) -> Result<()> {
            Ok(())
        }
        async fn delete_credential(&self, _user_id: &str, _service: &str) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default, Clone)]
    struct FakeCalendar {
        online_meeting: Option<OnlineMeetingRef>,
        transcripts: Vec<TranscriptHandle>,
        transcript_content: String,
        files: Vec<FileMetadata>,
        file_content: Vec<u8>,
    }

    #[async_trait]
    impl CalendarProviderPort for FakeCalendar {
        async fn list_events(&self, _user_id: &str, _window_start: DateTime<Utc>, _window_end: DateTime<Utc>) -> Result<Vec<CalendarEvent>> {
            Ok(vec![])
        }
        async fn get_event(&self, _user_id: &str, event_id: &str) -> Result<CalendarEvent> {
            Ok(CalendarEvent {
                id: event_id.to_string(),
                subject: "Planning".into(),
                start_naive: chrono::NaiveDate::from_ymd_opt(2026, 7, 26).unwrap().and_hms_opt(9, 0, 0).unwrap(),
                start_timezone: "UTC".into(),
                end_naive: chrono::NaiveDate::from_ymd_opt(2026, 7, 26).unwrap().and_hms_opt(10, 0, 0).unwrap(),
                end_timezone: "UTC".into(),
                location: None,
                url: None,
                attendees: vec![CalendarAttendee { name: None, email: "a@example.com".into() }],
                is_online_meeting: self.online_meeting.is_some(),
                is_recurring: false,
                online_meeting: self.online_meeting.clone(),
            })
        }
        async fn list_transcripts(&self, _user_id: &str, _online_meeting_id: &str) -> Result<Vec<TranscriptHandle>> {
            Ok(self.transcripts.clone())
        }
        async fn fetch_transcript_content(
            &self,
            _user_id: &str,
            _online_meeting_id: &str,
            _transcript_id: &str,
            _format: &str,
        ) -> Result<String> {
            Ok(self.transcript_content.clone())
        }
        async fn search_files(&self, _user_id: &str, _query: &str, _folder: Option<&str>) -> Result<Vec<FileMetadata>> {
            Ok(self.files.clone())
        }
        async fn download_file(&self, _user_id: &str, _file_id: &str) -> Result<Vec<u8>> {
            Ok(self.file_content.clone())
        }
    }

    #[derive(Default)]
    struct FakeEventBus {
        published: StdMutex<Vec<SyncEvent>>,
    }
    impl EventBusPort for FakeEventBus {
        fn subscribe(&self, _subscriber: Arc<dyn crate::ports::EventSubscriber>) -> crate::ports::SubscriptionId {
            crate::ports::SubscriptionId(0)
        }
        fn unsubscribe(&self, _id: crate::ports::SubscriptionId) {}
        fn publish(&self, event: SyncEvent) {
            self.published.lock().unwrap().push(event);
        }
    }

    fn unresolved_meeting(id: &str) -> Meeting {
        let now = Utc::now().naive_utc();
        Meeting {
            user_id: "u1".into(),
            external_meeting_id: id.into(),
            title: "Planning".into(),
            start_time: now - chrono::Duration::hours(1),
            end_time: now,
            start_timezone: "UTC".into(),
            end_timezone: "UTC".into(),
            location: None,
            url: None,
            attendees: vec![Attendee { name: None, email: "a@example.com".into() }],
            is_important: true,
            importance_score: 90,
            manual_notes: None,
            ai_summary: None,
            key_decisions: vec![],
            action_items: vec![],
            copilot_notes: None,
            metadata: MeetingMetadata::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn test_config() -> TranscriptConfig {
        TranscriptConfig {
            initial_delay_seconds: 1,
            max_delay_seconds: 2,
            backoff_factor: 1.5,
            max_attempts: 1,
            recent_window_seconds: 900,
            eligible_window_seconds: 86400,
        }
    }

    #[tokio::test]
    async fn resolves_via_api_transcript_and_emits_event() {
        let store = Arc::new(FakeStore::default());
        store.upsert_meeting("u1", unresolved_meeting("m1")).await.unwrap();
        let calendar = Arc::new(FakeCalendar {
            online_meeting: Some(OnlineMeetingRef { id: Some("om-1".into()), join_url: None }),
            transcripts: vec![TranscriptHandle { transcript_id: "t1".into(), created_at: Utc::now() }],
            transcript_content: "hello world".into(),
            ..Default::default()
        });
        let bus = Arc::new(FakeEventBus::default());
        let engine = TranscriptEngine::new(store.clone(), calendar, bus.clone(), test_config());

        let outcome = engine.run_to_completion("u1", "m1", true).await.unwrap();
        assert_eq!(outcome, AcquisitionOutcome::DoneOk);
        assert_eq!(bus.published.lock().unwrap().len(), 1);

        let meeting = store.get_meeting("u1", "m1").await.unwrap().unwrap();
        assert_eq!(meeting.metadata.get("transcript").and_then(|v| v.as_str()), Some("hello world"));
    }

    #[tokio::test]
    async fn falls_back_to_best_matching_file_when_api_has_nothing() {
        let store = Arc::new(FakeStore::default());
        store.upsert_meeting("u1", unresolved_meeting("m1")).await.unwrap();
        let calendar = Arc::new(FakeCalendar {
            online_meeting: Some(OnlineMeetingRef { id: Some("om-1".into()), join_url: None }),
            files: vec![
                FileMetadata { file_id: "f1".into(), name: "random.vtt".into(), created_at: Utc::now() - chrono::Duration::days(1) },
                FileMetadata { file_id: "f2".into(), name: "Planning transcript.vtt".into(), created_at: Utc::now() },
                FileMetadata { file_id: "f3".into(), name: "recording.mp4".into(), created_at: Utc::now() },
            ],
            file_content: b"fallback content".to_vec(),
            ..Default::default()
        });
        let bus = Arc::new(FakeEventBus::default());
        let engine = TranscriptEngine::new(store.clone(), calendar, bus, test_config());

        let outcome = engine.run_to_completion("u1", "m1", true).await.unwrap();
        assert_eq!(outcome, AcquisitionOutcome::DoneOk);

        let meeting = store.get_meeting("u1", "m1").await.unwrap().unwrap();
        assert_eq!(
            meeting.metadata.get("transcript").and_then(|v| v.as_str()),
            Some("fallback content")
        );
    }

    #[tokio::test]
    async fn not_an_online_meeting_is_terminal_without_retry() {
        let store = Arc::new(FakeStore::default());
        store.upsert_meeting("u1", unresolved_meeting("m1")).await.unwrap();
        let calendar = Arc::new(FakeCalendar::default());
        let bus = Arc::new(FakeEventBus::default());
        let engine = TranscriptEngine::new(store, calendar, bus, test_config());

        let outcome = engine.run_to_completion("u1", "m1", true).await.unwrap();
        assert_eq!(outcome, AcquisitionOutcome::DoneUnavailableNotOnlineMeeting);
    }

    #[tokio::test]
    async fn nothing_found_with_single_attempt_reports_retry_scheduled() {
        let store = Arc::new(FakeStore::default());
        store.upsert_meeting("u1", unresolved_meeting("m1")).await.unwrap();
        let calendar = Arc::new(FakeCalendar {
            online_meeting: Some(OnlineMeetingRef { id: Some("om-1".into()), join_url: None }),
            ..Default::default()
        });
        let bus = Arc::new(FakeEventBus::default());
        let mut config = test_config();
        config.max_attempts = 5;
        let engine = TranscriptEngine::new(store, calendar, bus, config);

        let outcome = engine.run_to_completion("u1", "m1", true).await.unwrap();
        assert!(matches!(outcome, AcquisitionOutcome::RetryScheduled { attempt: 1, .. }));
    }

    #[tokio::test]
    async fn eligibility_excludes_unimportant_and_already_transcribed_meetings() {
        let store = Arc::new(FakeStore::default());
        let calendar = Arc::new(FakeCalendar::default());
        let bus = Arc::new(FakeEventBus::default());
        let engine = TranscriptEngine::new(store, calendar, bus, test_config());

        let mut unimportant = unresolved_meeting("m2");
        unimportant.is_important = false;
        assert!(!engine.is_eligible("u1", &unimportant, Utc::now()).await);

        let mut transcribed = unresolved_meeting("m3");
        transcribed
            .metadata
            .insert("transcript".into(), serde_json::Value::String("already have it".into()));
        assert!(!engine.is_eligible("u1", &transcribed, Utc::now()).await);

        let eligible = unresolved_meeting("m4");
        assert!(engine.is_eligible("u1", &eligible, Utc::now()).await);
    }
}
