//! Sync Orchestrator (C7): one worker per registered user, running the
//! meetings -> transcripts -> issues -> code pipeline on an immediate +
//! periodic + on-demand schedule.
//!
//! Grounded on `scheduling/calendar_scheduler.rs`'s lifecycle shape
//! (explicit start/stop, a `CancellationToken` per worker, timeout-wrapped
//! job execution, a `Drop` impl that cancels on unexpected drop), but built
//! on plain `tokio::time::interval` / `tokio::sync::mpsc` rather than
//! `tokio_cron_scheduler`: that crate has no per-user fixed-offset cron
//! requirement here, and isn't part of this workspace's dependency set.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use tsic_core::ports::{EventBusPort, StepStats, SyncEvent};
use tsic_core::{MeetingIntelligenceService, TaskCodeIntelligenceService, TranscriptEngine};
use tsic_domain::SyncConfig;

const STEP_MEETINGS: &str = "meetings";
const STEP_TRANSCRIPTS: &str = "transcripts";
const STEP_ISSUES: &str = "issues";
const STEP_CODE: &str = "code";

/// Timeout applied to a single sync cycle's worth of work.
const CYCLE_TIMEOUT: Duration = Duration::from_secs(300);

struct Worker {
    sync_now_tx: mpsc::Sender<()>,
    cancellation: CancellationToken,
    handle: JoinHandle<()>,
}

impl Drop for Worker {
    fn drop(&mut self) {
        if !self.handle.is_finished() {
            warn!("sync worker dropped while running; cancelling");
            self.cancellation.cancel();
        }
    }
}

/// Per-user scheduling for the sync pipeline.
pub struct SyncOrchestrator {
    meeting_service: Arc<MeetingIntelligenceService>,
    task_code_service: Arc<TaskCodeIntelligenceService>,
    transcript_engine: Arc<TranscriptEngine>,
    event_bus: Arc<dyn EventBusPort>,
    config: SyncConfig,
    workers: Mutex<HashMap<String, Worker>>,
}

impl SyncOrchestrator {
    #[must_use]
    pub fn new(
        meeting_service: Arc<MeetingIntelligenceService>,
        task_code_service: Arc<TaskCodeIntelligenceService>,
        transcript_engine: Arc<TranscriptEngine>,
        event_bus: Arc<dyn EventBusPort>,
        config: SyncConfig,
    ) -> Self {
        Self {
            meeting_service,
            task_code_service,
            transcript_engine,
            event_bus,
            config,
            workers: Mutex::new(HashMap::new()),
        }
    }

    /// Start a worker for `user_id`, if one isn't already running. Runs one
    /// cycle immediately, then every `config.interval_seconds`, and once
    /// more on each `sync_now` call in between.
    #[instrument(skip(self))]
    pub async fn register_user(&self, user_id: &str) {
        let mut workers = self.workers.lock().await;
        if workers.contains_key(user_id) {
            debug!(user_id, "worker already registered");
            return;
        }

        let (sync_now_tx, sync_now_rx) = mpsc::channel(1);
        let cancellation = CancellationToken::new();

        let handle = tokio::spawn(run_user_loop(
            user_id.to_string(),
            self.meeting_service.clone(),
            self.task_code_service.clone(),
            self.transcript_engine.clone(),
            self.event_bus.clone(),
            self.config.clone(),
            cancellation.clone(),
            sync_now_rx,
        ));

        workers.insert(user_id.to_string(), Worker { sync_now_tx, cancellation, handle });
        info!(user_id, "sync worker registered");
    }

    /// Cancel and await the worker for `user_id`, if any.
    #[instrument(skip(self))]
    pub async fn unregister_user(&self, user_id: &str) {
        let worker = self.workers.lock().await.remove(user_id);
        if let Some(worker) = worker {
            worker.cancellation.cancel();
            if let Err(err) = worker.handle.await {
                warn!(user_id, error = ?err, "sync worker task panicked");
            }
            info!(user_id, "sync worker unregistered");
        }
    }

    /// Request an out-of-band cycle for `user_id`. Coalesces with any
    /// already-pending request; a no-op if the user has no worker.
    pub async fn sync_now(&self, user_id: &str) {
        let workers = self.workers.lock().await;
        if let Some(worker) = workers.get(user_id) {
            // Bounded to 1: a pending request already covers this one.
            let _ = worker.sync_now_tx.try_send(());
        }
    }

    /// Cancel every worker and await their shutdown.
    pub async fn stop_all(&self) {
        let mut workers = self.workers.lock().await;
        for (user_id, worker) in workers.drain() {
            worker.cancellation.cancel();
            if let Err(err) = worker.handle.await {
                warn!(user_id, error = ?err, "sync worker task panicked");
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_user_loop(
    user_id: String,
    meeting_service: Arc<MeetingIntelligenceService>,
    task_code_service: Arc<TaskCodeIntelligenceService>,
    transcript_engine: Arc<TranscriptEngine>,
    event_bus: Arc<dyn EventBusPort>,
    config: SyncConfig,
    cancellation: CancellationToken,
    mut sync_now_rx: mpsc::Receiver<()>,
) {
    run_cycle(&user_id, &meeting_service, &task_code_service, &transcript_engine, &event_bus, &config).await;

    let mut interval = tokio::time::interval(Duration::from_secs(config.interval_seconds));
    interval.tick().await; // first tick fires immediately; already ran above

    loop {
        tokio::select! {
            () = cancellation.cancelled() => {
                debug!(user_id, "sync worker cancelled");
                break;
            }
            _ = interval.tick() => {
                run_cycle(&user_id, &meeting_service, &task_code_service, &transcript_engine, &event_bus, &config).await;
            }
            Some(()) = sync_now_rx.recv() => {
                run_cycle(&user_id, &meeting_service, &task_code_service, &transcript_engine, &event_bus, &config).await;
            }
        }
    }
}

async fn run_cycle(
    user_id: &str,
    meeting_service: &Arc<MeetingIntelligenceService>,
    task_code_service: &Arc<TaskCodeIntelligenceService>,
    transcript_engine: &Arc<TranscriptEngine>,
    event_bus: &Arc<dyn EventBusPort>,
    config: &SyncConfig,
) {
    let outcome = tokio::time::timeout(CYCLE_TIMEOUT, run_cycle_steps(user_id, meeting_service, task_code_service, transcript_engine, config))
        .await;

    let per_step_stats = match outcome {
        Ok(stats) => stats,
        Err(_) => {
            warn!(user_id, timeout_secs = CYCLE_TIMEOUT.as_secs(), "sync cycle timed out");
            vec![StepStats { step: "cycle".into(), succeeded: false, items_processed: 0 }]
        }
    };

    event_bus.publish(SyncEvent::SyncCompleted { user_id: user_id.to_string(), at: Utc::now(), per_step_stats });
}

async fn run_cycle_steps(
    user_id: &str,
    meeting_service: &Arc<MeetingIntelligenceService>,
    task_code_service: &Arc<TaskCodeIntelligenceService>,
    transcript_engine: &Arc<TranscriptEngine>,
    config: &SyncConfig,
) -> Vec<StepStats> {
    let now = Utc::now();
    let window_start = now - chrono::Duration::days(config.window_updates_back_days);
    let window_end = now + chrono::Duration::days(config.window_meetings_forward_days);

    let mut stats = Vec::with_capacity(4);

    let ingested = match meeting_service.ingest_window(user_id, window_start, window_end).await {
        Ok(ingested) => {
            stats.push(StepStats { step: STEP_MEETINGS.into(), succeeded: true, items_processed: ingested.len() });
            ingested
        }
        Err(err) => {
            warn!(user_id, error = ?err, step = STEP_MEETINGS, "sync step failed");
            stats.push(StepStats { step: STEP_MEETINGS.into(), succeeded: false, items_processed: 0 });
            Vec::new()
        }
    };

    let mut enqueued = 0usize;
    let recent_window_seconds = transcript_engine.recent_window_seconds();
    for ingested_meeting in &ingested {
        if !transcript_engine.is_eligible(user_id, &ingested_meeting.meeting, now).await {
            continue;
        }
        let elapsed = (now - ingested_meeting.meeting.end_time.and_utc()).num_seconds();
        let single_attempt_only = elapsed >= recent_window_seconds;

        let user_id = user_id.to_string();
        let external_meeting_id = ingested_meeting.meeting.external_meeting_id.clone();
        let transcript_engine = transcript_engine.clone();
        // Fire-and-forget: the engine owns its own persistence, event
        // emission, and retry scheduling once a job is handed off.
        tokio::spawn(async move {
            if let Err(err) =
                transcript_engine.run_to_completion(&user_id, &external_meeting_id, single_attempt_only).await
            {
                warn!(user_id, external_meeting_id, error = ?err, "transcript acquisition failed");
            }
        });
        enqueued += 1;
    }
    stats.push(StepStats { step: STEP_TRANSCRIPTS.into(), succeeded: true, items_processed: enqueued });

    match task_code_service.ingest_issues(user_id, config.window_updates_back_days).await {
        Ok(count) => stats.push(StepStats { step: STEP_ISSUES.into(), succeeded: true, items_processed: count }),
        Err(err) => {
            warn!(user_id, error = ?err, step = STEP_ISSUES, "sync step failed");
            stats.push(StepStats { step: STEP_ISSUES.into(), succeeded: false, items_processed: 0 });
        }
    }

    match task_code_service.ingest_code(user_id, window_start).await {
        Ok(count) => stats.push(StepStats { step: STEP_CODE.into(), succeeded: true, items_processed: count }),
        Err(err) => {
            warn!(user_id, error = ?err, step = STEP_CODE, "sync step failed");
            stats.push(StepStats { step: STEP_CODE.into(), succeeded: false, items_processed: 0 });
        }
    }

    stats
}
