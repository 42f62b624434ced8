//! Domain-level constants used across crates.

/// Service identifiers used as the `service_name` key in integration
/// credentials and throughout provider-facing code.
pub const SERVICE_CALENDAR: &str = "calendar";
pub const SERVICE_ISSUES: &str = "issues";
pub const SERVICE_CODE: &str = "code";

/// Event bus topics.
pub const TOPIC_SYNC_COMPLETED: &str = "sync-completed";
pub const TOPIC_TRANSCRIPT_AVAILABLE: &str = "transcript-available";
pub const TOPIC_CREDENTIAL_INVALIDATED: &str = "credential-invalidated";

/// Refresh a token when its remaining lifetime drops below this threshold.
pub const TOKEN_REFRESH_THRESHOLD_SECONDS: i64 = 300;

/// `get_access_token` guarantees the returned token is valid for at least
/// this many seconds.
pub const MIN_TOKEN_LIFETIME_GUARANTEE_SECONDS: i64 = 60;

/// File extensions considered plausible transcript fallback artifacts.
pub const TRANSCRIPT_FALLBACK_EXTENSIONS: &[&str] = &["vtt", "txt", "docx", "srt"];

/// File extensions never considered transcript artifacts, even if named
/// "transcript something".
pub const TRANSCRIPT_EXCLUDED_EXTENSIONS: &[&str] = &["mp4", "mp3", "avi", "mov", "wav"];

/// Fraction of a reconciliation window beyond which a deletion is logged at
/// warning level (but still executed).
pub const RECONCILIATION_WARN_FRACTION: f64 = 0.5;

/// Deadlines, per the concurrency and resource model.
pub const DEFAULT_HTTP_DEADLINE_SECONDS: u64 = 30;
pub const LLM_DEADLINE_SECONDS: u64 = 60;
pub const TRANSCRIPT_DOWNLOAD_DEADLINE_SECONDS: u64 = 120;
pub const WORKER_SHUTDOWN_DEADLINE_SECONDS: u64 = 5;

/// Upper bound on globally concurrent transcript retry jobs.
pub const DEFAULT_MAX_CONCURRENT_TRANSCRIPT_JOBS: usize = 32;
