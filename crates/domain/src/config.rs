//! Configuration structures, with every default lifted from the
//! enumerated configuration table.

use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Store (database) configuration.
    pub database: DatabaseConfig,
    /// Sync orchestrator configuration.
    pub sync: SyncConfig,
    /// Transcript acquisition retry configuration.
    pub transcript: TranscriptConfig,
    /// Context assembly defaults.
    pub context: ContextConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    pub path: String,
    /// Size of the connection pool.
    pub pool_size: u32,
}

/// Sync orchestrator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Gap between per-user sync cycles, in seconds.
    pub interval_seconds: u64,
    /// Future meeting horizon for the meetings cycle, in days.
    pub window_meetings_forward_days: i64,
    /// Lookback window for updates (issues/code), in days.
    pub window_updates_back_days: i64,
}

/// Transcript acquisition retry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptConfig {
    /// `d_0`: initial retry delay, in seconds.
    pub initial_delay_seconds: u64,
    /// `d_max`: maximum retry delay, in seconds.
    pub max_delay_seconds: u64,
    /// Growth factor applied between attempts.
    pub backoff_factor: f64,
    /// Maximum number of attempts before terminal DONE_UNAVAILABLE.
    pub max_attempts: u32,
    /// Meetings that ended within this window (seconds) get aggressive retry.
    pub recent_window_seconds: i64,
    /// Meetings that ended within this window (seconds) are eligible for any retry.
    pub eligible_window_seconds: i64,
}

/// Context assembly defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Max code chunks returned per code query.
    pub code_query_limit: usize,
    /// Minimum chunk similarity to keep.
    pub code_query_min_similarity: f64,
    /// Size of the in-memory per-session conversation ring.
    pub history_turns: usize,
    /// Fallback meeting count when no filtered context is given.
    pub fallback_meeting_count: usize,
    /// Fallback update count when no filtered context is given.
    pub fallback_update_count: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig { path: "tsic.db".to_string(), pool_size: 8 },
            sync: SyncConfig {
                interval_seconds: 900,
                window_meetings_forward_days: 30,
                window_updates_back_days: 7,
            },
            transcript: TranscriptConfig {
                initial_delay_seconds: 120,
                max_delay_seconds: 1800,
                backoff_factor: 1.5,
                max_attempts: 10,
                recent_window_seconds: 300,
                eligible_window_seconds: 24 * 3600,
            },
            context: ContextConfig {
                code_query_limit: 15,
                code_query_min_similarity: 0.20,
                history_turns: 20,
                fallback_meeting_count: 10,
                fallback_update_count: 20,
            },
        }
    }
}
