//! Configuration loader.
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from a config file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `TSIC_DB_PATH`: Database file path
//! - `TSIC_DB_POOL_SIZE`: Connection pool size
//! - `TSIC_SYNC_INTERVAL`: Sync interval, in seconds
//! - `TSIC_SYNC_WINDOW_MEETINGS_FORWARD`: Future meeting horizon, in days
//! - `TSIC_SYNC_WINDOW_UPDATES_BACK`: Update lookback, in days
//! - `TSIC_TRANSCRIPT_INITIAL_DELAY`: `d_0` retry delay, in seconds
//! - `TSIC_TRANSCRIPT_MAX_DELAY`: `d_max` retry delay, in seconds
//! - `TSIC_TRANSCRIPT_BACKOFF_FACTOR`: retry growth factor
//! - `TSIC_TRANSCRIPT_MAX_ATTEMPTS`: retry cap
//! - `TSIC_TRANSCRIPT_RECENT_WINDOW`: aggressive-retry window, in seconds
//! - `TSIC_TRANSCRIPT_ELIGIBLE_WINDOW`: any-retry window, in seconds
//! - `TSIC_CODE_QUERY_LIMIT`: max code chunks per query
//! - `TSIC_CODE_QUERY_MIN_SIMILARITY`: minimum chunk similarity
//! - `TSIC_HISTORY_TURNS`: in-memory conversation ring size
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.toml` or `./config.json` (current working directory)
//! 2. `./tsic.toml` or `./tsic.json` (current working directory)
//! 3. `../config.toml` or `../config.json` (parent directory)
//! 4. `../../config.toml` or `../../config.json` (grandparent directory)
//! 5. Relative to executable location

use std::path::{Path, PathBuf};

use tsic_domain::{Config, ContextConfig, DatabaseConfig, Result, SyncConfig, TranscriptConfig, TsicError};

/// Load configuration from environment variables, with a file fallback.
///
/// # Errors
/// Returns `TsicError::InternalInvariantViolated` if configuration cannot
/// be loaded from either source.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration purely from `TSIC_*` environment variables.
///
/// # Errors
/// Returns `TsicError::InternalInvariantViolated` if a required variable
/// is missing or has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let database = DatabaseConfig {
        path: env_var("TSIC_DB_PATH")?,
        pool_size: env_parse("TSIC_DB_POOL_SIZE")?,
    };

    let sync = SyncConfig {
        interval_seconds: env_parse("TSIC_SYNC_INTERVAL")?,
        window_meetings_forward_days: env_parse("TSIC_SYNC_WINDOW_MEETINGS_FORWARD")?,
        window_updates_back_days: env_parse("TSIC_SYNC_WINDOW_UPDATES_BACK")?,
    };

    let transcript = TranscriptConfig {
        initial_delay_seconds: env_parse("TSIC_TRANSCRIPT_INITIAL_DELAY")?,
        max_delay_seconds: env_parse("TSIC_TRANSCRIPT_MAX_DELAY")?,
        backoff_factor: env_parse("TSIC_TRANSCRIPT_BACKOFF_FACTOR")?,
        max_attempts: env_parse("TSIC_TRANSCRIPT_MAX_ATTEMPTS")?,
        recent_window_seconds: env_parse("TSIC_TRANSCRIPT_RECENT_WINDOW")?,
        eligible_window_seconds: env_parse("TSIC_TRANSCRIPT_ELIGIBLE_WINDOW")?,
    };

    let context = ContextConfig {
        code_query_limit: env_parse("TSIC_CODE_QUERY_LIMIT")?,
        code_query_min_similarity: env_parse("TSIC_CODE_QUERY_MIN_SIMILARITY")?,
        history_turns: env_parse("TSIC_HISTORY_TURNS")?,
        fallback_meeting_count: env_parse("TSIC_FALLBACK_MEETING_COUNT")?,
        fallback_update_count: env_parse("TSIC_FALLBACK_UPDATE_COUNT")?,
    };

    Ok(Config { database, sync, transcript, context })
}

/// Load configuration from a file.
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats, detected by extension.
///
/// # Errors
/// Returns `TsicError::InternalInvariantViolated` if no file is found (and
/// `path` is `None`), the file can't be read, or its contents don't parse.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(config_error(format!("config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths()
            .ok_or_else(|| config_error("no config file found in any standard location".into()))?,
    };

    tracing::info!(path = %config_path.display(), "loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| config_error(format!("failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents).map_err(|e| config_error(format!("invalid toml: {e}"))),
        "json" => {
            serde_json::from_str(contents).map_err(|e| config_error(format!("invalid json: {e}")))
        }
        other => Err(config_error(format!("unsupported config format: {other}"))),
    }
}

/// Search standard locations for a config file, returning the first match.
#[must_use]
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend([
            cwd.join("config.toml"),
            cwd.join("config.json"),
            cwd.join("tsic.toml"),
            cwd.join("tsic.json"),
            cwd.join("../config.toml"),
            cwd.join("../config.json"),
            cwd.join("../../config.toml"),
            cwd.join("../../config.json"),
        ]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend([
                exe_dir.join("config.toml"),
                exe_dir.join("config.json"),
                exe_dir.join("tsic.toml"),
                exe_dir.join("tsic.json"),
            ]);
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn config_error(message: String) -> TsicError {
    TsicError::InternalInvariantViolated { message }
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| config_error(format!("missing required environment variable: {key}")))
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    let raw = env_var(key)?;
    raw.parse::<T>().map_err(|e| config_error(format!("invalid value for {key}: {e}")))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use once_cell::sync::Lazy;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    fn set_all_env_vars() {
        std::env::set_var("TSIC_DB_PATH", "/tmp/tsic.sqlite");
        std::env::set_var("TSIC_DB_POOL_SIZE", "4");
        std::env::set_var("TSIC_SYNC_INTERVAL", "900");
        std::env::set_var("TSIC_SYNC_WINDOW_MEETINGS_FORWARD", "30");
        std::env::set_var("TSIC_SYNC_WINDOW_UPDATES_BACK", "7");
        std::env::set_var("TSIC_TRANSCRIPT_INITIAL_DELAY", "120");
        std::env::set_var("TSIC_TRANSCRIPT_MAX_DELAY", "1800");
        std::env::set_var("TSIC_TRANSCRIPT_BACKOFF_FACTOR", "2.0");
        std::env::set_var("TSIC_TRANSCRIPT_MAX_ATTEMPTS", "10");
        std::env::set_var("TSIC_TRANSCRIPT_RECENT_WINDOW", "300");
        std::env::set_var("TSIC_TRANSCRIPT_ELIGIBLE_WINDOW", "86400");
        std::env::set_var("TSIC_CODE_QUERY_LIMIT", "15");
        std::env::set_var("TSIC_CODE_QUERY_MIN_SIMILARITY", "0.2");
        std::env::set_var("TSIC_HISTORY_TURNS", "20");
        std::env::set_var("TSIC_FALLBACK_MEETING_COUNT", "5");
        std::env::set_var("TSIC_FALLBACK_UPDATE_COUNT", "10");
    }

    #[test]
    fn load_from_env_reads_every_field() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        set_all_env_vars();

        let config = load_from_env().expect("config");
        assert_eq!(config.database.path, "/tmp/tsic.sqlite");
        assert_eq!(config.sync.interval_seconds, 900);
        assert_eq!(config.transcript.max_attempts, 10);
        assert_eq!(config.context.history_turns, 20);
    }

    #[test]
    fn load_from_env_fails_when_a_var_is_missing() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        set_all_env_vars();
        std::env::remove_var("TSIC_DB_PATH");

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, TsicError::InternalInvariantViolated { .. }));
    }
}
