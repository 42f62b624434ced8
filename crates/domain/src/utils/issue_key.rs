//! Issue key extraction: `[A-Z][A-Z0-9]+-\d+`, e.g. `PROJ-123`.

use once_cell::sync::Lazy;
use regex::Regex;

static ISSUE_KEY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z][A-Z0-9]+-\d+").expect("issue key pattern is valid"));

/// Extract every non-overlapping issue key from `text`, in the order they
/// appear. Duplicates are preserved exactly as found (callers that need a
/// unique set should dedupe themselves).
#[must_use]
pub fn extract_issue_keys(text: &str) -> Vec<String> {
    ISSUE_KEY_PATTERN.find_iter(text).map(|m| m.as_str().to_string()).collect()
}
