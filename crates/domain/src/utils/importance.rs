//! Importance scoring formula, applied once per meeting on first ingestion.

use once_cell::sync::Lazy;
use regex::Regex;

const BOOST_TITLE_WORDS: &[&str] = &[
    "standup",
    "sprint",
    "planning",
    "retrospective",
    "review",
    "all-hands",
    "1:1 with manager",
    "kickoff",
    "postmortem",
];

const PENALTY_TITLE_WORDS: &[&str] =
    &["social", "coffee", "optional", "tentative", "hold", "placeholder"];

static BOOST_PATTERN: Lazy<Regex> = Lazy::new(|| build_word_pattern(BOOST_TITLE_WORDS));
static PENALTY_PATTERN: Lazy<Regex> = Lazy::new(|| build_word_pattern(PENALTY_TITLE_WORDS));

fn build_word_pattern(words: &[&str]) -> Regex {
    let escaped: Vec<String> = words.iter().map(|w| regex::escape(w)).collect();
    Regex::new(&format!("(?i){}", escaped.join("|"))).expect("word pattern is valid")
}

/// Inputs the scoring formula needs about a newly discovered meeting.
#[derive(Debug, Clone, Copy)]
pub struct MeetingScoringInput<'a> {
    pub title: &'a str,
    pub attendee_count: usize,
    pub is_recurring: bool,
    pub has_online_meeting: bool,
}

/// Compute the 0-100 importance score for a meeting seen for the first time.
/// Never called again once a meeting row exists (importance is preserved).
#[must_use]
pub fn score_new_meeting(input: MeetingScoringInput<'_>) -> i32 {
    let mut score: i32 = 50;

    if BOOST_PATTERN.is_match(input.title) {
        score += 30;
    }
    if PENALTY_PATTERN.is_match(input.title) {
        score -= 20;
    }

    if input.attendee_count >= 5 {
        score += 20;
    }
    if input.attendee_count >= 10 {
        score += 10;
    }

    if input.is_recurring {
        score += 10;
    }
    if input.has_online_meeting {
        score += 5;
    }

    score.clamp(0, 100)
}
