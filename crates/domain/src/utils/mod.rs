//! Pure domain utility functions: no I/O, trivially unit-testable.

pub mod importance;
pub mod issue_key;
pub mod online_meeting_id;

pub use importance::score_new_meeting;
pub use issue_key::extract_issue_keys;
pub use online_meeting_id::parse_online_meeting_id_from_join_url;
