//! Online-meeting id resolution from a join URL, as a last-resort fallback
//! when the provider does not hand back a structured `onlineMeeting.id`.

use once_cell::sync::Lazy;
use regex::Regex;

// Matches both the decoded form (`19:meeting_XYZ@thread.v2`) and the
// URL-encoded form (`19%3ameeting_XYZ%40thread.v2`), case-insensitively on
// the percent-escapes.
static DECODED_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"19:meeting_[^@]+@thread\.v2").expect("decoded pattern is valid"));
static ENCODED_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)19%3ameeting_[^%]+%40thread\.v2").expect("encoded pattern is valid")
});

/// Extract the canonical online-meeting id from a join URL. Tries the
/// decoded form first, then the URL-encoded form (percent-decoding the
/// match before returning it).
#[must_use]
pub fn parse_online_meeting_id_from_join_url(join_url: &str) -> Option<String> {
    if let Some(m) = DECODED_PATTERN.find(join_url) {
        return Some(m.as_str().to_string());
    }

    let m = ENCODED_PATTERN.find(join_url)?;
    urlencoding::decode(m.as_str()).ok().map(|decoded| decoded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decoded_form() {
        let url = "https://teams.microsoft.com/l/meetup-join/19:meeting_abc123XYZ@thread.v2/0";
        assert_eq!(
            parse_online_meeting_id_from_join_url(url),
            Some("19:meeting_abc123XYZ@thread.v2".to_string())
        );
    }

    #[test]
    fn parses_url_encoded_form() {
        let url = "https://teams.microsoft.com/l/meetup-join/19%3ameeting_abc123XYZ%40thread.v2/0";
        assert_eq!(
            parse_online_meeting_id_from_join_url(url),
            Some("19:meeting_abc123XYZ@thread.v2".to_string())
        );
    }

    #[test]
    fn returns_none_when_absent() {
        assert_eq!(parse_online_meeting_id_from_join_url("https://example.com/meet/abc"), None);
    }
}
