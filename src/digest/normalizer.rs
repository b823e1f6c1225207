use crate::digest::classifier;
use crate::models::post::RawPost;
use crate::models::report::ReportRow;

pub const TRUNCATION_MARKER: &str = "...";
pub const UNKNOWN_AUTHOR: &str = "Unknown";
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Shape an accepted post into a report row. Only the body snippet is
/// truncated; the title is kept whole.
pub fn normalize(raw: RawPost, snippet_cap: usize) -> ReportRow {
    let workplace = classifier::workplace(&raw.title, &raw.body);
    ReportRow {
        source: raw.source,
        channel: raw.channel,
        text_snippet: snippet(&raw.body, snippet_cap),
        title: raw.title,
        url: raw.url,
        formatted_date: raw.created_at.format(DATE_FORMAT).to_string(),
        author: raw
            .author
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
        workplace,
        created_at: raw.created_at,
    }
}

/// Cap `body` at `cap` characters, appending the marker when cut.
fn snippet(body: &str, cap: usize) -> String {
    match body.char_indices().nth(cap) {
        Some((idx, _)) => format!("{}{TRUNCATION_MARKER}", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::post::Source;
    use crate::models::report::Workplace;
    use chrono::{TimeZone, Utc};

    fn raw(body: &str, author: Option<&str>) -> RawPost {
        RawPost {
            source: Source::Reddit,
            channel: "Reddit/r/jobs".to_string(),
            title: "Remote research assistant".to_string(),
            body: body.to_string(),
            url: "https://reddit.com/r/jobs/comments/abc".to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 3, 4, 9, 7, 30).unwrap(),
            author: author.map(String::from),
        }
    }

    #[test]
    fn truncates_long_body_to_cap_plus_marker() {
        let body = "x".repeat(600);
        let row = normalize(raw(&body, Some("alice")), 500);
        assert_eq!(row.text_snippet.chars().count(), 500 + TRUNCATION_MARKER.len());
        assert!(row.text_snippet.ends_with(TRUNCATION_MARKER));
        assert!(row.text_snippet.starts_with(&"x".repeat(500)));
    }

    #[test]
    fn leaves_short_body_unchanged() {
        let body = "y".repeat(500);
        let row = normalize(raw(&body, Some("alice")), 500);
        assert_eq!(row.text_snippet, body);
    }

    #[test]
    fn truncates_on_char_boundaries() {
        let row = normalize(raw("ééééé", None), 3);
        assert_eq!(row.text_snippet, "ééé...");
    }

    #[test]
    fn copies_fields_and_formats_date() {
        let row = normalize(raw("", Some("alice")), 500);
        assert_eq!(row.source, Source::Reddit);
        assert_eq!(row.channel, "Reddit/r/jobs");
        assert_eq!(row.title, "Remote research assistant");
        assert_eq!(row.url, "https://reddit.com/r/jobs/comments/abc");
        assert_eq!(row.author, "alice");
        assert_eq!(row.formatted_date, "2026-03-04 09:07");
        assert_eq!(row.workplace, Workplace::Remote);
    }

    #[test]
    fn missing_author_becomes_unknown() {
        assert_eq!(normalize(raw("", None), 500).author, UNKNOWN_AUTHOR);
        assert_eq!(normalize(raw("", Some("")), 500).author, UNKNOWN_AUTHOR);
    }
}
