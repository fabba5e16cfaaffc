//! Title and description derivation from todo content.

use std::sync::LazyLock;

use regex::Regex;

/// Leading markdown checkbox: "* [ ] " or "* [x] ".
static CHECKBOX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*\s*\[.*?\]\s*").expect("valid checkbox regex"));

/// Leading bullet marker: "- ", "* " or "+ ".
static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-*+]\s*").expect("valid bullet regex"));

/// Title shown when the content carries no usable text.
pub const PLACEHOLDER_TITLE: &str = "Untitled Todo";

/// Maximum title length, in characters.
pub const TITLE_MAX_CHARS: usize = 100;

/// Maximum description length after escaping, in characters.
pub const DESCRIPTION_MAX_CHARS: usize = 500;

/// Strips markdown todo markers from the start of a content line.
///
/// The checkbox form is removed first, then any remaining bare bullet, so
/// "* [x] - task" reduces to "task".
pub fn strip_markers(content: &str) -> String {
    let without_checkbox = CHECKBOX_RE.replace(content, "");
    BULLET_RE.replace(&without_checkbox, "").into_owned()
}

/// Derives the event title from todo content.
///
/// Markers are stripped, whitespace trimmed, and the result capped at
/// [`TITLE_MAX_CHARS`] characters. Empty content yields
/// [`PLACEHOLDER_TITLE`].
pub fn title_of(content: &str) -> String {
    let stripped = strip_markers(content);
    let trimmed = stripped.trim();
    if trimmed.is_empty() {
        return PLACEHOLDER_TITLE.to_string();
    }
    truncate_chars(trimmed, TITLE_MAX_CHARS)
}

/// Derives the event description from todo content.
///
/// Markers are stripped and the remainder escaped for iCalendar text
/// values, then capped at [`DESCRIPTION_MAX_CHARS`] characters. The cap
/// applies after escaping, so an escape sequence near the limit may be cut
/// mid-way.
pub fn description_of(content: &str) -> String {
    truncate_chars(&escape_ics(&strip_markers(content)), DESCRIPTION_MAX_CHARS)
}

/// Escapes a string for use as an iCalendar TEXT value.
///
/// Order matters: backslash-producing replacements run before the
/// semicolon and comma escapes so literal backslashes in the input are not
/// re-escaped.
pub fn escape_ics(value: &str) -> String {
    value
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace(';', "\\;")
        .replace(',', "\\,")
}

/// Truncates to at most `max` characters, respecting char boundaries.
fn truncate_chars(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((idx, _)) => value[..idx].to_string(),
        None => value.to_string(),
    }
}
