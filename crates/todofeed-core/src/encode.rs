//! VEVENT block encoding.
//!
//! One todo becomes one VEVENT block with a fixed line order. Some calendar
//! clients parse these blocks positionally, so the order here must never
//! change.

use chrono::{DateTime, Utc};

use crate::resolve::ResolvedInterval;
use crate::todo::TodoRecord;
use crate::zone::CivilZone;

/// Domain tag appended to every event UID.
pub const UID_DOMAIN: &str = "todofeed.calendar";

/// Renders an instant in iCalendar basic UTC format, "20240115T060000Z".
pub fn format_utc_basic(instant: DateTime<Utc>) -> String {
    instant.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Returns the UID for a todo, unique within one feed.
///
/// Falls back to the feed position when the source record carries no id.
pub fn event_uid(todo: &TodoRecord, index: usize) -> String {
    match todo.id.as_deref() {
        Some(id) if !id.is_empty() => format!("{id}@{UID_DOMAIN}"),
        _ => format!("todo-{index}@{UID_DOMAIN}"),
    }
}

/// Diagnostic trailer appended to the event description.
///
/// The newlines are emitted pre-escaped since the description they join is
/// already an escaped TEXT value.
fn diagnostic_trailer(resolved: &ResolvedInterval, created: DateTime<Utc>, zone: &CivilZone) -> String {
    format!(
        "\\n\\nTime source: {}\\nCreated: {}",
        resolved.source,
        zone.render_civil(created)
    )
}

/// Encodes one todo as a VEVENT line block.
///
/// `summary` and `description` are the already-normalized text fields;
/// `created`/`updated` the record's own timestamps and `dtstamp` the
/// feed-generation instant.
#[allow(clippy::too_many_arguments)]
pub fn encode_event(
    todo: &TodoRecord,
    resolved: &ResolvedInterval,
    summary: &str,
    description: &str,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
    dtstamp: DateTime<Utc>,
    index: usize,
    zone: &CivilZone,
) -> Vec<String> {
    let full_description = format!(
        "{description}{}",
        diagnostic_trailer(resolved, created, zone)
    );

    vec![
        "BEGIN:VEVENT".to_string(),
        format!("UID:{}", event_uid(todo, index)),
        format!("DTSTAMP:{}", format_utc_basic(dtstamp)),
        format!("DTSTART:{}", format_utc_basic(resolved.start)),
        format!("DTEND:{}", format_utc_basic(resolved.end)),
        format!("SUMMARY:{summary}"),
        format!("DESCRIPTION:{full_description}"),
        format!("CREATED:{}", format_utc_basic(created)),
        format!("LAST-MODIFIED:{}", format_utc_basic(updated)),
        "CLASS:PUBLIC".to_string(),
        "TRANSP:OPAQUE".to_string(),
        "END:VEVENT".to_string(),
    ]
}
