//! Calendar feed assembly.
//!
//! Wraps encoded events in a VCALENDAR envelope and serializes to the
//! final CRLF-joined text payload. This module performs no I/O; callers
//! hand the payload to whatever stores or serves it.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::encode::encode_event;
use crate::error::FeedResult;
use crate::resolve::{creation_instant, resolve, updated_instant};
use crate::text::{description_of, title_of};
use crate::todo::{TodoRecord, parse_todo_records};
use crate::zone::CivilZone;

/// Product identifier stamped into every feed.
pub const PRODID: &str = "-//todofeed//Todo Calendar//EN";

/// Fixed calendar description advertised in the envelope.
pub const CALENDAR_DESCRIPTION: &str = "Todo Items Calendar - Auto Sync";

/// Builds one feed from an ordered sequence of todo records.
///
/// Events appear in input order, one VEVENT per record. The output is
/// byte-identical for identical arguments; `reference_now` is the only
/// clock the assembly reads.
pub fn assemble(
    todos: &[TodoRecord],
    calendar_name: &str,
    reference_now: DateTime<Utc>,
    zone: &CivilZone,
) -> String {
    let mut lines = envelope_header(calendar_name, zone);

    for (index, todo) in todos.iter().enumerate() {
        let resolved = resolve(todo, reference_now, zone);
        let created = creation_instant(todo, reference_now, zone);
        let updated = updated_instant(todo, reference_now, zone);

        let summary = title_of(&title_source(todo, resolved.matched_text.as_deref()));
        let description = description_of(todo.content_str());

        debug!(
            uid_index = index,
            source = %resolved.source,
            start = %resolved.start,
            "encoded event"
        );

        lines.extend(encode_event(
            todo,
            &resolved,
            &summary,
            &description,
            created,
            updated,
            reference_now,
            index,
            zone,
        ));
    }

    lines.push("END:VCALENDAR".to_string());
    lines.join("\r\n")
}

/// Parses a JSON note-list payload and assembles a feed from it.
///
/// Fails only when the payload is not an array of objects; individual
/// malformed records degrade to defaults rather than aborting the feed.
pub fn assemble_from_json(
    payload: &Value,
    calendar_name: &str,
    reference_now: DateTime<Utc>,
    zone: &CivilZone,
) -> FeedResult<String> {
    let todos = parse_todo_records(payload)?;
    Ok(assemble(&todos, calendar_name, reference_now, zone))
}

/// Removes the matched time expression from the content before title
/// derivation, so "2024-01-15 14:00 Meeting" titles as "Meeting". The
/// description keeps the expression.
fn title_source(todo: &TodoRecord, matched_text: Option<&str>) -> String {
    let content = todo.content_str();
    match matched_text {
        Some(expr) => content.replacen(expr, "", 1),
        None => content.to_string(),
    }
}

fn envelope_header(calendar_name: &str, zone: &CivilZone) -> Vec<String> {
    vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{PRODID}"),
        format!("X-WR-CALNAME:{calendar_name}"),
        format!("X-WR-CALDESC:{CALENDAR_DESCRIPTION}"),
        "CALSCALE:GREGORIAN".to_string(),
        "METHOD:PUBLISH".to_string(),
        format!("X-WR-TIMEZONE:{}", zone.tzid),
        "BEGIN:VTIMEZONE".to_string(),
        format!("TZID:{}", zone.tzid),
        "BEGIN:STANDARD".to_string(),
        "DTSTART:19700101T000000".to_string(),
        format!("TZOFFSETFROM:{}", zone.offset_basic()),
        format!("TZOFFSETTO:{}", zone.offset_basic()),
        format!("TZNAME:{}", zone.tzname),
        "END:STANDARD".to_string(),
        "END:VTIMEZONE".to_string(),
    ]
}
