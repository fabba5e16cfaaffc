//! Time resolution for todo records.
//!
//! A todo may carry up to four conflicting time sources: top-level API
//! fields, nested `metadata` fields, a time expression embedded in the
//! content, and its creation timestamp. [`resolve`] picks one unambiguous
//! start/end interval from them in a fixed priority order and records which
//! source won as a [`TimeSource`] diagnostic tag.
//!
//! The resolver never fails: unparseable instants fall back to the creation
//! instant, and the returned interval always satisfies `end > start`.

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use regex::Regex;

use crate::todo::TodoRecord;
use crate::zone::CivilZone;

/// Time range in content: "9:00-10:00".
static TIME_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,2}):(\d{2})-(\d{1,2}):(\d{2})").expect("valid time range regex")
});

/// Full date-time in content: "2024-1-15 14:00".
static DATE_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4})-(\d{1,2})-(\d{1,2})\s+(\d{1,2}):(\d{2})").expect("valid date-time regex")
});

/// Bare clock time in content: "14:00".
static SINGLE_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2}):(\d{2})").expect("valid single time regex"));

/// Which resolution tier produced an event's interval.
///
/// The string forms are wire-stable diagnostic labels that end up in the
/// event description trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSource {
    /// Top-level `startDate` filled the start slot.
    ApiStartDate,
    /// Top-level `endDate` filled the end slot.
    ApiEndDate,
    /// Top-level fields filled both slots.
    ApiBoth,
    /// `metadata.startDate` filled the start slot.
    MetadataStartDate,
    /// `metadata.endDate` filled the end slot.
    MetadataEndDate,
    /// Metadata fields filled both slots.
    MetadataBoth,
    /// A "H:MM-H:MM" range found in the content.
    ContentTimeRange,
    /// A bare "H:MM" clock time found in the content.
    ContentSingleTime,
    /// A "YYYY-M-D H:MM" expression found in the content.
    ContentDateTime,
    /// Nothing matched; the creation instant was used.
    Default,
}

impl TimeSource {
    /// Returns the diagnostic label for this source.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApiStartDate => "api_startDate",
            Self::ApiEndDate => "api_endDate",
            Self::ApiBoth => "api_both",
            Self::MetadataStartDate => "metadata_startDate",
            Self::MetadataEndDate => "metadata_endDate",
            Self::MetadataBoth => "metadata_both",
            Self::ContentTimeRange => "content_time_range",
            Self::ContentSingleTime => "content_single_time",
            Self::ContentDateTime => "content_date_time",
            Self::Default => "default",
        }
    }
}

impl fmt::Display for TimeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The resolved start/end interval for one todo.
///
/// Invariant: `end > start` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInterval {
    /// Event start, in UTC.
    pub start: DateTime<Utc>,
    /// Event end, in UTC.
    pub end: DateTime<Utc>,
    /// Which tier produced the interval.
    pub source: TimeSource,
    /// The content substring the time was parsed from, for the content
    /// tiers. Used to strip the expression from the derived title.
    pub matched_text: Option<String>,
}

impl ResolvedInterval {
    /// Returns the interval duration in minutes.
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// One tier of the field-based resolution table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldTier {
    Api,
    Metadata,
}

type FieldExtractor = for<'a> fn(&'a TodoRecord) -> Option<&'a str>;

fn api_start(todo: &TodoRecord) -> Option<&str> {
    todo.start_date.as_deref()
}

fn api_end(todo: &TodoRecord) -> Option<&str> {
    todo.end_date.as_deref()
}

fn metadata_start(todo: &TodoRecord) -> Option<&str> {
    todo.metadata.as_ref().and_then(|m| m.start_date.as_deref())
}

fn metadata_end(todo: &TodoRecord) -> Option<&str> {
    todo.metadata.as_ref().and_then(|m| m.end_date.as_deref())
}

/// Candidate sources for the start slot, highest precedence first.
const START_FIELDS: [(FieldTier, FieldExtractor); 2] = [
    (FieldTier::Api, api_start),
    (FieldTier::Metadata, metadata_start),
];

/// Candidate sources for the end slot, highest precedence first.
const END_FIELDS: [(FieldTier, FieldExtractor); 2] = [
    (FieldTier::Api, api_end),
    (FieldTier::Metadata, metadata_end),
];

/// A slot filled from a field tier. `instant` is `None` when the field was
/// present but unparseable; the post-condition then substitutes the
/// creation instant.
#[derive(Debug, Clone, Copy)]
struct SlotFill {
    tier: FieldTier,
    instant: Option<DateTime<Utc>>,
}

/// Tries each field tier in order for one slot. A present, non-blank field
/// claims the slot even when its value does not parse.
fn fill_slot(
    todo: &TodoRecord,
    table: &[(FieldTier, FieldExtractor)],
    zone: &CivilZone,
) -> Option<SlotFill> {
    for (tier, extract) in table {
        if let Some(raw) = extract(todo) {
            if raw.trim().is_empty() {
                continue;
            }
            return Some(SlotFill {
                tier: *tier,
                instant: parse_instant(raw, zone),
            });
        }
    }
    None
}

/// Parses a timestamp string leniently.
///
/// RFC 3339 first; a naive "T"-separated datetime is interpreted as civil
/// time in the given zone, as is a bare date (at midnight).
pub fn parse_instant(raw: &str, zone: &CivilZone) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(raw, format) {
            return Some(zone.civil_to_utc(naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(zone.civil_to_utc(date.and_hms_opt(0, 0, 0).expect("valid midnight")));
    }
    None
}

/// Returns the creation instant for a record: `createdAt`, falling back to
/// `updatedAt`, falling back to the reference instant.
pub fn creation_instant(
    todo: &TodoRecord,
    reference_now: DateTime<Utc>,
    zone: &CivilZone,
) -> DateTime<Utc> {
    first_parseable(&[todo.created_at.as_deref(), todo.updated_at.as_deref()], zone)
        .unwrap_or(reference_now)
}

/// Returns the update instant for a record: `updatedAt`, falling back to
/// `createdAt`, falling back to the reference instant.
pub fn updated_instant(
    todo: &TodoRecord,
    reference_now: DateTime<Utc>,
    zone: &CivilZone,
) -> DateTime<Utc> {
    first_parseable(&[todo.updated_at.as_deref(), todo.created_at.as_deref()], zone)
        .unwrap_or(reference_now)
}

fn first_parseable(candidates: &[Option<&str>], zone: &CivilZone) -> Option<DateTime<Utc>> {
    candidates
        .iter()
        .flatten()
        .find_map(|raw| parse_instant(raw, zone))
}

/// Resolves the start/end interval for one todo record.
///
/// Priority order:
/// 1. Top-level `startDate`/`endDate`, each claiming its own slot.
/// 2. `metadata.startDate`/`metadata.endDate` for slots still open.
/// 3. If no slot was claimed at all, a time expression embedded in the
///    content: a range, a full date-time, or a bare clock time, interpreted
///    as wall-clock time in `zone` on the record's creation date.
/// 4. The creation instant, with a one hour duration.
///
/// The interval is corrected afterwards so that `end > start` always holds.
pub fn resolve(todo: &TodoRecord, reference_now: DateTime<Utc>, zone: &CivilZone) -> ResolvedInterval {
    let created = creation_instant(todo, reference_now, zone);

    let start_fill = fill_slot(todo, &START_FIELDS, zone);
    let end_fill = fill_slot(todo, &END_FIELDS, zone);

    let resolved = match (start_fill, end_fill) {
        (None, None) => resolve_from_content(todo.content_str(), created, zone),
        (start_fill, end_fill) => {
            let source = field_source(start_fill, end_fill);
            let start = start_fill.and_then(|f| f.instant).unwrap_or(created);
            let end = end_fill.and_then(|f| f.instant).unwrap_or(created);
            ResolvedInterval {
                start,
                end,
                source,
                matched_text: None,
            }
        }
    };

    enforce_positive_duration(resolved)
}

/// Derives the diagnostic tag for a field-tier resolution.
///
/// When the slots were claimed by different tiers, the API contribution
/// names the tag, since tier 1 is the dominant source.
fn field_source(start: Option<SlotFill>, end: Option<SlotFill>) -> TimeSource {
    match (start.map(|f| f.tier), end.map(|f| f.tier)) {
        (Some(FieldTier::Api), Some(FieldTier::Api)) => TimeSource::ApiBoth,
        (Some(FieldTier::Metadata), Some(FieldTier::Metadata)) => TimeSource::MetadataBoth,
        (Some(FieldTier::Api), Some(FieldTier::Metadata)) => TimeSource::ApiStartDate,
        (Some(FieldTier::Metadata), Some(FieldTier::Api)) => TimeSource::ApiEndDate,
        (Some(FieldTier::Api), None) => TimeSource::ApiStartDate,
        (Some(FieldTier::Metadata), None) => TimeSource::MetadataStartDate,
        (None, Some(FieldTier::Api)) => TimeSource::ApiEndDate,
        (None, Some(FieldTier::Metadata)) => TimeSource::MetadataEndDate,
        (None, None) => TimeSource::Default,
    }
}

/// Tries the content time patterns in order, stopping at the first match
/// with valid clock values.
///
/// The bare "H:MM" pattern is a substring of "YYYY-M-D H:MM", so the full
/// date-time pattern is tried before it; otherwise a dated expression would
/// always be misread as a bare time on the creation date.
fn resolve_from_content(
    content: &str,
    created: DateTime<Utc>,
    zone: &CivilZone,
) -> ResolvedInterval {
    let creation_date = zone.civil_date(created);

    if let Some(captures) = TIME_RANGE_RE.captures(content) {
        if let (Some(from), Some(to)) = (
            clock_time(&captures[1], &captures[2]),
            clock_time(&captures[3], &captures[4]),
        ) {
            let start = zone.civil_to_utc(creation_date.and_time(from));
            let mut end = zone.civil_to_utc(creation_date.and_time(to));
            if end <= start {
                // Overnight range: "23:30-0:15" ends the next day.
                end += Duration::days(1);
            }
            return ResolvedInterval {
                start,
                end,
                source: TimeSource::ContentTimeRange,
                matched_text: Some(captures[0].to_string()),
            };
        }
    }

    if let Some(captures) = DATE_TIME_RE.captures(content) {
        let date = NaiveDate::from_ymd_opt(
            captures[1].parse().unwrap_or(0),
            captures[2].parse().unwrap_or(0),
            captures[3].parse().unwrap_or(0),
        );
        if let (Some(date), Some(time)) = (date, clock_time(&captures[4], &captures[5])) {
            let start = zone.civil_to_utc(date.and_time(time));
            return ResolvedInterval {
                start,
                end: start + Duration::hours(1),
                source: TimeSource::ContentDateTime,
                matched_text: Some(captures[0].to_string()),
            };
        }
    }

    if let Some(captures) = SINGLE_TIME_RE.captures(content) {
        if let Some(time) = clock_time(&captures[1], &captures[2]) {
            let start = zone.civil_to_utc(creation_date.and_time(time));
            return ResolvedInterval {
                start,
                end: start + Duration::hours(1),
                source: TimeSource::ContentSingleTime,
                matched_text: Some(captures[0].to_string()),
            };
        }
    }

    ResolvedInterval {
        start: created,
        end: created + Duration::hours(1),
        source: TimeSource::Default,
        matched_text: None,
    }
}

fn clock_time(hour: &str, minute: &str) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(hour.parse().ok()?, minute.parse().ok()?, 0)
}

/// Final guarantee: every interval has strictly positive duration.
fn enforce_positive_duration(mut interval: ResolvedInterval) -> ResolvedInterval {
    if interval.end <= interval.start {
        interval.end = interval.start + Duration::hours(1);
    }
    interval
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::todo::TodoMetadata;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn now() -> DateTime<Utc> {
        utc(2024, 3, 1, 12, 0, 0)
    }

    fn zone() -> CivilZone {
        CivilZone::shanghai()
    }

    fn created_todo(content: &str) -> TodoRecord {
        TodoRecord::with_content(content).with_created_at("2024-01-14T00:00:00Z")
    }

    mod field_tiers {
        use super::*;

        #[test]
        fn api_fields_win_verbatim() {
            let todo = created_todo("9:00-10:00 irrelevant")
                .with_start_date("2024-01-20T02:00:00Z")
                .with_end_date("2024-01-20T04:00:00Z");

            let resolved = resolve(&todo, now(), &zone());
            assert_eq!(resolved.start, utc(2024, 1, 20, 2, 0, 0));
            assert_eq!(resolved.end, utc(2024, 1, 20, 4, 0, 0));
            assert_eq!(resolved.source, TimeSource::ApiBoth);
        }

        #[test]
        fn metadata_fills_open_slots() {
            let todo = created_todo("task").with_metadata(TodoMetadata {
                start_date: Some("2024-01-20T02:00:00Z".to_string()),
                end_date: Some("2024-01-20T03:30:00Z".to_string()),
            });

            let resolved = resolve(&todo, now(), &zone());
            assert_eq!(resolved.start, utc(2024, 1, 20, 2, 0, 0));
            assert_eq!(resolved.end, utc(2024, 1, 20, 3, 30, 0));
            assert_eq!(resolved.source, TimeSource::MetadataBoth);
        }

        #[test]
        fn api_start_does_not_yield_to_metadata_start() {
            let todo = created_todo("task")
                .with_start_date("2024-01-20T02:00:00Z")
                .with_metadata(TodoMetadata {
                    start_date: Some("2024-01-25T00:00:00Z".to_string()),
                    end_date: None,
                });

            let resolved = resolve(&todo, now(), &zone());
            assert_eq!(resolved.start, utc(2024, 1, 20, 2, 0, 0));
            assert_eq!(resolved.source, TimeSource::ApiStartDate);
        }

        #[test]
        fn mixed_tier_slots() {
            let todo = created_todo("task")
                .with_start_date("2024-01-20T02:00:00Z")
                .with_metadata(TodoMetadata {
                    start_date: None,
                    end_date: Some("2024-01-20T05:00:00Z".to_string()),
                });

            let resolved = resolve(&todo, now(), &zone());
            assert_eq!(resolved.start, utc(2024, 1, 20, 2, 0, 0));
            assert_eq!(resolved.end, utc(2024, 1, 20, 5, 0, 0));
            assert_eq!(resolved.source, TimeSource::ApiStartDate);
        }

        #[test]
        fn end_only_field() {
            let todo = created_todo("task").with_end_date("2024-01-20T05:00:00Z");

            let resolved = resolve(&todo, now(), &zone());
            // Start falls back to the creation instant.
            assert_eq!(resolved.start, utc(2024, 1, 14, 0, 0, 0));
            assert_eq!(resolved.end, utc(2024, 1, 20, 5, 0, 0));
            assert_eq!(resolved.source, TimeSource::ApiEndDate);
        }

        #[test]
        fn field_presence_blocks_content_parsing() {
            // A claimed start slot means the content tier never runs, even
            // though the content has a parseable range.
            let todo = created_todo("9:00-10:00 standup").with_start_date("2024-01-20T02:00:00Z");

            let resolved = resolve(&todo, now(), &zone());
            assert_eq!(resolved.source, TimeSource::ApiStartDate);
            assert_eq!(resolved.start, utc(2024, 1, 20, 2, 0, 0));
        }

        #[test]
        fn unparseable_field_claims_slot_and_falls_back() {
            let todo = created_todo("9:00-10:00 standup").with_start_date("not a date");

            let resolved = resolve(&todo, now(), &zone());
            // Slot claimed, value degraded to the creation instant.
            assert_eq!(resolved.start, utc(2024, 1, 14, 0, 0, 0));
            assert_eq!(resolved.end, utc(2024, 1, 14, 1, 0, 0));
            assert_eq!(resolved.source, TimeSource::ApiStartDate);
        }

        #[test]
        fn blank_field_is_absent() {
            let todo = created_todo("plain task").with_start_date("  ");

            let resolved = resolve(&todo, now(), &zone());
            assert_eq!(resolved.source, TimeSource::Default);
        }
    }

    mod content_patterns {
        use super::*;

        #[test]
        fn time_range_on_creation_date() {
            let todo = created_todo("9:00-10:00 standup");

            let resolved = resolve(&todo, now(), &zone());
            // 2024-01-14T00:00Z is 08:00 civil, so the creation date is
            // 2024-01-14; 09:00 civil is 01:00Z.
            assert_eq!(resolved.start, utc(2024, 1, 14, 1, 0, 0));
            assert_eq!(resolved.end, utc(2024, 1, 14, 2, 0, 0));
            assert_eq!(resolved.source, TimeSource::ContentTimeRange);
            assert_eq!(resolved.matched_text.as_deref(), Some("9:00-10:00"));
        }

        #[test]
        fn overnight_range_rolls_to_next_day() {
            let todo = created_todo("23:30-0:15 night shift");

            let resolved = resolve(&todo, now(), &zone());
            assert_eq!(resolved.start, utc(2024, 1, 14, 15, 30, 0));
            assert_eq!(resolved.end, utc(2024, 1, 14, 16, 15, 0));
            assert!(resolved.end > resolved.start);
            assert_eq!(resolved.duration_minutes(), 45);
            assert_eq!(resolved.source, TimeSource::ContentTimeRange);
        }

        #[test]
        fn full_date_time() {
            let todo = created_todo("2024-01-15 14:00 Meeting");

            let resolved = resolve(&todo, now(), &zone());
            // 14:00 civil on 2024-01-15 is 06:00Z.
            assert_eq!(resolved.start, utc(2024, 1, 15, 6, 0, 0));
            assert_eq!(resolved.end, utc(2024, 1, 15, 7, 0, 0));
            assert_eq!(resolved.source, TimeSource::ContentDateTime);
            assert_eq!(resolved.matched_text.as_deref(), Some("2024-01-15 14:00"));
        }

        #[test]
        fn single_digit_date_time() {
            let todo = created_todo("2024-1-5 9:30 dentist");

            let resolved = resolve(&todo, now(), &zone());
            assert_eq!(resolved.start, utc(2024, 1, 5, 1, 30, 0));
            assert_eq!(resolved.source, TimeSource::ContentDateTime);
        }

        #[test]
        fn single_time_gets_one_hour() {
            let todo = created_todo("call mom at 18:30");

            let resolved = resolve(&todo, now(), &zone());
            assert_eq!(resolved.start, utc(2024, 1, 14, 10, 30, 0));
            assert_eq!(resolved.end, utc(2024, 1, 14, 11, 30, 0));
            assert_eq!(resolved.source, TimeSource::ContentSingleTime);
        }

        #[test]
        fn range_precedes_date_time() {
            let todo = created_todo("2024-01-15 14:00-15:00 review");

            let resolved = resolve(&todo, now(), &zone());
            // The range pattern wins and uses the creation date.
            assert_eq!(resolved.source, TimeSource::ContentTimeRange);
            assert_eq!(resolved.start, utc(2024, 1, 14, 6, 0, 0));
            assert_eq!(resolved.end, utc(2024, 1, 14, 7, 0, 0));
        }

        #[test]
        fn invalid_clock_values_fall_through() {
            let todo = created_todo("99:99 nonsense");

            let resolved = resolve(&todo, now(), &zone());
            assert_eq!(resolved.source, TimeSource::Default);
            assert_eq!(resolved.start, utc(2024, 1, 14, 0, 0, 0));
        }

        #[test]
        fn invalid_date_falls_through_to_single_time() {
            let todo = created_todo("2024-13-45 14:00 typo");

            let resolved = resolve(&todo, now(), &zone());
            assert_eq!(resolved.source, TimeSource::ContentSingleTime);
            assert_eq!(resolved.start, utc(2024, 1, 14, 6, 0, 0));
        }
    }

    mod defaults_and_fallbacks {
        use super::*;

        #[test]
        fn no_time_anywhere_uses_creation() {
            let todo = created_todo("buy milk");

            let resolved = resolve(&todo, now(), &zone());
            assert_eq!(resolved.start, utc(2024, 1, 14, 0, 0, 0));
            assert_eq!(resolved.end, utc(2024, 1, 14, 1, 0, 0));
            assert_eq!(resolved.source, TimeSource::Default);
        }

        #[test]
        fn missing_created_at_uses_updated_at() {
            let todo = TodoRecord::with_content("task").with_updated_at("2024-02-01T00:00:00Z");

            let resolved = resolve(&todo, now(), &zone());
            assert_eq!(resolved.start, utc(2024, 2, 1, 0, 0, 0));
        }

        #[test]
        fn missing_both_timestamps_uses_reference_now() {
            let todo = TodoRecord::with_content("task");

            let resolved = resolve(&todo, now(), &zone());
            assert_eq!(resolved.start, now());
            assert_eq!(resolved.end, now() + Duration::hours(1));
        }

        #[test]
        fn inverted_field_interval_is_corrected() {
            let todo = created_todo("task")
                .with_start_date("2024-01-20T05:00:00Z")
                .with_end_date("2024-01-20T02:00:00Z");

            let resolved = resolve(&todo, now(), &zone());
            assert_eq!(resolved.start, utc(2024, 1, 20, 5, 0, 0));
            assert_eq!(resolved.end, utc(2024, 1, 20, 6, 0, 0));
        }

        #[test]
        fn positive_duration_holds_for_adversarial_inputs() {
            let cases = [
                TodoRecord::default(),
                TodoRecord::with_content(""),
                created_todo("0:00-0:00 zero"),
                created_todo("garbage").with_start_date("zzz").with_end_date("zzz"),
                TodoRecord::with_content("12:00").with_created_at("not a timestamp"),
                created_todo("task")
                    .with_start_date("2024-01-20T02:00:00Z")
                    .with_end_date("2024-01-20T02:00:00Z"),
            ];

            for todo in cases {
                let resolved = resolve(&todo, now(), &zone());
                assert!(
                    resolved.end > resolved.start,
                    "end must exceed start for {todo:?}"
                );
            }
        }
    }

    mod instants {
        use super::*;

        #[test]
        fn parses_rfc3339_with_offset() {
            let instant = parse_instant("2024-01-14T08:00:00+08:00", &zone()).unwrap();
            assert_eq!(instant, utc(2024, 1, 14, 0, 0, 0));
        }

        #[test]
        fn parses_naive_as_civil() {
            let instant = parse_instant("2024-01-14T08:00:00", &zone()).unwrap();
            assert_eq!(instant, utc(2024, 1, 14, 0, 0, 0));
        }

        #[test]
        fn parses_bare_date_as_civil_midnight() {
            let instant = parse_instant("2024-01-14", &zone()).unwrap();
            assert_eq!(instant, utc(2024, 1, 13, 16, 0, 0));
        }

        #[test]
        fn rejects_garbage() {
            assert_eq!(parse_instant("tomorrow-ish", &zone()), None);
        }

        #[test]
        fn updated_instant_falls_back_to_created() {
            let todo = TodoRecord::with_content("task").with_created_at("2024-01-14T00:00:00Z");
            assert_eq!(
                updated_instant(&todo, now(), &zone()),
                utc(2024, 1, 14, 0, 0, 0)
            );
        }
    }
}
