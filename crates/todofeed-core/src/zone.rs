//! Civil timezone used for wall-clock interpretation.
//!
//! Clock times embedded in todo content ("9:00-10:00") are wall-clock times
//! in a fixed civil zone, not in the server's local zone or UTC. The zone is
//! an explicit value threaded through the resolver, encoder and assembler so
//! the engine stays pure and independently testable.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

/// A fixed-offset civil timezone with the identifiers needed for the
/// calendar envelope's VTIMEZONE declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CivilZone {
    /// IANA-style timezone identifier (e.g., "Asia/Shanghai").
    pub tzid: String,
    /// Short zone name (e.g., "CST").
    pub tzname: String,
    /// The fixed UTC offset.
    pub offset: FixedOffset,
}

impl Default for CivilZone {
    fn default() -> Self {
        Self::shanghai()
    }
}

impl CivilZone {
    /// Creates a civil zone from an identifier, short name and offset.
    pub fn new(tzid: impl Into<String>, tzname: impl Into<String>, offset: FixedOffset) -> Self {
        Self {
            tzid: tzid.into(),
            tzname: tzname.into(),
            offset,
        }
    }

    /// The default deployment zone: Asia/Shanghai, UTC+8.
    pub fn shanghai() -> Self {
        Self::new(
            "Asia/Shanghai",
            "CST",
            FixedOffset::east_opt(8 * 3600).expect("valid offset"),
        )
    }

    /// Interprets a naive civil datetime in this zone and returns the UTC
    /// instant.
    pub fn civil_to_utc(&self, naive: NaiveDateTime) -> DateTime<Utc> {
        self.offset
            .from_local_datetime(&naive)
            .single()
            .expect("fixed offsets are unambiguous")
            .with_timezone(&Utc)
    }

    /// Returns the civil calendar date of a UTC instant in this zone.
    pub fn civil_date(&self, instant: DateTime<Utc>) -> chrono::NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// Renders the offset in the basic form used by TZOFFSETFROM/TZOFFSETTO
    /// (e.g., "+0800").
    pub fn offset_basic(&self) -> String {
        let secs = self.offset.local_minus_utc();
        let sign = if secs < 0 { '-' } else { '+' };
        let abs = secs.abs();
        format!("{}{:02}{:02}", sign, abs / 3600, (abs % 3600) / 60)
    }

    /// Renders an instant as a human-readable civil time in this zone, for
    /// diagnostic text (e.g., "2024-01-14 08:00 +08:00").
    pub fn render_civil(&self, instant: DateTime<Utc>) -> String {
        instant
            .with_timezone(&self.offset)
            .format("%Y-%m-%d %H:%M %:z")
            .to_string()
    }
}
