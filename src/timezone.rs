//! Timezone conversion between a user's wall-clock schedule and UTC instants.
//!
//! All functions are pure given their inputs and the bundled IANA tzdata.
//! Zoned construction goes through `chrono-tz`, so offsets and DST
//! transitions come from the database rather than manual arithmetic.
//!
//! DST policy for local times that do not map to exactly one instant:
//! - nonexistent (spring-forward gap): interpreted with the offset in force
//!   before the gap, which lands the same distance past the transition;
//! - ambiguous (fall-back overlap): the earlier instant.

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::error::{PlannerError, Result};
use crate::habits::Weekday;

/// Local time used when a habit or substep has no explicit time.
pub const DEFAULT_LOCAL_TIME: (u32, u32) = (9, 0);

/// Parse an IANA zone name such as `"America/New_York"`.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| PlannerError::InvalidTimezone(name.to_owned()))
}

/// Resolve a zone, degrading to UTC with a warning when it is missing or
/// unrecognised. Use only where degradation is the documented behavior.
pub fn timezone_or_utc(name: Option<&str>) -> Tz {
    match name {
        None => Tz::UTC,
        Some(raw) => parse_timezone(raw).unwrap_or_else(|e| {
            warn!("{e}; falling back to UTC");
            Tz::UTC
        }),
    }
}

/// "Today" as a calendar date in the given zone.
pub fn current_local_date(timezone: &str) -> Result<NaiveDate> {
    local_date_at(Utc::now(), timezone)
}

/// The calendar date `instant` falls on in `timezone`.
pub fn local_date_at(instant: DateTime<Utc>, timezone: &str) -> Result<NaiveDate> {
    let tz = parse_timezone(timezone)?;
    Ok(instant.with_timezone(&tz).date_naive())
}

/// Parse a strict 24-hour `HH:MM` local time.
pub fn parse_local_time(raw: &str) -> Result<NaiveTime> {
    let trimmed = raw.trim();
    let bytes = trimmed.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return Err(PlannerError::InvalidTimeFormat(raw.to_owned()));
    }
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .map_err(|_| PlannerError::InvalidTimeFormat(raw.to_owned()))
}

/// Default local time for unscheduled events.
pub fn default_local_time() -> NaiveTime {
    let (hour, min) = DEFAULT_LOCAL_TIME;
    NaiveTime::from_hms_opt(hour, min, 0).unwrap_or(NaiveTime::MIN)
}

/// Combine a local date and time in `timezone` into the equivalent UTC instant.
pub fn local_to_utc(date: NaiveDate, time: NaiveTime, timezone: &str) -> Result<DateTime<Utc>> {
    let tz = parse_timezone(timezone)?;
    Ok(local_to_utc_in(date, time, tz))
}

/// [`local_to_utc`] for an already-parsed zone.
pub fn local_to_utc_in(date: NaiveDate, time: NaiveTime, tz: Tz) -> DateTime<Utc> {
    let local = date.and_time(time);
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => resolve_gap(local, tz),
    }
}

/// Map a wall-clock time inside a DST gap using the offset in force just
/// before the gap.
fn resolve_gap(local: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    let probe = local - Duration::hours(24);
    let offset_secs = match tz.from_local_datetime(&probe).earliest() {
        Some(before) => before.offset().fix().local_minus_utc(),
        None => {
            warn!("no usable offset before gap at {local} in {tz}; treating as UTC");
            0
        }
    };
    (local - Duration::seconds(i64::from(offset_secs))).and_utc()
}

/// Wall-clock date and time of `instant` in `timezone`.
pub fn utc_to_local(instant: DateTime<Utc>, timezone: &str) -> Result<NaiveDateTime> {
    let tz = parse_timezone(timezone)?;
    Ok(instant.with_timezone(&tz).naive_local())
}

/// Weekday of `date` read at local noon in `timezone`.
///
/// Noon keeps the answer away from midnight-adjacent DST transitions.
pub fn weekday_of(date: NaiveDate, timezone: &str) -> Result<Weekday> {
    let tz = parse_timezone(timezone)?;
    Ok(weekday_of_in(date, tz))
}

/// [`weekday_of`] for an already-parsed zone.
pub fn weekday_of_in(date: NaiveDate, tz: Tz) -> Weekday {
    let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN);
    let instant = local_to_utc_in(date, noon, tz);
    Weekday::from(instant.with_timezone(&tz).weekday())
}

/// Offset an instant by whole minutes.
pub fn add_minutes(instant: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
    instant + Duration::minutes(minutes)
}

/// ISO-8601 week key (`2026-W42`) of the week containing `date`.
pub fn iso_week_key(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}
