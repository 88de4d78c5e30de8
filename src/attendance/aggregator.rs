//! Attendance aggregation over entry records
//!
//! Minutes are summed per reporting period by clamping each entry's
//! interval to the period bounds, in the reporting timezone. Open entries
//! count up to the supplied "now". Late arrivals compare the entry instant
//! against the schedule window that covers the same local day, with a
//! configurable grace period.

use crate::attendance::ranges::{format_hm, TimeRange};
use crate::model::{Entry, Schedule};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Serialize;

/// Attendance totals for one reporting period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendancePeriod {
    /// The local-time window the totals cover
    pub range: TimeRange,
    /// Minutes spent inside rooms within the window
    pub total_minutes: i64,
    /// Entries contributing at least one minute to the window
    pub entry_count: usize,
    /// Entries that started more than the grace period after their shift
    pub late_count: usize,
}

impl AttendancePeriod {
    /// The total rendered the way the UI shows durations
    pub fn formatted_total(&self) -> String {
        format_hm(self.total_minutes)
    }
}

/// Minutes the entry contributes to the range, clamped on both ends
fn clamped_minutes<Tz: TimeZone>(
    entry: &Entry,
    range: &TimeRange,
    tz: &Tz,
    now: DateTime<Utc>,
) -> i64 {
    let start = entry.entry_time.with_timezone(tz).naive_local();
    let end = entry
        .exit_time
        .unwrap_or(now)
        .with_timezone(tz)
        .naive_local();

    let clamped_start = start.max(range.start);
    let clamped_end = end.min(range.end);
    if clamped_end > clamped_start {
        (clamped_end - clamped_start).num_minutes()
    } else {
        0
    }
}

/// Sum the minutes all entries contribute to the range
pub fn sum_minutes<Tz: TimeZone>(
    entries: &[Entry],
    range: &TimeRange,
    tz: &Tz,
    now: DateTime<Utc>,
) -> i64 {
    entries
        .iter()
        .map(|entry| clamped_minutes(entry, range, tz, now))
        .sum()
}

/// The schedule an entry is held against
///
/// Candidates share the entry's user and room and their window covers the
/// entry's local calendar day. With several candidates the earliest
/// `start_datetime` wins, so the first shift of the day sets the bar.
fn matching_schedule<'s, Tz: TimeZone>(
    entry: &Entry,
    schedules: &'s [Schedule],
    tz: &Tz,
) -> Option<&'s Schedule> {
    let entry_day = entry.entry_time.with_timezone(tz).date_naive();
    schedules
        .iter()
        .filter(|s| s.user == entry.user && s.room == entry.room)
        .filter(|s| {
            let first_day = s.start_datetime.with_timezone(tz).date_naive();
            let last_day = s.end_datetime.with_timezone(tz).date_naive();
            first_day <= entry_day && entry_day <= last_day
        })
        .min_by_key(|s| s.start_datetime)
}

/// Entries in the range that started late against their schedule
///
/// An arrival counts as late when it lands at least `grace_minutes` after
/// the matched shift start. Entries with no matching schedule are never
/// late.
pub fn late_arrivals<'e, Tz: TimeZone>(
    entries: &'e [Entry],
    schedules: &[Schedule],
    range: &TimeRange,
    tz: &Tz,
    grace_minutes: i64,
) -> Vec<&'e Entry> {
    let grace = Duration::minutes(grace_minutes);
    entries
        .iter()
        .filter(|entry| range.contains(entry.entry_time.with_timezone(tz).naive_local()))
        .filter(|entry| match matching_schedule(entry, schedules, tz) {
            Some(schedule) => entry.entry_time - schedule.start_datetime >= grace,
            None => false,
        })
        .collect()
}

/// Aggregate one reporting period out of entries and schedules
pub fn period_summary<Tz: TimeZone>(
    entries: &[Entry],
    schedules: &[Schedule],
    range: &TimeRange,
    tz: &Tz,
    grace_minutes: i64,
    now: DateTime<Utc>,
) -> AttendancePeriod {
    let total_minutes = sum_minutes(entries, range, tz, now);
    let entry_count = entries
        .iter()
        .filter(|entry| clamped_minutes(entry, range, tz, now) > 0)
        .count();
    let late_count = late_arrivals(entries, schedules, range, tz, grace_minutes).len();

    AttendancePeriod {
        range: *range,
        total_minutes,
        entry_count,
        late_count,
    }
}
