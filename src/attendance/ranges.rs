//! Calendar ranges for attendance reporting
//!
//! Reporting periods are defined on the local wall clock: a week runs from
//! Monday 00:00:00.000 to Sunday 23:59:59.999, a month from the first to
//! the last day of the calendar month. Entries are stored as UTC instants,
//! so the aggregator converts them to the reporting timezone before testing
//! them against these bounds.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Inclusive local-time window of one reporting period
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeRange {
    /// First instant of the period
    pub start: NaiveDateTime,
    /// Last instant of the period
    pub end: NaiveDateTime,
}

impl TimeRange {
    /// Whether the local instant falls inside the period
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        at >= self.start && at <= self.end
    }
}

fn day_start(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(0, 0, 0).unwrap()
}

fn day_end(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_milli_opt(23, 59, 59, 999).unwrap()
}

/// The Monday-to-Sunday week containing the given date
pub fn week_range(date: NaiveDate) -> TimeRange {
    let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
    TimeRange {
        start: day_start(monday),
        end: day_end(monday + Duration::days(6)),
    }
}

/// The calendar month containing the given date
pub fn month_range(date: NaiveDate) -> TimeRange {
    let first = date.with_day(1).unwrap();
    let (next_year, next_month) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    let last = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .unwrap()
        .pred_opt()
        .unwrap();
    TimeRange {
        start: day_start(first),
        end: day_end(last),
    }
}

/// Render a minute total the way the UI shows durations, e.g. "8 h 00 min"
pub fn format_hm(total_minutes: i64) -> String {
    let total = total_minutes.max(0);
    format!("{} h {:02} min", total / 60, total % 60)
}
