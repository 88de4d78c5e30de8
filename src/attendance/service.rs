//! Attendance reporting service
//!
//! Fetches the caller's entries and schedules from the backend and reduces
//! them to weekly or monthly totals in a reporting timezone.

use crate::attendance::aggregator::{period_summary, AttendancePeriod};
use crate::attendance::ranges::{month_range, week_range, TimeRange};
use crate::backend::RoomsBackend;
use crate::error::BackendResult;
use chrono::{NaiveDate, TimeZone, Utc};
use std::fmt;
use std::sync::Arc;

/// Produces attendance summaries from backend data
pub struct AttendanceService {
    backend: Arc<dyn RoomsBackend>,
    grace_minutes: i64,
}

impl AttendanceService {
    /// Create a service reporting against the given backend
    pub fn new(backend: Arc<dyn RoomsBackend>, grace_minutes: i64) -> Self {
        Self {
            backend,
            grace_minutes,
        }
    }

    /// Summarize the week containing `reference` in the given timezone
    pub async fn week_summary<Tz: TimeZone>(
        &self,
        reference: NaiveDate,
        tz: &Tz,
    ) -> BackendResult<AttendancePeriod> {
        self.summarize(week_range(reference), tz).await
    }

    /// Summarize the calendar month containing `reference`
    pub async fn month_summary<Tz: TimeZone>(
        &self,
        reference: NaiveDate,
        tz: &Tz,
    ) -> BackendResult<AttendancePeriod> {
        self.summarize(month_range(reference), tz).await
    }

    async fn summarize<Tz: TimeZone>(
        &self,
        range: TimeRange,
        tz: &Tz,
    ) -> BackendResult<AttendancePeriod> {
        let entries = self.backend.my_entries().await?;
        let schedules = self.backend.my_schedules().await?;
        Ok(period_summary(
            &entries,
            &schedules,
            &range,
            tz,
            self.grace_minutes,
            Utc::now(),
        ))
    }
}

impl fmt::Debug for AttendanceService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttendanceService")
            .field("grace_minutes", &self.grace_minutes)
            .finish_non_exhaustive()
    }
}
