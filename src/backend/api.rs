//! Backend contract for room access and attendance data
//!
//! This module defines the [`RoomsBackend`] trait the rest of the engine
//! programs against, together with the request and response bodies of each
//! endpoint. Field names match the REST wire format; the one camelCase
//! holdout (`canAccess`) is renamed at the serde boundary so the rest of the
//! crate stays snake_case.

use crate::error::BackendResult;
use crate::model::{Entry, Schedule};
use crate::types::{AccessKind, EntryId, RoomId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Request body for `POST /schedule/schedules/validate_room_access/`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidateAccessRequest {
    /// Room the caller wants to enter or leave
    pub room_id: RoomId,
    /// Whether this validates an entry or an exit
    pub access_type: AccessKind,
    /// Instant to validate against, omitted to use the server clock
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_datetime: Option<DateTime<Utc>>,
}

/// Response body of the validation endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidateAccessResponse {
    /// Verdict of the schedule check
    pub access_granted: bool,
    /// Denial reason, present when access was not granted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Schedule that matched, present when access was granted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
}

/// Request body for `POST /rooms/entry/`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegisterEntryRequest {
    /// Room being entered
    pub room: RoomId,
    /// Entry instant, omitted to use the server clock
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_time: Option<DateTime<Utc>>,
}

/// Request body for `PATCH /rooms/entry/{id}/exit/`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegisterExitRequest {
    /// Exit instant, omitted to use the server clock
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_time: Option<DateTime<Utc>>,
}

/// Response body of `GET /rooms/{id}/access/`
///
/// The backend serializes this one field in camelCase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomAccessCheck {
    /// Whether the caller could enter the room right now
    #[serde(rename = "canAccess")]
    pub can_access: bool,
    /// Denial reason, present when access is not possible
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Schedule backing the verdict, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
}

/// Filters accepted by the admin entry listing endpoint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryFilter {
    /// Restrict to one monitor
    pub user: Option<UserId>,
    /// Restrict to one room
    pub room: Option<RoomId>,
    /// Restrict to open or closed entries
    pub active: Option<bool>,
    /// Earliest entry date, inclusive
    pub start_date: Option<NaiveDate>,
    /// Latest entry date, inclusive
    pub end_date: Option<NaiveDate>,
    /// Match the monitor's identity document
    pub document: Option<String>,
    /// Page number for paginated listings
    pub page: Option<u32>,
}

impl EntryFilter {
    /// Render the filter as query string pairs, omitting unset fields
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(user) = self.user {
            pairs.push(("user", user.to_string()));
        }
        if let Some(room) = self.room {
            pairs.push(("room", room.to_string()));
        }
        if let Some(active) = self.active {
            pairs.push(("active", active.to_string()));
        }
        if let Some(start_date) = self.start_date {
            pairs.push(("start_date", start_date.format("%Y-%m-%d").to_string()));
        }
        if let Some(end_date) = self.end_date {
            pairs.push(("end_date", end_date.format("%Y-%m-%d").to_string()));
        }
        if let Some(document) = &self.document {
            pairs.push(("document", document.clone()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        pairs
    }
}

/// Operations the scheduling backend exposes to the engine
///
/// The engine never reads or writes attendance state anywhere else; every
/// grant, entry, and exit round-trips through one of these calls. Test
/// suites substitute a scripted implementation behind the same trait.
#[async_trait]
pub trait RoomsBackend: Send + Sync {
    /// Validate a room access attempt against the caller's schedules
    async fn validate_room_access(
        &self,
        request: &ValidateAccessRequest,
    ) -> BackendResult<ValidateAccessResponse>;

    /// Register a room entry for the caller
    async fn register_entry(&self, request: &RegisterEntryRequest) -> BackendResult<Entry>;

    /// Close the given entry with an exit
    async fn register_exit(
        &self,
        entry_id: EntryId,
        request: &RegisterExitRequest,
    ) -> BackendResult<Entry>;

    /// Ask whether the caller could enter the room right now
    async fn room_access(&self, room_id: RoomId) -> BackendResult<RoomAccessCheck>;

    /// List the caller's schedules
    async fn my_schedules(&self) -> BackendResult<Vec<Schedule>>;

    /// List the caller's entry history
    async fn my_entries(&self) -> BackendResult<Vec<Entry>>;

    /// Fetch the caller's open entry, if any
    async fn my_active_entry(&self) -> BackendResult<Option<Entry>>;

    /// List entries across monitors, admin only
    async fn entries(&self, filter: &EntryFilter) -> BackendResult<Vec<Entry>>;
}
