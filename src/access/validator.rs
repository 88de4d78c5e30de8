//! Schedule-based access validation
//!
//! This module wraps the backend's validation endpoints behind a fail-closed
//! surface: whatever goes wrong on the wire, the caller gets a denial, never
//! an error to mishandle into a grant. Reasons sent by the backend pass
//! through verbatim; engine-side failures use the fixed strings in
//! [`crate::messages`].

use crate::backend::{RoomsBackend, ValidateAccessRequest};
use crate::messages;
use crate::model::Schedule;
use crate::types::{AccessKind, RoomId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Verdict of a validation call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessDecision {
    /// Whether the access may proceed
    pub granted: bool,
    /// Reason shown to the user when denied, empty on most grants
    pub reason: String,
    /// Schedule that matched, present on grants when the backend sends it
    pub schedule: Option<Schedule>,
}

impl AccessDecision {
    /// A denial carrying the given reason
    pub fn denied(reason: impl Into<String>) -> Self {
        Self {
            granted: false,
            reason: reason.into(),
            schedule: None,
        }
    }
}

/// Verdict of a passive room access check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomAccessSummary {
    /// Whether the room could be entered right now
    pub can_access: bool,
    /// Reason shown to the user when access is not possible
    pub reason: String,
    /// Schedule backing the verdict, if any
    pub schedule: Option<Schedule>,
}

impl RoomAccessSummary {
    /// A denial carrying the given reason
    pub fn denied(reason: impl Into<String>) -> Self {
        Self {
            can_access: false,
            reason: reason.into(),
            schedule: None,
        }
    }
}

/// Fail-closed view of the backend's schedule validation
pub struct AccessValidator {
    backend: Arc<dyn RoomsBackend>,
}

impl AccessValidator {
    /// Create a validator over the given backend
    pub fn new(backend: Arc<dyn RoomsBackend>) -> Self {
        Self { backend }
    }

    /// Validate an entry or exit against the caller's schedules
    ///
    /// Transport failures, server errors, and undecodable responses all
    /// come back as a denial with [`messages::VALIDATION_ERROR`]. A denial
    /// without a backend reason falls back to the no-schedule message.
    pub async fn validate_access(
        &self,
        room_id: RoomId,
        kind: AccessKind,
        at: Option<DateTime<Utc>>,
    ) -> AccessDecision {
        let request = ValidateAccessRequest {
            room_id,
            access_type: kind,
            access_datetime: at,
        };

        match self.backend.validate_room_access(&request).await {
            Ok(response) if response.access_granted => AccessDecision {
                granted: true,
                reason: response.reason.unwrap_or_default(),
                schedule: response.schedule,
            },
            Ok(response) => AccessDecision::denied(
                response
                    .reason
                    .unwrap_or_else(|| messages::NO_SCHEDULE_FOR_ROOM.to_string()),
            ),
            Err(err) => {
                warn!(
                    room_id = %room_id,
                    category = err.category(),
                    error = %err,
                    "access validation failed, denying"
                );
                AccessDecision::denied(messages::VALIDATION_ERROR)
            }
        }
    }

    /// Ask whether the room could be entered right now
    ///
    /// Same fail-closed posture as [`validate_access`](Self::validate_access).
    pub async fn can_access_room(&self, room_id: RoomId) -> RoomAccessSummary {
        match self.backend.room_access(room_id).await {
            Ok(check) => RoomAccessSummary {
                can_access: check.can_access,
                reason: check.reason.unwrap_or_default(),
                schedule: check.schedule,
            },
            Err(err) => {
                warn!(
                    room_id = %room_id,
                    category = err.category(),
                    error = %err,
                    "room access check failed, denying"
                );
                RoomAccessSummary::denied(messages::VALIDATION_ERROR)
            }
        }
    }

    /// All schedules assigned to the caller
    ///
    /// Listing failures degrade to an empty list rather than an error.
    pub async fn my_schedules(&self) -> Vec<Schedule> {
        match self.backend.my_schedules().await {
            Ok(schedules) => schedules,
            Err(err) => {
                warn!(error = %err, "schedule listing failed");
                Vec::new()
            }
        }
    }

    /// The caller's schedules covering the given room
    pub async fn schedules_for_room(&self, room_id: RoomId) -> Vec<Schedule> {
        self.my_schedules()
            .await
            .into_iter()
            .filter(|s| s.room == room_id)
            .collect()
    }

    /// Whether the caller holds any schedule in the given room
    pub async fn has_schedule_in_room(&self, room_id: RoomId) -> bool {
        !self.schedules_for_room(room_id).await.is_empty()
    }
}

impl fmt::Debug for AccessValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessValidator").finish_non_exhaustive()
    }
}
