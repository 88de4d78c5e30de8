//! Domain records exchanged with the scheduling backend
//!
//! This module contains the User, Room, Schedule, and Entry records as the
//! backend serializes them. Timestamps are UTC instants on the wire; any
//! conversion to a local wall clock happens at the attendance layer where
//! day boundaries matter.

use crate::types::{EntryId, Role, RoomId, ScheduleId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An authenticated account known to the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier for the account
    pub id: UserId,
    /// Login name, also used in event payloads shown to other sessions
    pub username: String,
    /// Role deciding whether room operations are allowed
    pub role: Role,
    /// Whether the account finished identity verification
    #[serde(default)]
    pub verified: bool,
}

impl User {
    /// Create a new user record
    pub fn new(id: UserId, username: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            username: username.into(),
            role,
            verified: false,
        }
    }

    /// Create a new verified monitor, the common case in room operations
    pub fn monitor(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            role: Role::Monitor,
            verified: true,
        }
    }
}

/// A physical lab room that monitors staff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// Unique identifier for the room
    pub id: RoomId,
    /// Human-readable name of the room
    pub name: String,
}

impl Room {
    /// Create a new room record
    pub fn new(id: RoomId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A shift window assigning a monitor to a room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// Unique identifier for the schedule
    pub id: ScheduleId,
    /// Monitor the shift belongs to
    pub user: UserId,
    /// Room the shift covers
    pub room: RoomId,
    /// When the shift window opens
    pub start_datetime: DateTime<Utc>,
    /// When the shift window closes
    pub end_datetime: DateTime<Utc>,
    /// Room name the backend denormalizes into the serializer, if present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_name: Option<String>,
}

impl Schedule {
    /// Whether the given instant falls inside this shift window
    pub fn window_contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start_datetime && at <= self.end_datetime
    }
}

/// One entry/exit record for a monitor in a room
///
/// An entry is active while `exit_time` is `None`. The backend enforces at
/// most one active entry per user; the engine mirrors that record locally
/// and treats the backend's responses as authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Unique identifier for the record
    pub id: EntryId,
    /// Room that was entered
    pub room: RoomId,
    /// Monitor who entered
    pub user: UserId,
    /// Instant the entry was registered
    pub entry_time: DateTime<Utc>,
    /// Instant the exit was registered, `None` while still inside
    #[serde(default)]
    pub exit_time: Option<DateTime<Utc>>,
    /// Room name the backend denormalizes into the serializer, if present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_name: Option<String>,
    /// Username the backend denormalizes into the serializer, if present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

impl Entry {
    /// Create an open entry record
    pub fn active(id: EntryId, room: RoomId, user: UserId, entry_time: DateTime<Utc>) -> Self {
        Self {
            id,
            room,
            user,
            entry_time,
            exit_time: None,
            room_name: None,
            user_name: None,
        }
    }

    /// Create a closed entry record
    pub fn closed(
        id: EntryId,
        room: RoomId,
        user: UserId,
        entry_time: DateTime<Utc>,
        exit_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            room,
            user,
            entry_time,
            exit_time: Some(exit_time),
            room_name: None,
            user_name: None,
        }
    }

    /// Whether the entry is still open
    pub fn is_active(&self) -> bool {
        self.exit_time.is_none()
    }

    /// Room name for user-facing messages, falling back to the numeric ID
    pub fn room_label(&self) -> String {
        match &self.room_name {
            Some(name) => name.clone(),
            None => format!("sala {}", self.room),
        }
    }
}
