//! Bus events and their channels
//!
//! Every event belongs to exactly one named channel. The wire shape is the
//! one the relay files carry: an internally tagged JSON object whose
//! `type` field is the channel name and whose payload fields are
//! camelCase.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::{EntryId, ReportId};

/// Named channels events are published on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    /// A new room entry was registered
    #[serde(rename = "room-entry-added")]
    EntryAdded,
    /// An active room entry was closed
    #[serde(rename = "room-entry-exited")]
    EntryExited,
    /// Attendance statistics should be recomputed
    #[serde(rename = "room-stats-reload")]
    StatsReload,
    /// Schedule assignments changed
    #[serde(rename = "schedule-updated")]
    ScheduleUpdated,
    /// A report was created
    #[serde(rename = "report-created")]
    ReportCreated,
    /// A report was modified
    #[serde(rename = "report-updated")]
    ReportUpdated,
    /// A report was removed
    #[serde(rename = "report-deleted")]
    ReportDeleted,
    /// The notification feed changed
    #[serde(rename = "notifications-updated")]
    NotificationsUpdated,
}

impl Channel {
    /// The channel name used on the wire and as the relay file key
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::EntryAdded => "room-entry-added",
            Channel::EntryExited => "room-entry-exited",
            Channel::StatsReload => "room-stats-reload",
            Channel::ScheduleUpdated => "schedule-updated",
            Channel::ReportCreated => "report-created",
            Channel::ReportUpdated => "report-updated",
            Channel::ReportDeleted => "report-deleted",
            Channel::NotificationsUpdated => "notifications-updated",
        }
    }

    /// All channels, in declaration order
    pub fn all() -> [Channel; 8] {
        [
            Channel::EntryAdded,
            Channel::EntryExited,
            Channel::StatsReload,
            Channel::ScheduleUpdated,
            Channel::ReportCreated,
            Channel::ReportUpdated,
            Channel::ReportDeleted,
            Channel::NotificationsUpdated,
        ]
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "room-entry-added" => Ok(Channel::EntryAdded),
            "room-entry-exited" => Ok(Channel::EntryExited),
            "room-stats-reload" => Ok(Channel::StatsReload),
            "schedule-updated" => Ok(Channel::ScheduleUpdated),
            "report-created" => Ok(Channel::ReportCreated),
            "report-updated" => Ok(Channel::ReportUpdated),
            "report-deleted" => Ok(Channel::ReportDeleted),
            "notifications-updated" => Ok(Channel::NotificationsUpdated),
            _ => Err(format!("Invalid channel: {s}")),
        }
    }
}

/// An event carried by the bus
///
/// The `type` tag doubles as the channel name, so a relay file decodes
/// straight into the right dispatch target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RoomEvent {
    /// A new entry was registered in a room
    #[serde(rename = "room-entry-added", rename_all = "camelCase")]
    EntryAdded {
        /// Backend id of the new entry
        id: EntryId,
        /// Display name of the room entered
        room_name: String,
        /// Display name of the user who entered
        user_name: String,
    },
    /// An active entry was closed
    #[serde(rename = "room-entry-exited", rename_all = "camelCase")]
    EntryExited {
        /// Backend id of the closed entry
        id: EntryId,
        /// Display name of the room left
        room_name: String,
        /// Display name of the user who left
        user_name: String,
    },
    /// Attendance views should recompute their figures
    #[serde(rename = "room-stats-reload")]
    StatsReload,
    /// Schedule assignments changed
    #[serde(rename = "schedule-updated")]
    ScheduleUpdated,
    /// A report was created
    #[serde(rename = "report-created")]
    ReportCreated {
        /// Backend id of the report
        id: ReportId,
    },
    /// A report was modified
    #[serde(rename = "report-updated")]
    ReportUpdated {
        /// Backend id of the report
        id: ReportId,
    },
    /// A report was removed
    #[serde(rename = "report-deleted")]
    ReportDeleted {
        /// Backend id of the report
        id: ReportId,
    },
    /// The notification feed changed
    #[serde(rename = "notifications-updated")]
    NotificationsUpdated,
}

impl RoomEvent {
    /// The channel this event is delivered on
    pub fn channel(&self) -> Channel {
        match self {
            RoomEvent::EntryAdded { .. } => Channel::EntryAdded,
            RoomEvent::EntryExited { .. } => Channel::EntryExited,
            RoomEvent::StatsReload => Channel::StatsReload,
            RoomEvent::ScheduleUpdated => Channel::ScheduleUpdated,
            RoomEvent::ReportCreated { .. } => Channel::ReportCreated,
            RoomEvent::ReportUpdated { .. } => Channel::ReportUpdated,
            RoomEvent::ReportDeleted { .. } => Channel::ReportDeleted,
            RoomEvent::NotificationsUpdated => Channel::NotificationsUpdated,
        }
    }
}
