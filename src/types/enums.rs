//! Enumeration types for the room access engine
//!
//! This module contains the account roles recognized by the engine and the
//! access kinds accepted by the backend validation endpoint.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Roles an authenticated account can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Staff account that manages schedules and reviews attendance
    Admin,
    /// Lab monitor who physically enters and exits rooms
    Monitor,
}

impl Role {
    /// Whether this role is allowed to perform room operations
    ///
    /// Room entry, exit, and access checks are reserved for monitors. The
    /// match is exhaustive on purpose: introducing a new role forces an
    /// explicit decision here instead of silently inheriting either answer.
    pub fn may_operate_rooms(self) -> bool {
        match self {
            Role::Monitor => true,
            Role::Admin => false,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Monitor => write!(f, "monitor"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" | "administrator" => Ok(Role::Admin),
            "monitor" => Ok(Role::Monitor),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// Direction of a room access being validated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessKind {
    /// Entering a room
    Entry,
    /// Leaving a room
    Exit,
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessKind::Entry => write!(f, "entry"),
            AccessKind::Exit => write!(f, "exit"),
        }
    }
}

impl FromStr for AccessKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "entry" | "enter" => Ok(AccessKind::Entry),
            "exit" | "leave" => Ok(AccessKind::Exit),
            _ => Err(format!("Unknown access kind: {}", s)),
        }
    }
}
