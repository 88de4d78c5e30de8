//! Cross-process event relay
//!
//! Processes of the same origin share state changes through a relay store:
//! each publish writes the latest record for its channel, and every other
//! process polls the store and dispatches what it has not seen yet. The
//! store keeps one record per channel, so a reader catching up sees the
//! most recent event on each channel rather than a backlog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::bus::event::{Channel, RoomEvent};
use crate::error::RelayError;
use crate::types::OriginId;

/// One relayed event as written to the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayRecord {
    /// Channel the event belongs to
    pub channel: Channel,
    /// The event payload
    pub event: RoomEvent,
    /// Process that published the event
    pub origin: OriginId,
    /// Publisher-local sequence number, monotonic per origin
    pub seq: u64,
    /// Instant the record was written
    pub sent_at: DateTime<Utc>,
}

/// Storage shared between processes of the same origin
///
/// `store` replaces the record for the event's channel. `load_all` returns
/// the latest record per channel, in no particular order.
pub trait RelayStore: Send + Sync {
    /// Write a record, replacing the previous one on the same channel
    fn store(&self, record: &RelayRecord) -> Result<(), RelayError>;

    /// Read the latest record of every channel that has one
    fn load_all(&self) -> Result<Vec<RelayRecord>, RelayError>;
}

/// Relay store backed by one JSON file per channel
///
/// Writes go to a temporary file first and are moved into place with a
/// rename, so readers never observe a half-written record.
#[derive(Debug, Clone)]
pub struct FileRelayStore {
    dir: PathBuf,
}

impl FileRelayStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, RelayError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn channel_path(&self, channel: Channel) -> PathBuf {
        self.dir.join(format!("{}.json", channel.as_str()))
    }

    fn read_record(&self, path: &Path) -> Option<RelayRecord> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Skipping unreadable relay file");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Skipping corrupt relay file");
                None
            }
        }
    }
}

impl RelayStore for FileRelayStore {
    fn store(&self, record: &RelayRecord) -> Result<(), RelayError> {
        let path = self.channel_path(record.channel);
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_string_pretty(record)?;
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<RelayRecord>, RelayError> {
        let mut records = Vec::new();
        for channel in Channel::all() {
            if let Some(record) = self.read_record(&self.channel_path(channel)) {
                records.push(record);
            }
        }
        Ok(records)
    }
}
