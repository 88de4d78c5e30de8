//! Entry/exit session state machine
//!
//! This module tracks the monitor's single open entry and drives its
//! transitions. An entry is validated against the caller's schedules before
//! it is registered; an exit has no schedule gate and goes straight to the
//! registration call. The local record is a mirror: whatever the backend
//! answers on registration wins, and any conflict triggers a re-fetch of
//! the authoritative state.
//!
//! Three guards keep the mirror honest under concurrent calls:
//!
//! - a local check refuses entries while another room's entry is open,
//!   without touching the network
//! - an in-flight flag turns overlapping attempts into no-ops instead of
//!   duplicate registrations
//! - an epoch counter lets a detached session discard responses that land
//!   after the caller has moved on

use crate::access::AccessValidator;
use crate::backend::{RegisterEntryRequest, RegisterExitRequest, RoomsBackend};
use crate::error::{BackendError, BackendResult};
use crate::messages;
use crate::model::{Entry, Room};
use crate::types::{AccessKind, EntryId, RoomId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Local mirror of the monitor's open entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveEntryInfo {
    /// Identifier of the open entry record
    pub entry_id: EntryId,
    /// Room the entry is in
    pub room: Room,
}

impl ActiveEntryInfo {
    fn from_entry(entry: &Entry) -> Self {
        Self {
            entry_id: entry.id,
            room: Room::new(entry.room, entry.room_label()),
        }
    }
}

/// Result of an entry or exit attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionOutcome {
    /// Whether the registration went through
    pub success: bool,
    /// Confirmation or refusal message, shown verbatim
    pub message: String,
    /// The registered record on success
    pub entry: Option<Entry>,
}

impl ActionOutcome {
    fn ok(message: impl Into<String>, entry: Entry) -> Self {
        Self {
            success: true,
            message: message.into(),
            entry: Some(entry),
        }
    }

    /// A refusal carrying the given message
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            entry: None,
        }
    }

    fn busy() -> Self {
        Self::rejected(messages::OPERATION_IN_PROGRESS)
    }
}

/// Clears the in-flight flag when the attempt finishes, however it finishes
struct FlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// State machine over the monitor's entries and exits
pub struct EntrySession {
    backend: Arc<dyn RoomsBackend>,
    validator: AccessValidator,
    state: Mutex<Option<ActiveEntryInfo>>,
    in_flight: AtomicBool,
    epoch: AtomicU64,
}

impl EntrySession {
    /// Create a session with no known open entry
    ///
    /// Used when the caller must not touch the network, for example for
    /// accounts that are denied room operations before any request is made.
    pub fn new(backend: Arc<dyn RoomsBackend>) -> Self {
        Self {
            validator: AccessValidator::new(backend.clone()),
            backend,
            state: Mutex::new(None),
            in_flight: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
        }
    }

    /// Create a session primed with the backend's view of the open entry
    pub async fn bootstrap(backend: Arc<dyn RoomsBackend>) -> BackendResult<Self> {
        let session = Self::new(backend);
        let active = session.backend.my_active_entry().await?;
        *session.state_guard() = active.as_ref().map(ActiveEntryInfo::from_entry);
        Ok(session)
    }

    fn state_guard(&self) -> MutexGuard<'_, Option<ActiveEntryInfo>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin_flight(&self) -> Option<FlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
            .then(|| FlightGuard {
                flag: &self.in_flight,
            })
    }

    fn epoch_now(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// The open entry this session knows about, if any
    pub fn active_entry(&self) -> Option<ActiveEntryInfo> {
        self.state_guard().clone()
    }

    /// Drop interest in responses that have not landed yet
    ///
    /// Called when the owning view goes away. Requests already in flight
    /// will complete against the backend, but their responses no longer
    /// mutate this session.
    pub fn detach(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        debug!("entry session detached, pending responses will be discarded");
    }

    /// Re-fetch the authoritative open entry from the backend
    pub async fn refresh(&self) -> BackendResult<Option<ActiveEntryInfo>> {
        let epoch = self.epoch_now();
        let active = self.backend.my_active_entry().await?;
        let info = active.as_ref().map(ActiveEntryInfo::from_entry);
        if self.epoch_now() == epoch {
            *self.state_guard() = info.clone();
        }
        Ok(info)
    }

    /// Validate and register an entry into the given room
    pub async fn attempt_entry(&self, room_id: RoomId, at: Option<DateTime<Utc>>) -> ActionOutcome {
        // Local refusals first, no network involved
        if let Some(active) = self.active_entry() {
            if active.room.id == room_id {
                return ActionOutcome::rejected(messages::ALREADY_IN_ROOM);
            }
            return ActionOutcome::rejected(messages::active_entry_elsewhere(&active.room.name));
        }

        let Some(_flight) = self.begin_flight() else {
            return ActionOutcome::busy();
        };
        let epoch = self.epoch_now();

        let decision = self
            .validator
            .validate_access(room_id, AccessKind::Entry, at)
            .await;
        if !decision.granted {
            return ActionOutcome::rejected(decision.reason);
        }

        let request = RegisterEntryRequest {
            room: room_id,
            entry_time: at,
        };
        match self.backend.register_entry(&request).await {
            Ok(entry) => {
                if self.epoch_now() == epoch {
                    *self.state_guard() = Some(ActiveEntryInfo::from_entry(&entry));
                }
                ActionOutcome::ok(messages::ENTRY_REGISTERED, entry)
            }
            Err(err) => self.registration_failed(err, epoch).await,
        }
    }

    /// Register an exit from the currently open entry
    ///
    /// Exits are never schedule-gated: having an open entry is the only
    /// precondition, so this goes straight to the registration call.
    pub async fn attempt_exit(&self, at: Option<DateTime<Utc>>) -> ActionOutcome {
        let Some(active) = self.active_entry() else {
            return ActionOutcome::rejected(messages::NO_ACTIVE_ENTRY);
        };

        let Some(_flight) = self.begin_flight() else {
            return ActionOutcome::busy();
        };
        let epoch = self.epoch_now();

        let request = RegisterExitRequest { exit_time: at };
        match self.backend.register_exit(active.entry_id, &request).await {
            Ok(entry) => {
                if self.epoch_now() == epoch {
                    *self.state_guard() = None;
                }
                ActionOutcome::ok(messages::EXIT_REGISTERED, entry)
            }
            Err(err) => self.registration_failed(err, epoch).await,
        }
    }

    /// Map a registration failure to an outcome, reconciling on conflicts
    async fn registration_failed(&self, err: BackendError, epoch: u64) -> ActionOutcome {
        if err.is_conflict() || err.is_not_found() {
            // The backend's picture of the open entry has drifted from ours
            warn!(error = %err, "registration conflict, re-fetching active entry");
            self.reconcile(epoch).await;
        }
        match err {
            BackendError::Rejected { message, .. } => ActionOutcome::rejected(message),
            BackendError::Transport(_) | BackendError::Decode(_) => {
                warn!(error = %err, "registration did not complete");
                ActionOutcome::rejected(messages::BACKEND_UNREACHABLE)
            }
        }
    }

    async fn reconcile(&self, epoch: u64) {
        match self.backend.my_active_entry().await {
            Ok(active) => {
                if self.epoch_now() == epoch {
                    *self.state_guard() = active.as_ref().map(ActiveEntryInfo::from_entry);
                }
            }
            Err(err) => {
                // Keep the local mirror; the next operation will conflict
                // again and retry the fetch
                warn!(error = %err, "active entry re-fetch failed");
            }
        }
    }
}

impl fmt::Debug for EntrySession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntrySession")
            .field("state", &self.state)
            .field("in_flight", &self.in_flight)
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}
