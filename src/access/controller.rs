//! Role-gated orchestration of room operations
//!
//! The controller is the surface views talk to. Every operation runs the
//! same role decision first: accounts without room rights are answered
//! locally, with no backend traffic. Operations that change state publish
//! the matching bus events so every open view reacts.

use crate::access::validator::{AccessDecision, AccessValidator, RoomAccessSummary};
use crate::backend::RoomsBackend;
use crate::bus::{EventBus, RoomEvent};
use crate::entry::{ActionOutcome, ActiveEntryInfo, EntrySession};
use crate::error::BackendResult;
use crate::messages;
use crate::model::{Schedule, User};
use crate::types::{AccessKind, RoomId};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use tracing::{info, instrument};

/// Session façade over validation, entry state and event publication
pub struct AccessController {
    user: User,
    validator: AccessValidator,
    session: EntrySession,
    bus: Arc<EventBus>,
}

impl AccessController {
    /// Build a controller for the signed-in user
    ///
    /// Monitors get their open entry primed from the backend. Accounts
    /// without room rights skip that fetch; every operation would refuse
    /// them before reaching the network anyway.
    pub async fn bootstrap(
        user: User,
        backend: Arc<dyn RoomsBackend>,
        bus: Arc<EventBus>,
    ) -> BackendResult<Self> {
        let validator = AccessValidator::new(Arc::clone(&backend));
        let session = if user.role.may_operate_rooms() {
            EntrySession::bootstrap(backend).await?
        } else {
            EntrySession::new(backend)
        };
        Ok(Self {
            user,
            validator,
            session,
            bus,
        })
    }

    /// The signed-in user this controller acts for
    pub fn user(&self) -> &User {
        &self.user
    }

    /// The open entry the session knows about, if any
    pub fn active_entry(&self) -> Option<ActiveEntryInfo> {
        self.session.active_entry()
    }

    /// Stop pending responses from mutating session state
    pub fn detach(&self) {
        self.session.detach();
    }

    fn may_operate(&self) -> bool {
        self.user.role.may_operate_rooms()
    }

    /// Ask whether the user could enter the room right now
    #[instrument(skip(self), fields(user_id = %self.user.id, room_id = %room_id))]
    pub async fn check_access(&self, room_id: RoomId) -> RoomAccessSummary {
        if !self.may_operate() {
            return RoomAccessSummary::denied(messages::MONITORS_ONLY);
        }
        self.validator.can_access_room(room_id).await
    }

    /// Validate an entry into the room at this instant
    #[instrument(skip(self), fields(user_id = %self.user.id, room_id = %room_id))]
    pub async fn validate_realtime_access(&self, room_id: RoomId) -> AccessDecision {
        if !self.may_operate() {
            return AccessDecision::denied(messages::MONITORS_ONLY);
        }
        self.validator
            .validate_access(room_id, AccessKind::Entry, None)
            .await
    }

    /// Register an entry into the room and announce it on the bus
    #[instrument(skip(self, at), fields(user_id = %self.user.id, room_id = %room_id))]
    pub async fn handle_entry(&self, room_id: RoomId, at: Option<DateTime<Utc>>) -> ActionOutcome {
        if !self.may_operate() {
            return ActionOutcome::rejected(messages::MONITORS_ONLY);
        }

        let outcome = self.session.attempt_entry(room_id, at).await;
        if outcome.success {
            if let Some(entry) = &outcome.entry {
                info!(entry_id = %entry.id, "entry registered");
                self.bus.publish(RoomEvent::EntryAdded {
                    id: entry.id,
                    room_name: entry.room_label(),
                    user_name: self.display_name(entry.user_name.as_deref()),
                });
                self.bus.publish(RoomEvent::StatsReload);
            }
        }
        outcome
    }

    /// Close the open entry and announce it on the bus
    #[instrument(skip(self, at), fields(user_id = %self.user.id))]
    pub async fn handle_exit(&self, at: Option<DateTime<Utc>>) -> ActionOutcome {
        if !self.may_operate() {
            return ActionOutcome::rejected(messages::MONITORS_ONLY);
        }

        let outcome = self.session.attempt_exit(at).await;
        if outcome.success {
            if let Some(entry) = &outcome.entry {
                info!(entry_id = %entry.id, "exit registered");
                self.bus.publish(RoomEvent::EntryExited {
                    id: entry.id,
                    room_name: entry.room_label(),
                    user_name: self.display_name(entry.user_name.as_deref()),
                });
                self.bus.publish(RoomEvent::StatsReload);
            }
        }
        outcome
    }

    /// Whether the user holds any schedule in the room
    ///
    /// False for accounts without room rights and on listing failures.
    pub async fn has_schedule_in_room(&self, room_id: RoomId) -> bool {
        if !self.may_operate() {
            return false;
        }
        self.validator.has_schedule_in_room(room_id).await
    }

    /// The user's schedules covering the room, empty when gated or on error
    pub async fn schedules_for_room(&self, room_id: RoomId) -> Vec<Schedule> {
        if !self.may_operate() {
            return Vec::new();
        }
        self.validator.schedules_for_room(room_id).await
    }

    /// All schedules assigned to the user, empty when gated or on error
    pub async fn my_schedules(&self) -> Vec<Schedule> {
        if !self.may_operate() {
            return Vec::new();
        }
        self.validator.my_schedules().await
    }

    /// Re-fetch the authoritative open entry from the backend
    pub async fn refresh_active_entry(&self) -> BackendResult<Option<ActiveEntryInfo>> {
        self.session.refresh().await
    }

    fn display_name(&self, from_entry: Option<&str>) -> String {
        from_entry
            .map(str::to_string)
            .unwrap_or_else(|| self.user.username.clone())
    }
}

impl fmt::Debug for AccessController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessController")
            .field("user", &self.user)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
