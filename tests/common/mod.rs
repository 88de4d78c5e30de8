//! Shared scripted backend for the integration suites
//!
//! [`FakeBackend`] answers every trait call from per-endpoint scripts and
//! counts how often each endpoint is hit, so tests can assert both the
//! outcome and the traffic an operation produced. Registration and active
//! entry calls can be given an artificial latency to hold an operation in
//! flight while the test races a second one against it.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use labrooms::backend::{
    EntryFilter, RegisterEntryRequest, RegisterExitRequest, RoomAccessCheck, RoomsBackend,
    ValidateAccessRequest, ValidateAccessResponse,
};
use labrooms::error::BackendResult;
use labrooms::{Entry, EntryId, Role, RoomId, Schedule, ScheduleId, User, UserId};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Scripted stand-in for the REST backend
pub struct FakeBackend {
    validate_result: Mutex<BackendResult<ValidateAccessResponse>>,
    entry_result: Mutex<BackendResult<Entry>>,
    exit_result: Mutex<BackendResult<Entry>>,
    room_access_result: Mutex<BackendResult<RoomAccessCheck>>,
    schedules_result: Mutex<BackendResult<Vec<Schedule>>>,
    entries_result: Mutex<BackendResult<Vec<Entry>>>,
    active_entry_result: Mutex<BackendResult<Option<Entry>>>,
    register_latency: Mutex<Option<Duration>>,
    active_entry_latency: Mutex<Option<Duration>>,

    /// Calls to the validation endpoint
    pub validate_calls: AtomicUsize,
    /// Calls to the entry registration endpoint
    pub entry_calls: AtomicUsize,
    /// Calls to the exit registration endpoint
    pub exit_calls: AtomicUsize,
    /// Calls to the passive room access check
    pub room_access_calls: AtomicUsize,
    /// Calls to the schedule listing
    pub schedule_calls: AtomicUsize,
    /// Calls to the active entry fetch
    pub active_entry_calls: AtomicUsize,
}

impl FakeBackend {
    /// A backend that grants access and registers whatever is asked
    pub fn new() -> Self {
        Self {
            validate_result: Mutex::new(Ok(granted())),
            entry_result: Mutex::new(Ok(open_entry(41, 3, ts(14, 2)))),
            exit_result: Mutex::new(Ok(closed_entry(41, 3, ts(14, 2), ts(16, 0)))),
            room_access_result: Mutex::new(Ok(RoomAccessCheck {
                can_access: true,
                reason: None,
                schedule: None,
            })),
            schedules_result: Mutex::new(Ok(Vec::new())),
            entries_result: Mutex::new(Ok(Vec::new())),
            active_entry_result: Mutex::new(Ok(None)),
            register_latency: Mutex::new(None),
            active_entry_latency: Mutex::new(None),
            validate_calls: AtomicUsize::new(0),
            entry_calls: AtomicUsize::new(0),
            exit_calls: AtomicUsize::new(0),
            room_access_calls: AtomicUsize::new(0),
            schedule_calls: AtomicUsize::new(0),
            active_entry_calls: AtomicUsize::new(0),
        }
    }

    /// Script the validation verdict
    pub fn with_validation(self, result: BackendResult<ValidateAccessResponse>) -> Self {
        *self.validate_result.lock().unwrap() = result;
        self
    }

    /// Script the entry registration response
    pub fn with_entry_result(self, result: BackendResult<Entry>) -> Self {
        *self.entry_result.lock().unwrap() = result;
        self
    }

    /// Script the exit registration response
    pub fn with_exit_result(self, result: BackendResult<Entry>) -> Self {
        *self.exit_result.lock().unwrap() = result;
        self
    }

    /// Script the passive room access verdict
    pub fn with_room_access(self, result: BackendResult<RoomAccessCheck>) -> Self {
        *self.room_access_result.lock().unwrap() = result;
        self
    }

    /// Script the schedule listing
    pub fn with_schedules(self, schedules: Vec<Schedule>) -> Self {
        *self.schedules_result.lock().unwrap() = Ok(schedules);
        self
    }

    /// Script the entry history listing
    pub fn with_entries(self, entries: Vec<Entry>) -> Self {
        *self.entries_result.lock().unwrap() = Ok(entries);
        self
    }

    /// Script the active entry fetch
    pub fn with_active_entry(self, result: BackendResult<Option<Entry>>) -> Self {
        *self.active_entry_result.lock().unwrap() = result;
        self
    }

    /// Hold registrations in flight for the given duration
    pub fn with_register_latency(self, latency: Duration) -> Self {
        *self.register_latency.lock().unwrap() = Some(latency);
        self
    }

    /// Hold active entry fetches in flight for the given duration
    pub fn with_active_entry_latency(self, latency: Duration) -> Self {
        *self.active_entry_latency.lock().unwrap() = Some(latency);
        self
    }

    /// Re-script the active entry fetch mid-test
    pub fn script_active_entry(&self, result: BackendResult<Option<Entry>>) {
        *self.active_entry_result.lock().unwrap() = result;
    }

    /// Re-script the validation verdict mid-test
    pub fn script_validation(&self, result: BackendResult<ValidateAccessResponse>) {
        *self.validate_result.lock().unwrap() = result;
    }

    async fn registration_delay(&self) {
        let latency = *self.register_latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    async fn active_entry_delay(&self) {
        let latency = *self.active_entry_latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl RoomsBackend for FakeBackend {
    async fn validate_room_access(
        &self,
        _request: &ValidateAccessRequest,
    ) -> BackendResult<ValidateAccessResponse> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        self.validate_result.lock().unwrap().clone()
    }

    async fn register_entry(&self, _request: &RegisterEntryRequest) -> BackendResult<Entry> {
        self.entry_calls.fetch_add(1, Ordering::SeqCst);
        self.registration_delay().await;
        self.entry_result.lock().unwrap().clone()
    }

    async fn register_exit(
        &self,
        _entry_id: EntryId,
        _request: &RegisterExitRequest,
    ) -> BackendResult<Entry> {
        self.exit_calls.fetch_add(1, Ordering::SeqCst);
        self.registration_delay().await;
        self.exit_result.lock().unwrap().clone()
    }

    async fn room_access(&self, _room_id: RoomId) -> BackendResult<RoomAccessCheck> {
        self.room_access_calls.fetch_add(1, Ordering::SeqCst);
        self.room_access_result.lock().unwrap().clone()
    }

    async fn my_schedules(&self) -> BackendResult<Vec<Schedule>> {
        self.schedule_calls.fetch_add(1, Ordering::SeqCst);
        self.schedules_result.lock().unwrap().clone()
    }

    async fn my_entries(&self) -> BackendResult<Vec<Entry>> {
        self.entries_result.lock().unwrap().clone()
    }

    async fn my_active_entry(&self) -> BackendResult<Option<Entry>> {
        self.active_entry_calls.fetch_add(1, Ordering::SeqCst);
        self.active_entry_delay().await;
        self.active_entry_result.lock().unwrap().clone()
    }

    async fn entries(&self, _filter: &EntryFilter) -> BackendResult<Vec<Entry>> {
        self.entries_result.lock().unwrap().clone()
    }
}

/// A fixed instant on the reference day used across the suites
pub fn ts(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 11, hour, minute, 0).unwrap()
}

/// An instant on an arbitrary day of March 2024
pub fn ts_on(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, minute, 0).unwrap()
}

/// The monitor account the suites operate as
pub fn monitor() -> User {
    User::monitor(UserId(8), "jperez")
}

/// An administrator account without room rights
pub fn admin() -> User {
    User::new(UserId(1), "direccion", Role::Admin)
}

/// A granted validation verdict
pub fn granted() -> ValidateAccessResponse {
    ValidateAccessResponse {
        access_granted: true,
        reason: None,
        schedule: None,
    }
}

/// A denied validation verdict carrying the backend's reason
pub fn denied(reason: &str) -> ValidateAccessResponse {
    ValidateAccessResponse {
        access_granted: false,
        reason: Some(reason.to_string()),
        schedule: None,
    }
}

/// A denied validation verdict without any reason attached
pub fn denied_without_reason() -> ValidateAccessResponse {
    ValidateAccessResponse {
        access_granted: false,
        reason: None,
        schedule: None,
    }
}

/// An open entry with a denormalized room name
pub fn open_entry(id: i64, room: i64, entry_time: DateTime<Utc>) -> Entry {
    let mut entry = Entry::active(EntryId(id), RoomId(room), UserId(8), entry_time);
    entry.room_name = Some(format!("Laboratorio {}", room));
    entry
}

/// A closed entry with a denormalized room name
pub fn closed_entry(
    id: i64,
    room: i64,
    entry_time: DateTime<Utc>,
    exit_time: DateTime<Utc>,
) -> Entry {
    let mut entry = Entry::closed(EntryId(id), RoomId(room), UserId(8), entry_time, exit_time);
    entry.room_name = Some(format!("Laboratorio {}", room));
    entry
}

/// A shift for the suite's monitor in the given room
pub fn shift(id: i64, room: i64, start: DateTime<Utc>, end: DateTime<Utc>) -> Schedule {
    Schedule {
        id: ScheduleId(id),
        user: UserId(8),
        room: RoomId(room),
        start_datetime: start,
        end_datetime: end,
        room_name: Some(format!("Laboratorio {}", room)),
    }
}
