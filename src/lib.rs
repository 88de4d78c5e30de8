//! Room Access & Attendance Engine
//!
//! A client engine for lab room monitoring: it decides whether a monitor
//! may check into or out of a physical room at a given instant, tracks the
//! single open entry per user, aggregates attendance into weekly and
//! monthly figures, and propagates every state change to all open views of
//! the same origin in near-real time.
//!
//! # Overview
//!
//! The engine sits between the views of a monitoring front end and a REST
//! backend that owns schedules, entries and users. It never grants access
//! on its own authority: the backend validates every entry against the
//! caller's schedules, and any uncertainty on the way resolves to a denial.
//! Exits are not schedule-gated and go straight to the registration call.
//!
//! ## Key Features
//!
//! - **Fail-closed validation**: transport failures, server errors and
//!   undecodable responses all answer as denials, never as grants
//! - **Single active entry**: entry/exit transitions keep at most one open
//!   entry per user, guarded against double submits and stale responses
//! - **Attendance aggregation**: clamped minute totals over week and month
//!   windows, plus late arrivals against matched schedules
//! - **Realtime propagation**: synchronous in-process dispatch plus a
//!   file-backed cross-process relay with debounced view reloads
//! - **Role-gated façade**: one access-control decision reused by every
//!   operation, answered locally for accounts without room rights
//!
//! ## Quick Start
//!
//! ```rust
//! use labrooms::*;
//! use chrono::NaiveDate;
//!
//! // Reporting window for the week of March 13th
//! let week = week_range(NaiveDate::from_ymd_opt(2024, 3, 13).unwrap());
//! assert_eq!(format_hm(480), "8 h 00 min");
//!
//! // Views react to bus events
//! let bus = EventBus::new();
//! let _subscription = bus.subscribe(Channel::StatsReload, move |_| {
//!     // recompute the attendance figures for `week` here
//! });
//! bus.publish(RoomEvent::StatsReload);
//! # let _ = week;
//! ```
//!
//! ## Module Organization
//!
//! - [`types`]: identifiers, enums, and configuration
//! - [`model`]: users, rooms, schedules, and entries
//! - [`backend`]: the REST client and the backend trait
//! - [`access`]: fail-closed validation and the role-gated controller
//! - [`entry`]: the entry/exit state machine
//! - [`attendance`]: time ranges and attendance aggregation
//! - [`bus`]: realtime event propagation
//! - [`messages`]: user-facing message strings
//! - [`error`]: error taxonomy
//! - [`logging`]: tracing setup
//!
//! ## Architecture
//!
//! The library follows a modular architecture with clear separation of concerns:
//!
//! ```text
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │   Types     │    │    Model    │    │   Backend   │
//! │             │    │             │    │             │
//! │ Identifiers │◄───┤ Schedules   │◄───┤ REST client │
//! │ Config      │    │ Entries     │    │ Trait       │
//! └─────────────┘    └─────────────┘    └─────────────┘
//!        ▲                   ▲                   ▲
//!        │                   │                   │
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │   Access    │    │    Entry    │    │     Bus     │
//! │             │    │             │    │             │
//! │ Validation  │◄───┤ Session     │◄───┤ Broadcast   │
//! │ Controller  │    │ Guards      │    │ Relay       │
//! └─────────────┘    └─────────────┘    └─────────────┘
//! ```
#![warn(missing_docs, missing_debug_implementations, unreachable_pub)]

// Module declarations
pub mod access;
pub mod attendance;
pub mod backend;
pub mod bus;
pub mod entry;
pub mod logging;
pub mod messages;

pub mod error;
pub mod model;
pub mod types;

// Re-export the engine surface

// Core types and identifiers
pub use types::{
    AccessKind, CliArgs, ClientConfig, Command, EntryId, OriginId, ReportId, Role, RoomId,
    ScheduleId, UserId,
};

// Domain records
pub use model::{Entry, Room, Schedule, User};

// Backend client and trait
pub use backend::{EntryFilter, HttpBackend, RoomsBackend};

// Validation and orchestration
pub use access::{AccessController, AccessDecision, AccessValidator, RoomAccessSummary};

// Entry/exit state machine
pub use entry::{ActionOutcome, ActiveEntryInfo, EntrySession};

// Attendance aggregation
pub use attendance::{
    format_hm, late_arrivals, month_range, period_summary, sum_minutes, week_range,
    AttendancePeriod, AttendanceService, TimeRange,
};

// Event propagation
pub use bus::{
    Channel, DebouncedRefresher, EventBus, FileRelayStore, RelayRecord, RelayStore, RoomEvent,
    Subscription, ViewRefresher,
};

// Errors and logging
pub use error::{BackendError, BackendResult, ConfigError, RelayError};
pub use logging::LoggingConfig;
