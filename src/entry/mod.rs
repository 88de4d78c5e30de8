//! Entry/exit tracking
//!
//! This module contains the session state machine that mirrors the
//! monitor's single open entry and registers entries and exits against the
//! backend.
//!
//! # Overview
//!
//! - **EntrySession**: schedule-validated entries and ungated exits, with
//!   local refusals, an in-flight no-op guard, and conflict reconciliation
//! - **ActiveEntryInfo**: the local mirror of the open entry
//! - **ActionOutcome**: what an attempt produced, with the message to show

pub mod session;

// Re-export all public types for convenience
pub use session::*;
