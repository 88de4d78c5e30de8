//! Core types and identifiers for the room access engine
//!
//! This module contains the identifier newtypes, role and access-kind
//! enumerations, and the client configuration shared by every component.
//!
//! # Overview
//!
//! - **Identifiers**: numeric backend keys plus the random per-process
//!   origin used by the event relay
//! - **Enums**: account roles and access kinds, with the room-operation
//!   policy attached to [`Role`]
//! - **Configuration**: client configuration with validation and CLI support
//!
//! # Usage Example
//!
//! ```rust
//! use labrooms::types::*;
//!
//! // Backend keys are plain numbers
//! let room_id = RoomId(3);
//! let user_id = UserId(8);
//!
//! // The role decides whether room operations are allowed at all
//! assert!(Role::Monitor.may_operate_rooms());
//! assert!(!Role::Admin.may_operate_rooms());
//!
//! // Configure the client
//! let config = ClientConfig {
//!     base_url: "http://localhost:8000".to_string(),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

pub mod config;
pub mod enums;
pub mod identifiers;

// Re-export all public types for convenience
pub use config::*;
pub use enums::*;
pub use identifiers::*;
