//! Scheduling backend client
//!
//! This module contains the contract the engine uses to reach the
//! scheduling backend and its HTTP implementation.
//!
//! # Overview
//!
//! - **RoomsBackend**: trait covering validation, entry/exit registration,
//!   schedule and entry listings
//! - **HttpBackend**: `reqwest` implementation speaking the backend's REST
//!   endpoints with token authentication
//! - Request/response bodies for each endpoint, shaped exactly like the wire
//!
//! # Usage Example
//!
//! ```no_run
//! use labrooms::backend::{HttpBackend, RoomsBackend};
//! use std::time::Duration;
//!
//! # async fn demo() -> Result<(), labrooms::BackendError> {
//! let backend = HttpBackend::new(
//!     "http://localhost:8000",
//!     Some("api-token".to_string()),
//!     Duration::from_secs(10),
//! )?;
//!
//! let schedules = backend.my_schedules().await?;
//! println!("assigned shifts: {}", schedules.len());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod http;

// Re-export all public types for convenience
pub use api::*;
pub use http::HttpBackend;
