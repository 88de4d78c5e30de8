//! Access validation and orchestration
//!
//! This module decides who may enter or leave a room. It provides:
//!
//! - **Validation**: fail-closed checks against the backend's schedules
//! - **Controller**: the role-gated façade views call, wiring validation,
//!   the entry session and the event bus together
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use labrooms::access::AccessController;
//! use labrooms::backend::HttpBackend;
//! use labrooms::bus::EventBus;
//! use labrooms::model::User;
//! use labrooms::types::{RoomId, UserId};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = Arc::new(HttpBackend::new(
//!     "http://localhost:8000",
//!     Some("token".to_string()),
//!     Duration::from_secs(10),
//! )?);
//! let bus = Arc::new(EventBus::new());
//! let user = User::monitor(UserId(8), "ana");
//!
//! let controller = AccessController::bootstrap(user, backend, bus).await?;
//! let summary = controller.check_access(RoomId(3)).await;
//! println!("{}: {}", summary.can_access, summary.reason);
//! # Ok(())
//! # }
//! ```

pub mod controller;
pub mod validator;

pub use controller::*;
pub use validator::*;
