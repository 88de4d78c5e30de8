//! Attendance reporting
//!
//! This module turns raw entry records into the summaries the stats views
//! show. It provides:
//!
//! - **Ranges**: Monday-based weeks and calendar months in local time
//! - **Aggregation**: clamped minute totals, entry counts and late arrivals
//! - **Service**: fetches the caller's data and produces period summaries
//!
//! # Usage Example
//!
//! ```rust
//! use labrooms::attendance::{format_hm, period_summary, week_range};
//! use chrono::{NaiveDate, Utc};
//!
//! let week = week_range(NaiveDate::from_ymd_opt(2024, 3, 13).unwrap());
//! let summary = period_summary(&[], &[], &week, &Utc, 5, Utc::now());
//!
//! assert_eq!(summary.total_minutes, 0);
//! assert_eq!(format_hm(summary.total_minutes), "0 h 00 min");
//! ```

pub mod aggregator;
pub mod ranges;
pub mod service;

pub use aggregator::*;
pub use ranges::*;
pub use service::*;
