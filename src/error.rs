//! Error types for the room access engine
//!
//! This module contains the error types raised by the backend client and by
//! configuration loading. Backend failures are split by what the caller can
//! do with them: transport and decode problems collapse into a fail-closed
//! denial at the validation layer, while rejections carry the backend's own
//! status and message so the UI can show them verbatim.

use thiserror::Error;

/// Errors raised while talking to the scheduling backend
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// The request never produced a usable response (DNS, connect, timeout,
    /// or a 5xx from the server)
    #[error("Backend unreachable: {0}")]
    Transport(String),

    /// The backend answered with a business rejection (4xx)
    #[error("Backend rejected the request ({status}): {message}")]
    Rejected {
        /// HTTP status code of the rejection
        status: u16,
        /// Message extracted from the response body
        message: String,
    },

    /// The response arrived but its body did not match the expected shape
    #[error("Backend response could not be decoded: {0}")]
    Decode(String),
}

impl BackendError {
    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a rejection with the given status and message
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Whether the backend reported a state conflict (HTTP 409)
    ///
    /// Conflicts mean the local picture of the active entry has drifted from
    /// the backend's and must be re-fetched.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Rejected { status: 409, .. })
    }

    /// Whether the backend reported the target record missing (HTTP 404)
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Rejected { status: 404, .. })
    }

    /// Get the error category for log fields
    pub fn category(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Rejected { .. } => "rejected",
            Self::Decode(_) => "decode",
        }
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors raised while loading or validating the client configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// The configuration file could not be read
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid JSON
    #[error("Failed to parse JSON configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// Unsupported configuration file format
    #[error("Unsupported configuration file format: {0} (supported: .json)")]
    UnsupportedFormat(String),

    /// A configuration value failed validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Create a validation error
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

/// Errors raised by the cross-process relay store
#[derive(Debug, Error)]
pub enum RelayError {
    /// A relay file could not be read or written
    #[error("Relay store I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// A relay record could not be encoded or decoded
    #[error("Relay record serialization failure: {0}")]
    Serde(#[from] serde_json::Error),
}
