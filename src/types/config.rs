//! Configuration structures for the room access engine
//!
//! This module contains the client configuration, its validation logic, and
//! the command line interface. Configuration layers the same way as every
//! other tool here: defaults, then the JSON file, then CLI flags on top.

use crate::error::ConfigError;
use crate::model::User;
use crate::types::{Role, RoomId, UserId};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default values applied before any file or CLI layer
pub mod defaults {
    /// Base URL of the scheduling backend
    pub const BASE_URL: &str = "http://localhost:8000";

    /// Minutes past the shift start before an arrival counts as late
    pub const GRACE_MINUTES: i64 = 5;

    /// Minimum milliseconds between event-driven view reloads
    pub const RELOAD_DEBOUNCE_MS: u64 = 1000;

    /// End-to-end timeout for each backend request
    pub const REQUEST_TIMEOUT_SECS: u64 = 10;
}

/// Command line arguments structure
#[derive(Debug, Clone, Parser)]
#[command(
    name = "labrooms",
    version = "0.1.0",
    about = "Room access & attendance engine for lab monitors",
    long_about = "Validates room access against assigned schedules, registers entries and \
exits, aggregates attendance, and relays room events between running sessions.

EXAMPLES:
    # Check whether room 3 can be entered right now
    labrooms --username jperez --user-id 8 --role monitor check 3

    # Register an entry and later the exit
    labrooms --config labrooms.json enter 3
    labrooms --config labrooms.json exit

    # Weekly attendance summary
    labrooms --config labrooms.json stats

    # Follow events other sessions publish through the relay directory
    labrooms --config labrooms.json watch

CONFIGURATION:
    Configuration can be provided via:
    1. Command line arguments (highest priority)
    2. Configuration file (--config flag)
    3. Default values (lowest priority)

    Supported configuration file formats: JSON (.json)

    Use --print-config to generate a template configuration file, or
    --save-config to write the resolved configuration back to disk."
)]
pub struct CliArgs {
    /// Configuration file path (JSON format)
    #[arg(
        short,
        long,
        help = "Configuration file path (JSON format)",
        long_help = "Path to a JSON configuration file. CLI arguments will override file settings."
    )]
    pub config: Option<String>,

    /// Base URL of the scheduling backend
    #[arg(long, help = "Base URL of the scheduling backend")]
    pub base_url: Option<String>,

    /// API token sent with every backend request
    #[arg(long, help = "API token for backend authentication")]
    pub auth_token: Option<String>,

    /// Minutes of grace before an arrival counts as late
    #[arg(long, help = "Late-arrival grace period in minutes")]
    pub grace_minutes: Option<i64>,

    /// Minimum milliseconds between event-driven reloads
    #[arg(long, help = "Reload debounce interval in milliseconds")]
    pub reload_debounce_ms: Option<u64>,

    /// Directory used to relay events to other sessions on this machine
    #[arg(long, help = "Relay directory for cross-session events")]
    pub relay_dir: Option<PathBuf>,

    /// Timeout for each backend request, in seconds
    #[arg(long, help = "Backend request timeout in seconds")]
    pub request_timeout_secs: Option<u64>,

    /// Numeric ID of the signed-in account
    #[arg(long, help = "Numeric ID of the signed-in account")]
    pub user_id: Option<UserId>,

    /// Username of the signed-in account
    #[arg(long, help = "Username of the signed-in account")]
    pub username: Option<String>,

    /// Role of the signed-in account (admin or monitor)
    #[arg(long, help = "Role of the signed-in account (admin or monitor)")]
    pub role: Option<Role>,

    /// Mark the signed-in account as verified
    #[arg(long, help = "Mark the signed-in account as verified")]
    pub verified: bool,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(short, long, help = "Enable debug logging")]
    pub debug: bool,

    /// Dry run mode - validate configuration without contacting the backend
    #[arg(long, help = "Validate configuration without contacting the backend")]
    pub dry_run: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in JSON format and exit")]
    pub print_config: bool,

    /// Write the resolved configuration to a JSON file and exit
    #[arg(long, help = "Write the resolved configuration to a JSON file and exit")]
    pub save_config: Option<PathBuf>,

    /// Operation to perform
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Operations exposed by the command line interface
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Ask whether the given room can be entered right now
    Check {
        /// Room to check
        room: RoomId,
    },
    /// Validate and register an entry into the given room
    Enter {
        /// Room to enter
        room: RoomId,
        /// Entry instant (RFC 3339), defaults to the server clock
        #[arg(long, value_parser = parse_instant)]
        at: Option<DateTime<Utc>>,
    },
    /// Close the currently open entry
    Exit {
        /// Exit instant (RFC 3339), defaults to the server clock
        #[arg(long, value_parser = parse_instant)]
        at: Option<DateTime<Utc>>,
    },
    /// List the signed-in monitor's schedules
    Schedules {
        /// Only show schedules covering this room
        #[arg(long)]
        room: Option<RoomId>,
    },
    /// Summarize attendance for the current week or month
    Stats {
        /// Aggregate over the month instead of the week
        #[arg(long)]
        month: bool,
        /// Reference date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<chrono::NaiveDate>,
    },
    /// Follow events other sessions publish through the relay directory
    Watch {
        /// Milliseconds between relay polls
        #[arg(long, default_value = "500")]
        interval_ms: u64,
    },
}

/// Parse an RFC 3339 instant from the command line
pub fn parse_instant(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 instant '{}': {}", s, e))
}

/// Configuration file structure (allows partial configuration)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    /// Base URL of the scheduling backend
    pub base_url: Option<String>,

    /// API token sent with every backend request
    pub auth_token: Option<String>,

    /// Minutes of grace before an arrival counts as late
    pub grace_minutes: Option<i64>,

    /// Minimum milliseconds between event-driven reloads
    pub reload_debounce_ms: Option<u64>,

    /// Directory used to relay events to other sessions on this machine
    pub relay_dir: Option<PathBuf>,

    /// Timeout for each backend request, in seconds
    pub request_timeout_secs: Option<u64>,

    /// Identity of the signed-in account
    pub user: Option<User>,
}

/// Configuration for the room access engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the scheduling backend
    pub base_url: String,

    /// API token sent with every backend request
    pub auth_token: Option<String>,

    /// Minutes of grace before an arrival counts as late
    pub grace_minutes: i64,

    /// Minimum milliseconds between event-driven reloads
    pub reload_debounce_ms: u64,

    /// Directory used to relay events to other sessions on this machine,
    /// `None` to keep events in-process only
    pub relay_dir: Option<PathBuf>,

    /// Timeout for each backend request, in seconds
    pub request_timeout_secs: u64,

    /// Identity of the signed-in account
    pub user: Option<User>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::BASE_URL.to_string(),
            auth_token: None,
            grace_minutes: defaults::GRACE_MINUTES,
            reload_debounce_ms: defaults::RELOAD_DEBOUNCE_MS,
            relay_dir: None,
            request_timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
            user: None,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration from command line arguments and optional config file
    pub fn from_args() -> Result<Self, ConfigError> {
        let args = CliArgs::parse();
        Self::from_cli_args(args)
    }

    /// Create configuration from parsed CLI arguments
    pub fn from_cli_args(args: CliArgs) -> Result<Self, ConfigError> {
        // Start with default configuration
        let mut config = Self::default();

        // Load from config file if specified
        if let Some(config_path) = &args.config {
            config = Self::from_file(config_path)?;
        }

        // Override with command line arguments (CLI takes precedence)
        Self::apply_cli_overrides(&mut config, args);

        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let content = fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                let config_file: ConfigFile = serde_json::from_str(&content)?;
                Ok(Self::from_config_file(config_file))
            }
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => Err(ConfigError::UnsupportedFormat("no extension".to_string())),
        }
    }

    /// Create configuration from a config file, merging with defaults
    fn from_config_file(config_file: ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            base_url: config_file.base_url.unwrap_or(defaults.base_url),
            auth_token: config_file.auth_token.or(defaults.auth_token),
            grace_minutes: config_file.grace_minutes.unwrap_or(defaults.grace_minutes),
            reload_debounce_ms: config_file
                .reload_debounce_ms
                .unwrap_or(defaults.reload_debounce_ms),
            relay_dir: config_file.relay_dir.or(defaults.relay_dir),
            request_timeout_secs: config_file
                .request_timeout_secs
                .unwrap_or(defaults.request_timeout_secs),
            user: config_file.user.or(defaults.user),
        }
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(config: &mut Self, args: CliArgs) {
        if let Some(value) = args.base_url {
            config.base_url = value;
        }
        if let Some(value) = args.auth_token {
            config.auth_token = Some(value);
        }
        if let Some(value) = args.grace_minutes {
            config.grace_minutes = value;
        }
        if let Some(value) = args.reload_debounce_ms {
            config.reload_debounce_ms = value;
        }
        if let Some(value) = args.relay_dir {
            config.relay_dir = Some(value);
        }
        if let Some(value) = args.request_timeout_secs {
            config.request_timeout_secs = value;
        }

        // Identity flags replace the configured user as a unit when an ID or
        // username is given, so a file user cannot leak into a CLI identity
        if args.user_id.is_some() || args.username.is_some() {
            let base = config.user.take();
            let id = args
                .user_id
                .or(base.as_ref().map(|u| u.id))
                .unwrap_or(UserId(0));
            let username = args
                .username
                .or(base.as_ref().map(|u| u.username.clone()))
                .unwrap_or_default();
            let role = args
                .role
                .or(base.as_ref().map(|u| u.role))
                .unwrap_or(Role::Monitor);
            let verified = args.verified || base.as_ref().map(|u| u.verified).unwrap_or(false);
            config.user = Some(User {
                id,
                username,
                role,
                verified,
            });
        } else if let Some(role) = args.role {
            if let Some(user) = &mut config.user {
                user.role = role;
            }
        }
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Print configuration as JSON
    pub fn print_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.is_empty() {
            return Err(ConfigError::invalid("base_url must not be empty"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::invalid(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.grace_minutes < 0 {
            return Err(ConfigError::invalid(format!(
                "grace_minutes must not be negative, got {}",
                self.grace_minutes
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "request_timeout_secs must be greater than 0",
            ));
        }
        if let Some(user) = &self.user {
            if user.username.is_empty() {
                return Err(ConfigError::invalid("user.username must not be empty"));
            }
        }
        Ok(())
    }

    /// The signed-in account, or an error when none is configured
    pub fn require_user(&self) -> Result<User, ConfigError> {
        self.user.clone().ok_or_else(|| {
            ConfigError::invalid(
                "no signed-in account configured; set user in the config file or pass --user-id and --username",
            )
        })
    }
}
