//! Runtime configuration.
//!
//! # Responsibility
//! - Hold the fixed namespaced keys (storage slot, broadcast topic).
//! - Resolve paths and flags from `TASKDECK_*` environment overrides.
//!
//! # Invariants
//! - Namespaced keys match `[a-z0-9][a-z0-9._-]*`.
//! - Process-wide configuration is resolved at most once.

use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Local store slot holding the JSON snapshot.
pub const DEFAULT_STORAGE_KEY: &str = "taskdeck.tasks.v1";
/// Broadcast topic shared by all sessions of one origin.
pub const DEFAULT_CHANNEL_NAME: &str = "taskdeck.sync.v1";
/// Prefix of exported snapshot file names.
pub const DEFAULT_EXPORT_PREFIX: &str = "taskdeck-tasks";
const DEFAULT_DB_FILE_NAME: &str = "taskdeck.sqlite3";

const ENV_DB_PATH: &str = "TASKDECK_DB_PATH";
const ENV_STORAGE_KEY: &str = "TASKDECK_STORAGE_KEY";
const ENV_CHANNEL: &str = "TASKDECK_CHANNEL";
const ENV_EXPORT_DIR: &str = "TASKDECK_EXPORT_DIR";
const ENV_EXPORT_PREFIX: &str = "TASKDECK_EXPORT_PREFIX";
const ENV_LOG_LEVEL: &str = "TASKDECK_LOG_LEVEL";
const ENV_FILE_HANDLES: &str = "TASKDECK_FILE_HANDLES";

static NAMESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9._-]*$").expect("valid namespace regex"));
static GLOBAL_CONFIG: OnceCell<AppConfig> = OnceCell::new();

/// Configuration resolution errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidNamespace { name: &'static str, value: String },
    InvalidFlag { name: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidNamespace { name, value } => write!(
                f,
                "{name} must match [a-z0-9][a-z0-9._-]*, got `{value}`"
            ),
            Self::InvalidFlag { name, value } => {
                write!(f, "{name} must be true|false|1|0, got `{value}`")
            }
        }
    }
}

impl Error for ConfigError {}

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// SQLite file holding the local key/value slots.
    pub db_path: PathBuf,
    pub storage_key: String,
    pub channel_name: String,
    /// Target directory for download-style exports.
    pub export_dir: PathBuf,
    pub export_prefix: String,
    pub log_level: String,
    /// Whether the host offers interactive file handles.
    pub file_handles: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let temp = std::env::temp_dir();
        Self {
            db_path: temp.join(DEFAULT_DB_FILE_NAME),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            channel_name: DEFAULT_CHANNEL_NAME.to_string(),
            export_dir: temp,
            export_prefix: DEFAULT_EXPORT_PREFIX.to_string(),
            log_level: crate::logging::default_log_level().to_string(),
            file_handles: true,
        }
    }
}

impl AppConfig {
    /// Resolves configuration from process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves configuration from an arbitrary variable lookup.
    ///
    /// Blank values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(value) = read(ENV_DB_PATH) {
            config.db_path = PathBuf::from(value);
        }
        if let Some(value) = read(ENV_STORAGE_KEY) {
            config.storage_key = validate_namespace(ENV_STORAGE_KEY, &value)?;
        }
        if let Some(value) = read(ENV_CHANNEL) {
            config.channel_name = validate_namespace(ENV_CHANNEL, &value)?;
        }
        if let Some(value) = read(ENV_EXPORT_DIR) {
            config.export_dir = PathBuf::from(value);
        }
        if let Some(value) = read(ENV_EXPORT_PREFIX) {
            config.export_prefix = validate_namespace(ENV_EXPORT_PREFIX, &value)?;
        }
        if let Some(value) = read(ENV_LOG_LEVEL) {
            config.log_level = value;
        }
        if let Some(value) = read(ENV_FILE_HANDLES) {
            config.file_handles = parse_flag(ENV_FILE_HANDLES, &value)?;
        }

        Ok(config)
    }

    /// Process-wide configuration, resolved from the environment once.
    pub fn global() -> Result<&'static AppConfig, ConfigError> {
        GLOBAL_CONFIG.get_or_try_init(Self::from_env)
    }
}

/// Checks that `value` is a usable namespaced key.
pub fn validate_namespace(name: &'static str, value: &str) -> Result<String, ConfigError> {
    if NAMESPACE_RE.is_match(value) {
        Ok(value.to_string())
    } else {
        Err(ConfigError::InvalidNamespace {
            name,
            value: value.to_string(),
        })
    }
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            name,
            value: value.to_string(),
        }),
    }
}
