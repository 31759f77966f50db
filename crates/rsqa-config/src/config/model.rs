use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use rsqa_runner::{
    DEFAULT_JAVA, DEFAULT_SERVER_CLASS, DEFAULT_SHUTDOWN_CLASS, DEFAULT_STARTUP_MARKER,
};

use super::ConfigSource;

pub const DEFAULT_RUNTIME_DIR: &str = "lib/rss";
pub const DEFAULT_LOG_FILE_NAME: &str = "rss.log";
pub const DEFAULT_SHUTDOWN_PORT: u16 = 55556;
pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_COMPANION_GRACE_MS: u64 = 10_000;
pub const DEFAULT_EXIT_GRACE_MS: u64 = 5000;
pub const DEFAULT_DRAIN_JOIN_TIMEOUT_MS: u64 = 5000;

/// How the server is started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerSettings {
    /// Server distribution with `bin/` and `lib/`
    pub runtime_dir: PathBuf,
    pub java: PathBuf,
    pub main_class: String,
    pub shutdown_class: String,
    /// Appended to `<runtime>/lib/*`
    pub classpath: Option<String>,
    pub instance_id: u32,
    /// Log file name inside the work directory
    pub log_file_name: String,
    pub startup_marker: String,
    /// Unset waits for the marker until the server closes stdout
    pub startup_timeout_ms: Option<u64>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            runtime_dir: PathBuf::from(DEFAULT_RUNTIME_DIR),
            java: PathBuf::from(DEFAULT_JAVA),
            main_class: DEFAULT_SERVER_CLASS.to_string(),
            shutdown_class: DEFAULT_SHUTDOWN_CLASS.to_string(),
            classpath: None,
            instance_id: 0,
            log_file_name: DEFAULT_LOG_FILE_NAME.to_string(),
            startup_marker: DEFAULT_STARTUP_MARKER.to_string(),
            startup_timeout_ms: None,
        }
    }
}

/// How the server is stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShutdownSettings {
    /// Command port the companion connects to
    pub port: u16,
    /// Passed to the companion as `-t<ms>`
    pub timeout_ms: u64,
    pub companion_grace_ms: u64,
    pub exit_grace_ms: u64,
    pub drain_join_timeout_ms: u64,
}

impl Default for ShutdownSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_SHUTDOWN_PORT,
            timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT_MS,
            companion_grace_ms: DEFAULT_COMPANION_GRACE_MS,
            exit_grace_ms: DEFAULT_EXIT_GRACE_MS,
            drain_join_timeout_ms: DEFAULT_DRAIN_JOIN_TIMEOUT_MS,
        }
    }
}

/// Fully resolved configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub server: ServerSettings,
    pub shutdown: ShutdownSettings,
    /// File the values were loaded from, if any
    pub config_file: Option<PathBuf>,
    /// Source attribution for each setting, keyed by field name
    pub source_attribution: HashMap<String, ConfigSource>,
}

/// `[server]` table as written in the file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ServerFile {
    pub runtime_dir: Option<PathBuf>,
    pub java: Option<PathBuf>,
    pub main_class: Option<String>,
    pub shutdown_class: Option<String>,
    pub classpath: Option<String>,
    pub instance_id: Option<u32>,
    pub log_file_name: Option<String>,
    pub startup_marker: Option<String>,
    pub startup_timeout_ms: Option<u64>,
}

/// `[shutdown]` table as written in the file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ShutdownFile {
    pub port: Option<u16>,
    pub timeout_ms: Option<u64>,
    pub companion_grace_ms: Option<u64>,
    pub exit_grace_ms: Option<u64>,
    pub drain_join_timeout_ms: Option<u64>,
}

/// TOML configuration file structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TomlConfig {
    pub server: Option<ServerFile>,
    pub shutdown: Option<ShutdownFile>,
}
