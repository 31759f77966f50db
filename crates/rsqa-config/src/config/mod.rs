//! Configuration management for rsqa
//!
//! Hierarchical configuration with discovery and precedence:
//! CLI > file > environment > defaults. Configuration files are TOML with
//! `[server]` and `[shutdown]` sections.

mod builder;
mod cli_args;
mod discovery;
mod model;
mod sources;
mod validation;

pub use builder::ConfigBuilder;
pub use cli_args::CliArgs;
pub use discovery::{CONFIG_DIR, CONFIG_ENV_VAR, CONFIG_FILE, find_config_file};
pub use model::*;
pub use sources::EffectiveValue;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use rsqa_runner::{JvmSettings, ServerLaunch, ShutdownOptions};

/// Where a resolved configuration value came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    /// Value provided via CLI argument (highest precedence).
    Cli,
    /// Value loaded from configuration file.
    Config,
    /// Value taken from an environment variable such as `CLASSPATH`.
    Environment,
    /// Value provided programmatically (e.g., `Config::builder()`).
    Programmatic,
    /// Built-in default value (lowest precedence).
    Default,
}

impl ConfigSource {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Cli => "cli",
            Self::Config => "config",
            Self::Environment => "environment",
            Self::Programmatic => "programmatic",
            Self::Default => "default",
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Config {
    /// JVM binary, entry points and caller classpath for server and companion.
    #[must_use]
    pub fn jvm_settings(&self) -> JvmSettings {
        JvmSettings {
            java: self.server.java.clone(),
            server_class: self.server.main_class.clone(),
            shutdown_class: self.server.shutdown_class.clone(),
            caller_classpath: self.server.classpath.clone(),
        }
    }

    #[must_use]
    pub fn startup_timeout(&self) -> Option<Duration> {
        self.server.startup_timeout_ms.map(Duration::from_millis)
    }

    /// Shutdown tunables; `port` overrides the configured port when given.
    #[must_use]
    pub fn shutdown_options(&self, port: Option<u16>) -> ShutdownOptions {
        ShutdownOptions::new(port.unwrap_or(self.shutdown.port), self.shutdown.timeout_ms)
            .with_companion_grace(Duration::from_millis(self.shutdown.companion_grace_ms))
            .with_exit_grace(Duration::from_millis(self.shutdown.exit_grace_ms))
            .with_drain_join_timeout(Duration::from_millis(self.shutdown.drain_join_timeout_ms))
    }

    /// Launch description for a server working in `work_dir`.
    ///
    /// The log file is `<work_dir>/<log_file_name>`.
    #[must_use]
    pub fn server_launch(
        &self,
        work_dir: &Path,
        init_file: impl Into<PathBuf>,
        label: impl Into<String>,
    ) -> ServerLaunch {
        ServerLaunch::new(
            &self.server.runtime_dir,
            work_dir,
            work_dir.join(&self.server.log_file_name),
            init_file,
            self.server.instance_id,
            label,
        )
        .with_marker(self.server.startup_marker.clone())
        .with_startup_timeout(self.startup_timeout())
        .with_jvm(self.jvm_settings())
    }

    /// Source of the value named `key`, `Default` when untracked.
    #[must_use]
    pub fn source_of(&self, key: &str) -> ConfigSource {
        self.source_attribution
            .get(key)
            .copied()
            .unwrap_or(ConfigSource::Default)
    }
}
