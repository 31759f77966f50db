use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use rsqa_utils::error::ConfigError;

use super::{Config, ConfigSource, ServerSettings, ShutdownSettings};

impl Config {
    /// Create a builder for programmatic configuration.
    ///
    /// Use this when embedding the harness in tests that must not depend on
    /// config files or environment variables.
    ///
    /// # Example
    ///
    /// ```rust
    /// use rsqa_config::Config;
    /// use std::time::Duration;
    ///
    /// let config = Config::builder()
    ///     .runtime_dir("dist/rss")
    ///     .startup_timeout(Duration::from_secs(120))
    ///     .shutdown_port(55556)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.shutdown.port, 55556);
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for programmatic configuration.
///
/// All values set via the builder are attributed to
/// `ConfigSource::Programmatic`. Unset values keep their defaults; nothing is
/// read from the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    runtime_dir: Option<PathBuf>,
    java: Option<PathBuf>,
    main_class: Option<String>,
    shutdown_class: Option<String>,
    classpath: Option<String>,
    instance_id: Option<u32>,
    log_file_name: Option<String>,
    startup_marker: Option<String>,
    startup_timeout: Option<Duration>,
    shutdown_port: Option<u16>,
    shutdown_timeout: Option<Duration>,
    companion_grace: Option<Duration>,
    exit_grace: Option<Duration>,
    drain_join_timeout: Option<Duration>,
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn runtime_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.runtime_dir = Some(path.into());
        self
    }

    #[must_use]
    pub fn java(mut self, path: impl Into<PathBuf>) -> Self {
        self.java = Some(path.into());
        self
    }

    #[must_use]
    pub fn main_class(mut self, class: impl Into<String>) -> Self {
        self.main_class = Some(class.into());
        self
    }

    #[must_use]
    pub fn shutdown_class(mut self, class: impl Into<String>) -> Self {
        self.shutdown_class = Some(class.into());
        self
    }

    #[must_use]
    pub fn classpath(mut self, classpath: impl Into<String>) -> Self {
        self.classpath = Some(classpath.into());
        self
    }

    #[must_use]
    pub fn instance_id(mut self, id: u32) -> Self {
        self.instance_id = Some(id);
        self
    }

    #[must_use]
    pub fn log_file_name(mut self, name: impl Into<String>) -> Self {
        self.log_file_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn startup_marker(mut self, marker: impl Into<String>) -> Self {
        self.startup_marker = Some(marker.into());
        self
    }

    #[must_use]
    pub fn startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn shutdown_port(mut self, port: u16) -> Self {
        self.shutdown_port = Some(port);
        self
    }

    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn companion_grace(mut self, grace: Duration) -> Self {
        self.companion_grace = Some(grace);
        self
    }

    #[must_use]
    pub fn exit_grace(mut self, grace: Duration) -> Self {
        self.exit_grace = Some(grace);
        self
    }

    #[must_use]
    pub fn drain_join_timeout(mut self, timeout: Duration) -> Self {
        self.drain_join_timeout = Some(timeout);
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns the same errors as file-based configuration validation.
    pub fn build(self) -> Result<Config, ConfigError> {
        let mut attribution = HashMap::new();
        let mut mark = |key: &str, set: bool| {
            if set {
                attribution.insert(key.to_string(), ConfigSource::Programmatic);
            }
        };

        mark("runtime_dir", self.runtime_dir.is_some());
        mark("java", self.java.is_some());
        mark("main_class", self.main_class.is_some());
        mark("shutdown_class", self.shutdown_class.is_some());
        mark("classpath", self.classpath.is_some());
        mark("instance_id", self.instance_id.is_some());
        mark("log_file_name", self.log_file_name.is_some());
        mark("startup_marker", self.startup_marker.is_some());
        mark("startup_timeout_ms", self.startup_timeout.is_some());
        mark("port", self.shutdown_port.is_some());
        mark("timeout_ms", self.shutdown_timeout.is_some());
        mark("companion_grace_ms", self.companion_grace.is_some());
        mark("exit_grace_ms", self.exit_grace.is_some());
        mark("drain_join_timeout_ms", self.drain_join_timeout.is_some());

        let server_defaults = ServerSettings::default();
        let shutdown_defaults = ShutdownSettings::default();

        let config = Config {
            server: ServerSettings {
                runtime_dir: self.runtime_dir.unwrap_or(server_defaults.runtime_dir),
                java: self.java.unwrap_or(server_defaults.java),
                main_class: self.main_class.unwrap_or(server_defaults.main_class),
                shutdown_class: self.shutdown_class.unwrap_or(server_defaults.shutdown_class),
                classpath: self.classpath,
                instance_id: self.instance_id.unwrap_or(server_defaults.instance_id),
                log_file_name: self.log_file_name.unwrap_or(server_defaults.log_file_name),
                startup_marker: self.startup_marker.unwrap_or(server_defaults.startup_marker),
                startup_timeout_ms: self.startup_timeout.map(millis),
            },
            shutdown: ShutdownSettings {
                port: self.shutdown_port.unwrap_or(shutdown_defaults.port),
                timeout_ms: self
                    .shutdown_timeout
                    .map_or(shutdown_defaults.timeout_ms, millis),
                companion_grace_ms: self
                    .companion_grace
                    .map_or(shutdown_defaults.companion_grace_ms, millis),
                exit_grace_ms: self.exit_grace.map_or(shutdown_defaults.exit_grace_ms, millis),
                drain_join_timeout_ms: self
                    .drain_join_timeout
                    .map_or(shutdown_defaults.drain_join_timeout_ms, millis),
            },
            config_file: None,
            source_attribution: attribution,
        };

        config.validate()?;
        Ok(config)
    }
}
