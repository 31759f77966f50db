use serde::Serialize;
use std::collections::BTreeMap;

use super::{Config, ConfigSource};

/// One resolved value and where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveValue {
    pub value: String,
    pub source: ConfigSource,
}

impl Config {
    /// Every setting rendered as text with its source, ordered by key.
    ///
    /// Unset optional values (`classpath`, `startup_timeout_ms`) are omitted.
    #[must_use]
    pub fn effective_config(&self) -> BTreeMap<String, EffectiveValue> {
        let mut config = BTreeMap::new();

        let mut add = |key: &str, value: Option<String>| {
            if let Some(value) = value {
                config.insert(
                    key.to_string(),
                    EffectiveValue {
                        value,
                        source: self.source_of(key),
                    },
                );
            }
        };

        let server = &self.server;
        add("runtime_dir", Some(server.runtime_dir.display().to_string()));
        add("java", Some(server.java.display().to_string()));
        add("main_class", Some(server.main_class.clone()));
        add("shutdown_class", Some(server.shutdown_class.clone()));
        add("classpath", server.classpath.clone());
        add("instance_id", Some(server.instance_id.to_string()));
        add("log_file_name", Some(server.log_file_name.clone()));
        add("startup_marker", Some(server.startup_marker.clone()));
        add(
            "startup_timeout_ms",
            server.startup_timeout_ms.map(|ms| ms.to_string()),
        );

        let shutdown = &self.shutdown;
        add("port", Some(shutdown.port.to_string()));
        add("timeout_ms", Some(shutdown.timeout_ms.to_string()));
        add("companion_grace_ms", Some(shutdown.companion_grace_ms.to_string()));
        add("exit_grace_ms", Some(shutdown.exit_grace_ms.to_string()));
        add(
            "drain_join_timeout_ms",
            Some(shutdown.drain_join_timeout_ms.to_string()),
        );

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_effective_config_lists_sources() {
        let config = Config::builder()
            .startup_marker("SYS0042")
            .build()
            .unwrap();
        let effective = config.effective_config();

        assert_eq!(
            effective["startup_marker"],
            EffectiveValue {
                value: "SYS0042".to_string(),
                source: ConfigSource::Programmatic,
            }
        );
        assert_eq!(effective["port"].source, ConfigSource::Default);
        assert!(!effective.contains_key("classpath"));
        assert!(!effective.contains_key("startup_timeout_ms"));
    }

    #[test]
    fn test_optional_values_appear_when_set() {
        let config = Config::builder()
            .classpath("target/classes")
            .startup_timeout(Duration::from_secs(30))
            .build()
            .unwrap();
        let effective = config.effective_config();
        assert_eq!(effective["classpath"].value, "target/classes");
        assert_eq!(effective["startup_timeout_ms"].value, "30000");
    }
}
