use rsqa_utils::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values.
    ///
    /// A single problem is reported as [`ConfigError::InvalidValue`], several as
    /// [`ConfigError::ValidationFailed`] listing all of them.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let mut problems: Vec<(&str, &str)> = Vec::new();

        for (key, value) in [
            ("startup_marker", &self.server.startup_marker),
            ("main_class", &self.server.main_class),
            ("shutdown_class", &self.server.shutdown_class),
            ("log_file_name", &self.server.log_file_name),
        ] {
            if value.trim().is_empty() {
                problems.push((key, "must not be empty"));
            }
        }

        if self.server.java.as_os_str().is_empty() {
            problems.push(("java", "must not be empty"));
        }
        if self.server.startup_timeout_ms == Some(0) {
            problems.push(("startup_timeout_ms", "must be greater than 0 when set"));
        }
        if self.shutdown.port == 0 {
            problems.push(("port", "must be between 1 and 65535"));
        }

        for (key, value) in [
            ("timeout_ms", self.shutdown.timeout_ms),
            ("companion_grace_ms", self.shutdown.companion_grace_ms),
            ("exit_grace_ms", self.shutdown.exit_grace_ms),
            ("drain_join_timeout_ms", self.shutdown.drain_join_timeout_ms),
        ] {
            if value == 0 {
                problems.push((key, "must be greater than 0"));
            }
        }

        match problems.as_slice() {
            [] => Ok(()),
            [(key, value)] => Err(ConfigError::InvalidValue {
                key: (*key).to_string(),
                value: (*value).to_string(),
            }),
            _ => {
                let errors: Vec<String> = problems
                    .iter()
                    .map(|(key, value)| format!("{key} {value}"))
                    .collect();
                Err(ConfigError::ValidationFailed {
                    error_count: errors.len(),
                    errors,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_empty_marker_is_rejected() {
        let mut config = Config::default();
        config.server.startup_marker = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "startup_marker")
        );
    }

    #[test]
    fn test_multiple_problems_are_collected() {
        let mut config = Config::default();
        config.shutdown.port = 0;
        config.shutdown.exit_grace_ms = 0;
        config.server.shutdown_class = String::new();

        match config.validate().unwrap_err() {
            ConfigError::ValidationFailed {
                errors,
                error_count,
            } => {
                assert_eq!(error_count, 3);
                assert!(errors.iter().any(|e| e.starts_with("port ")));
                assert!(errors.iter().any(|e| e.starts_with("exit_grace_ms ")));
                assert!(errors.iter().any(|e| e.starts_with("shutdown_class ")));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_zero_startup_timeout_is_rejected() {
        let mut config = Config::default();
        config.server.startup_timeout_ms = Some(0);
        assert!(config.validate().is_err());
        config.server.startup_timeout_ms = Some(120_000);
        assert!(config.validate().is_ok());
    }
}
