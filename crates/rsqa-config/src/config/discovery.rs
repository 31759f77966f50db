use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rsqa_utils::error::ConfigError;

use super::model::{ServerFile, ShutdownFile, TomlConfig};
use super::{CliArgs, Config, ConfigSource, ServerSettings, ShutdownSettings};

pub const CONFIG_DIR: &str = ".rsqa";
pub const CONFIG_FILE: &str = "config.toml";
/// Names an explicit config file, like `--config`.
pub const CONFIG_ENV_VAR: &str = "RSQA_CONFIG";
const CLASSPATH_ENV_VAR: &str = "CLASSPATH";

/// Record `value` into `slot` when present.
fn apply<T>(
    slot: &mut T,
    value: Option<T>,
    key: &str,
    source: ConfigSource,
    attribution: &mut HashMap<String, ConfigSource>,
) {
    if let Some(value) = value {
        *slot = value;
        attribution.insert(key.to_string(), source);
    }
}

/// Search upward from `start_dir` for `.rsqa/config.toml`.
///
/// Stops at the first repository root marker (`.git`, `.hg`, `.svn`) or the
/// filesystem root.
#[must_use]
pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    for dir in start_dir.ancestors() {
        let candidate = dir.join(CONFIG_DIR).join(CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        if [".git", ".hg", ".svn"].iter().any(|m| dir.join(m).exists()) {
            break;
        }
    }
    None
}

impl Config {
    /// Discover and load configuration with precedence: CLI > file > env > defaults
    ///
    /// # Errors
    ///
    /// Fails when the current directory is unavailable, an explicit config file
    /// is missing or malformed, or validation rejects the result.
    pub fn discover(cli_args: &CliArgs) -> Result<Self, ConfigError> {
        let start_dir = std::env::current_dir().map_err(|e| ConfigError::DiscoveryFailed {
            reason: format!("cannot determine current directory: {e}"),
        })?;
        Self::discover_from(&start_dir, cli_args)
    }

    /// Discover configuration starting from a specific directory.
    ///
    /// # Errors
    ///
    /// See [`discover`](Self::discover).
    pub fn discover_from(start_dir: &Path, cli_args: &CliArgs) -> Result<Self, ConfigError> {
        Self::discover_with_env(start_dir, cli_args, |key| std::env::var(key).ok())
    }

    /// Discovery with an injectable environment, used by tests to avoid
    /// process-global state.
    pub(crate) fn discover_with_env(
        start_dir: &Path,
        cli_args: &CliArgs,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut attribution = HashMap::new();
        let mut server = ServerSettings::default();
        let mut shutdown = ShutdownSettings::default();

        apply(
            &mut server.classpath,
            env(CLASSPATH_ENV_VAR).filter(|cp| !cp.is_empty()).map(Some),
            "classpath",
            ConfigSource::Environment,
            &mut attribution,
        );

        let explicit = cli_args
            .config_path
            .clone()
            .or_else(|| env(CONFIG_ENV_VAR).filter(|p| !p.is_empty()).map(PathBuf::from));
        let config_file = match explicit {
            Some(path) if !path.is_file() => {
                return Err(ConfigError::NotFound {
                    path: path.display().to_string(),
                });
            }
            Some(path) => Some(path),
            None => find_config_file(start_dir),
        };

        if let Some(path) = &config_file {
            let file = load_config_file(path)?;
            if let Some(file_server) = file.server {
                apply_server_file(&mut server, file_server, &mut attribution);
            }
            if let Some(file_shutdown) = file.shutdown {
                apply_shutdown_file(&mut shutdown, file_shutdown, &mut attribution);
            }
        }

        let cli = ConfigSource::Cli;
        apply(&mut server.runtime_dir, cli_args.runtime_dir.clone(), "runtime_dir", cli, &mut attribution);
        apply(&mut server.java, cli_args.java.clone(), "java", cli, &mut attribution);
        apply(
            &mut server.startup_marker,
            cli_args.startup_marker.clone(),
            "startup_marker",
            cli,
            &mut attribution,
        );
        apply(&mut shutdown.port, cli_args.port, "port", cli, &mut attribution);

        let config = Self {
            server,
            shutdown,
            config_file,
            source_attribution: attribution,
        };
        config.validate()?;
        Ok(config)
    }
}

fn apply_server_file(
    server: &mut ServerSettings,
    file: ServerFile,
    attribution: &mut HashMap<String, ConfigSource>,
) {
    let src = ConfigSource::Config;
    apply(&mut server.runtime_dir, file.runtime_dir, "runtime_dir", src, attribution);
    apply(&mut server.java, file.java, "java", src, attribution);
    apply(&mut server.main_class, file.main_class, "main_class", src, attribution);
    apply(&mut server.shutdown_class, file.shutdown_class, "shutdown_class", src, attribution);
    apply(&mut server.classpath, file.classpath.map(Some), "classpath", src, attribution);
    apply(&mut server.instance_id, file.instance_id, "instance_id", src, attribution);
    apply(&mut server.log_file_name, file.log_file_name, "log_file_name", src, attribution);
    apply(&mut server.startup_marker, file.startup_marker, "startup_marker", src, attribution);
    apply(
        &mut server.startup_timeout_ms,
        file.startup_timeout_ms.map(Some),
        "startup_timeout_ms",
        src,
        attribution,
    );
}

fn apply_shutdown_file(
    shutdown: &mut ShutdownSettings,
    file: ShutdownFile,
    attribution: &mut HashMap<String, ConfigSource>,
) {
    let src = ConfigSource::Config;
    apply(&mut shutdown.port, file.port, "port", src, attribution);
    apply(&mut shutdown.timeout_ms, file.timeout_ms, "timeout_ms", src, attribution);
    apply(
        &mut shutdown.companion_grace_ms,
        file.companion_grace_ms,
        "companion_grace_ms",
        src,
        attribution,
    );
    apply(&mut shutdown.exit_grace_ms, file.exit_grace_ms, "exit_grace_ms", src, attribution);
    apply(
        &mut shutdown.drain_join_timeout_ms,
        file.drain_join_timeout_ms,
        "drain_join_timeout_ms",
        src,
        attribution,
    );
}

/// Load configuration from TOML file
fn load_config_file(path: &Path) -> Result<TomlConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::InvalidFile(format!("cannot read {}: {e}", path.display()))
    })?;
    toml::from_str(&content)
        .map_err(|e| ConfigError::InvalidFile(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write_config(root: &Path, content: &str) -> PathBuf {
        let dir = root.join(CONFIG_DIR);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILE);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_defaults_without_file() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();

        let config = Config::discover_with_env(temp.path(), &CliArgs::default(), no_env).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_discovers_file_in_parent_directory() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        let path = write_config(
            temp.path(),
            "[server]\nstartup_marker = \"SYS0009\"\ninstance_id = 4\n\n[shutdown]\nport = 60001\n",
        );
        let nested = temp.path().join("tests").join("smoke");
        fs::create_dir_all(&nested).unwrap();

        let config = Config::discover_with_env(&nested, &CliArgs::default(), no_env).unwrap();
        assert_eq!(config.config_file, Some(path));
        assert_eq!(config.server.startup_marker, "SYS0009");
        assert_eq!(config.server.instance_id, 4);
        assert_eq!(config.shutdown.port, 60001);
        assert_eq!(config.source_of("startup_marker"), ConfigSource::Config);
        assert_eq!(config.source_of("timeout_ms"), ConfigSource::Default);
    }

    #[test]
    fn test_search_stops_at_repository_root() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), "[server]\ninstance_id = 9\n");
        let repo = temp.path().join("repo");
        fs::create_dir_all(repo.join(".git")).unwrap();

        assert_eq!(find_config_file(&repo), None);
    }

    #[test]
    fn test_cli_overrides_file() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        write_config(temp.path(), "[server]\njava = \"/opt/jdk/bin/java\"\n[shutdown]\nport = 60001\n");

        let cli = CliArgs {
            java: Some(PathBuf::from("/usr/bin/java")),
            port: Some(60002),
            ..CliArgs::default()
        };
        let config = Config::discover_with_env(temp.path(), &cli, no_env).unwrap();
        assert_eq!(config.server.java, PathBuf::from("/usr/bin/java"));
        assert_eq!(config.shutdown.port, 60002);
        assert_eq!(config.source_of("java"), ConfigSource::Cli);
    }

    #[test]
    fn test_classpath_env_is_lowest_explicit_source() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        let env = |key: &str| (key == "CLASSPATH").then(|| "/build/classes".to_string());

        let config = Config::discover_with_env(temp.path(), &CliArgs::default(), env).unwrap();
        assert_eq!(config.server.classpath.as_deref(), Some("/build/classes"));
        assert_eq!(config.source_of("classpath"), ConfigSource::Environment);

        write_config(temp.path(), "[server]\nclasspath = \"target/classes\"\n");
        let config = Config::discover_with_env(temp.path(), &CliArgs::default(), env).unwrap();
        assert_eq!(config.server.classpath.as_deref(), Some("target/classes"));
        assert_eq!(config.source_of("classpath"), ConfigSource::Config);
    }

    #[test]
    fn test_env_var_names_explicit_file() {
        let temp = TempDir::new().unwrap();
        let explicit = temp.path().join("ci.toml");
        fs::write(&explicit, "[shutdown]\ntimeout_ms = 5000\n").unwrap();
        let explicit_str = explicit.display().to_string();
        let env = move |key: &str| (key == CONFIG_ENV_VAR).then(|| explicit_str.clone());

        let config = Config::discover_with_env(temp.path(), &CliArgs::default(), env).unwrap();
        assert_eq!(config.shutdown.timeout_ms, 5000);
        assert_eq!(config.config_file, Some(explicit));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let cli = CliArgs {
            config_path: Some(temp.path().join("absent.toml")),
            ..CliArgs::default()
        };
        let err = Config::discover_with_env(temp.path(), &cli, no_env).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        write_config(temp.path(), "[server]\nmarker = \"SYS0002\"\n");

        let err = Config::discover_with_env(temp.path(), &CliArgs::default(), no_env).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFile(_)));
    }

    #[test]
    fn test_invalid_value_from_file_fails_validation() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        write_config(temp.path(), "[shutdown]\ntimeout_ms = 0\n");

        let err = Config::discover_with_env(temp.path(), &CliArgs::default(), no_env).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "timeout_ms"));
    }
}
