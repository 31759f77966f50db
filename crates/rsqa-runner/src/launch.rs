//! Command lines for the RiskShield-Server JVM and its shutdown companion
//!
//! Server:
//!
//! ```text
//! java -Dtest.method=<label> -Djava.library.path=<runtime>/bin
//!      -classpath <runtime>/lib/*<sep><caller classpath>
//!      com.riskshield.server.Starter -i<init file> -s<instance id>
//! ```
//!
//! Companion:
//!
//! ```text
//! java -classpath <same classpath> com.riskshield.server.Shutdown -p<port> -t<timeout ms>
//! ```

use std::io;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use std::time::Duration;

use crate::command_spec::CommandSpec;

/// Substring the server prints on stdout once initialization has finished.
pub const DEFAULT_STARTUP_MARKER: &str = "SYS0002";
pub const DEFAULT_JAVA: &str = "java";
pub const DEFAULT_SERVER_CLASS: &str = "com.riskshield.server.Starter";
pub const DEFAULT_SHUTDOWN_CLASS: &str = "com.riskshield.server.Shutdown";

#[cfg(windows)]
pub const CLASSPATH_SEPARATOR: &str = ";";
#[cfg(not(windows))]
pub const CLASSPATH_SEPARATOR: &str = ":";

/// JVM binary and entry points shared by the server and the companion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JvmSettings {
    pub java: PathBuf,
    pub server_class: String,
    pub shutdown_class: String,
    /// Appended after `<runtime>/lib/*`. `None` or empty adds nothing.
    pub caller_classpath: Option<String>,
}

impl Default for JvmSettings {
    fn default() -> Self {
        Self {
            java: PathBuf::from(DEFAULT_JAVA),
            server_class: DEFAULT_SERVER_CLASS.to_string(),
            shutdown_class: DEFAULT_SHUTDOWN_CLASS.to_string(),
            caller_classpath: None,
        }
    }
}

/// Everything needed to start one server instance.
#[derive(Debug, Clone)]
pub struct ServerLaunch {
    /// Distribution root containing at least `bin/` and `lib/`
    pub runtime_dir: PathBuf,
    /// Working directory of the server process
    pub work_dir: PathBuf,
    /// Receives stdout and stderr; truncated on start
    pub log_file: PathBuf,
    /// Server initialization file
    pub init_file: PathBuf,
    /// Identifies the instance in shared log files
    pub instance_id: u32,
    /// Passed as `-Dtest.method` so the test is visible in process listings
    pub label: String,
    pub marker: String,
    /// `None` waits for the marker until stdout closes
    pub startup_timeout: Option<Duration>,
    pub jvm: JvmSettings,
}

impl ServerLaunch {
    #[must_use]
    pub fn new(
        runtime_dir: impl Into<PathBuf>,
        work_dir: impl Into<PathBuf>,
        log_file: impl Into<PathBuf>,
        init_file: impl Into<PathBuf>,
        instance_id: u32,
        label: impl Into<String>,
    ) -> Self {
        Self {
            runtime_dir: runtime_dir.into(),
            work_dir: work_dir.into(),
            log_file: log_file.into(),
            init_file: init_file.into(),
            instance_id,
            label: label.into(),
            marker: DEFAULT_STARTUP_MARKER.to_string(),
            startup_timeout: None,
            jvm: JvmSettings::default(),
        }
    }

    #[must_use]
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    #[must_use]
    pub fn with_startup_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.startup_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_jvm(mut self, jvm: JvmSettings) -> Self {
        self.jvm = jvm;
        self
    }

    /// Absolute `<runtime>/bin`, used as `java.library.path`.
    pub fn library_path(&self) -> io::Result<PathBuf> {
        std::path::absolute(self.runtime_dir.join("bin"))
    }

    /// `<abs runtime>/lib/*` followed by the caller's classpath, if any.
    pub fn classpath(&self) -> io::Result<String> {
        let lib_dir = std::path::absolute(self.runtime_dir.join("lib"))?;
        let mut classpath = format!("{}{MAIN_SEPARATOR}*", lib_dir.display());
        if let Some(extra) = self.jvm.caller_classpath.as_deref().filter(|cp| !cp.is_empty()) {
            classpath.push_str(CLASSPATH_SEPARATOR);
            classpath.push_str(extra);
        }
        Ok(classpath)
    }

    /// Build the server command line with `work_dir` as working directory.
    pub fn server_command(&self) -> io::Result<CommandSpec> {
        let library_path = self.library_path()?;
        let classpath = self.classpath()?;
        let init_file = std::path::absolute(&self.init_file)?;

        Ok(CommandSpec::new(self.jvm.java.as_os_str())
            .arg(format!("-Dtest.method={}", self.label))
            .arg(format!("-Djava.library.path={}", library_path.display()))
            .arg("-classpath")
            .arg(classpath)
            .arg(&self.jvm.server_class)
            .arg(format!("-i{}", init_file.display()))
            .arg(format!("-s{}", self.instance_id))
            .cwd(&self.work_dir))
    }
}

/// Build the companion command that asks a running server to stop.
#[must_use]
pub fn shutdown_command(
    jvm: &JvmSettings,
    classpath: &str,
    work_dir: &Path,
    port: u16,
    timeout_ms: u64,
) -> CommandSpec {
    CommandSpec::new(jvm.java.as_os_str())
        .arg("-classpath")
        .arg(classpath)
        .arg(&jvm.shutdown_class)
        .arg(format!("-p{port}"))
        .arg(format!("-t{timeout_ms}"))
        .cwd(work_dir)
}

/// Tunables of [`ServerProcess::shutdown`](crate::ServerProcess::shutdown).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownOptions {
    /// Command port of the server
    pub port: u16,
    /// Passed to the companion as `-t<ms>`
    pub timeout_ms: u64,
    /// How long to wait for the companion before killing it
    pub companion_grace: Duration,
    /// How long a server gets to exit on its own after a successful shutdown command
    pub exit_grace: Duration,
    /// How long to wait for drain tasks before cancelling them
    pub drain_join_timeout: Duration,
}

impl ShutdownOptions {
    #[must_use]
    pub fn new(port: u16, timeout_ms: u64) -> Self {
        Self {
            port,
            timeout_ms,
            companion_grace: Duration::from_millis(timeout_ms) + Duration::from_secs(10),
            exit_grace: Duration::from_secs(5),
            drain_join_timeout: Duration::from_secs(5),
        }
    }

    #[must_use]
    pub fn with_companion_grace(mut self, grace: Duration) -> Self {
        self.companion_grace = grace;
        self
    }

    #[must_use]
    pub fn with_exit_grace(mut self, grace: Duration) -> Self {
        self.exit_grace = grace;
        self
    }

    #[must_use]
    pub fn with_drain_join_timeout(mut self, timeout: Duration) -> Self {
        self.drain_join_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    fn launch() -> ServerLaunch {
        ServerLaunch::new(
            "/opt/rss",
            "/tmp/work",
            "/tmp/work/rss.log",
            "/tests/config/server.ini",
            3,
            "RssUtilTest.startupAndShutdown",
        )
    }

    #[cfg(unix)]
    #[test]
    fn test_server_command_layout() {
        let mut launch = launch();
        launch.jvm.caller_classpath = Some("/build/classes".to_string());
        let cmd = launch.server_command().unwrap();

        assert_eq!(cmd.program, OsString::from("java"));
        let args: Vec<String> = cmd
            .args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "-Dtest.method=RssUtilTest.startupAndShutdown",
                "-Djava.library.path=/opt/rss/bin",
                "-classpath",
                "/opt/rss/lib/*:/build/classes",
                "com.riskshield.server.Starter",
                "-i/tests/config/server.ini",
                "-s3",
            ]
        );
        assert_eq!(cmd.cwd, Some(PathBuf::from("/tmp/work")));
    }

    #[cfg(unix)]
    #[test]
    fn test_empty_caller_classpath_adds_no_separator() {
        let mut launch = launch();
        launch.jvm.caller_classpath = Some(String::new());
        assert_eq!(launch.classpath().unwrap(), "/opt/rss/lib/*");
    }

    #[test]
    fn test_relative_paths_are_made_absolute() {
        let launch = ServerLaunch::new("lib/rss", "work", "work/rss.log", "server.ini", 0, "t");
        assert!(launch.library_path().unwrap().is_absolute());
        let cmd = launch.server_command().unwrap();
        let init_arg = cmd.args[5].to_string_lossy().into_owned();
        assert!(init_arg.starts_with("-i"));
        assert!(Path::new(&init_arg[2..]).is_absolute());
    }

    #[test]
    fn test_shutdown_command_layout() {
        let jvm = JvmSettings::default();
        let cmd = shutdown_command(&jvm, "lib/*", Path::new("work"), 55556, 2000);
        assert_eq!(
            cmd.display_line(),
            "java -classpath lib/* com.riskshield.server.Shutdown -p55556 -t2000"
        );
        assert_eq!(cmd.cwd, Some(PathBuf::from("work")));
    }

    #[test]
    fn test_shutdown_options_defaults() {
        let options = ShutdownOptions::new(55556, 2000);
        assert_eq!(options.companion_grace, Duration::from_secs(12));
        assert_eq!(options.exit_grace, Duration::from_secs(5));
        let options = options.with_exit_grace(Duration::from_millis(100));
        assert_eq!(options.exit_grace, Duration::from_millis(100));
    }
}
