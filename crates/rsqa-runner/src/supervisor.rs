//! Supervision of one RiskShield-Server process
//!
//! [`ServerProcess::start`] spawns the server, drains stderr in the background
//! and blocks until the startup marker shows up on stdout. From then on both
//! streams are drained by owned tasks until [`ServerProcess::shutdown`] runs the
//! companion process, makes sure the server is gone, and collects the drains.

use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::BufReader;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::command_spec::CommandSpec;
use crate::drain::{DrainHandle, DrainReport, drain_until_marker, spawn_drain};
use crate::error::{DrainError, SupervisorError};
use crate::launch::{JvmSettings, ServerLaunch, ShutdownOptions, shutdown_command};
use crate::log_sink::LogSink;
use crate::types::{ProcessState, ShutdownStatus, StreamKind};

/// How long a failed launch waits for the stderr drain before cancelling it.
const FAILED_LAUNCH_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// How the server process ended during shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServerExit {
    /// Exited on its own. `code` is `None` when a signal ended it.
    Exited { code: Option<i32> },
    /// The shutdown command succeeded but the server outlived the exit grace period.
    KilledAfterGrace,
    /// The shutdown command failed, so the server was killed.
    KilledAfterFailedShutdown,
}

impl ServerExit {
    #[must_use]
    pub const fn was_killed(&self) -> bool {
        !matches!(self, Self::Exited { .. })
    }
}

/// Outcome of [`ServerProcess::shutdown`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShutdownReport {
    /// Exit code of the companion, `-1` when it was ended by a signal
    pub exit_code: i32,
    pub status: ShutdownStatus,
    pub server_killed: bool,
    pub server_exit: ServerExit,
    pub drains: Vec<DrainReport>,
    /// Lines that reached the sink after it was closed
    pub lines_dropped: u64,
}

impl ShutdownReport {
    /// True when the companion returned 0 and the server went away on its own.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.status.is_success() && !self.server_killed
    }
}

/// A running server and everything needed to stop it again.
///
/// The child is spawned with `kill_on_drop`, and the drain handles abort
/// their tasks on drop, so dropping a `ServerProcess` never leaks the server.
#[derive(Debug)]
pub struct ServerProcess {
    child: Child,
    pid: Option<u32>,
    state: ProcessState,
    sink: LogSink,
    stdout_drain: Option<DrainHandle>,
    stderr_drain: Option<DrainHandle>,
    classpath: String,
    work_dir: PathBuf,
    jvm: JvmSettings,
    label: String,
}

impl ServerProcess {
    /// Launch the server and wait until it reports readiness.
    ///
    /// # Errors
    ///
    /// - [`SupervisorError::Launch`] if the command line cannot be built or the
    ///   process cannot be spawned
    /// - [`SupervisorError::LogSink`] if the log file cannot be created
    /// - [`SupervisorError::StartupEof`], [`SupervisorError::StartupTimeout`] or
    ///   [`SupervisorError::StartupRead`] if the marker never shows up; the
    ///   child is killed before returning
    pub async fn start(launch: &ServerLaunch) -> Result<Self, SupervisorError> {
        let program = launch.jvm.java.to_string_lossy().into_owned();
        let spec = launch
            .server_command()
            .map_err(|source| SupervisorError::Launch {
                program: program.clone(),
                source,
            })?;
        let classpath = launch
            .classpath()
            .map_err(|source| SupervisorError::Launch {
                program: program.clone(),
                source,
            })?;

        let sink = LogSink::create(&launch.log_file)
            .await
            .map_err(|source| SupervisorError::LogSink {
                path: launch.log_file.clone(),
                source,
            })?;

        debug!(
            state = %ProcessState::Launching,
            command = %spec.display_line(),
            work_dir = %launch.work_dir.display(),
            "Spawning server"
        );
        let mut child = spawn_piped(&spec).map_err(|source| SupervisorError::Launch {
            program: program.clone(),
            source,
        })?;
        let pid = child.id();

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            reap(&mut child).await;
            return Err(SupervisorError::Launch {
                program,
                source: io::Error::other("child output was not captured"),
            });
        };

        let stderr_drain = spawn_drain(BufReader::new(stderr), sink.clone(), StreamKind::Stderr);
        let mut stdout = BufReader::new(stdout);

        debug!(pid, state = %ProcessState::AwaitingMarker, marker = %launch.marker, "Awaiting startup marker");
        let waited = wait_for_marker(&mut stdout, &sink, launch).await;

        if let Err(err) = waited {
            warn!(pid, error = %err, "Server did not become ready, killing it");
            reap(&mut child).await;
            let report = stderr_drain.join(FAILED_LAUNCH_DRAIN_TIMEOUT).await;
            debug!(?report, "Stderr drain collected after failed launch");
            if let Err(close_err) = sink.close().await {
                warn!(error = %close_err, "Failed to close server log");
            }
            debug!(pid, state = %ProcessState::Terminated, "Launch abandoned");
            return Err(err);
        }

        let stdout_drain = spawn_drain(stdout, sink.clone(), StreamKind::Stdout);
        info!(
            pid,
            state = %ProcessState::Running,
            label = %launch.label,
            log = %launch.log_file.display(),
            "Server running"
        );

        Ok(Self {
            child,
            pid,
            state: ProcessState::Running,
            sink,
            stdout_drain: Some(stdout_drain),
            stderr_drain: Some(stderr_drain),
            classpath,
            work_dir: launch.work_dir.clone(),
            jvm: launch.jvm.clone(),
            label: launch.label.clone(),
        })
    }

    /// Stop the server through the companion process.
    ///
    /// A non-zero companion exit code is reported, not returned as an error;
    /// in that case the server is killed and `server_killed` is set. Drains
    /// are collected and the log sink is closed on every path.
    ///
    /// # Errors
    ///
    /// - [`SupervisorError::AlreadyTerminated`] on a second call
    /// - [`SupervisorError::Shutdown`] if the companion could not be spawned
    ///   or waited for; cleanup has already run
    pub async fn shutdown(
        &mut self,
        options: &ShutdownOptions,
    ) -> Result<ShutdownReport, SupervisorError> {
        if self.state == ProcessState::Terminated {
            return Err(SupervisorError::AlreadyTerminated);
        }
        self.state = ProcessState::ShuttingDown;
        debug!(pid = self.pid, state = %self.state, port = options.port, "Stopping server");

        let (exit_code, server_exit, failure) = match self.run_companion(options).await {
            Ok(0) => (0, self.await_exit(options.exit_grace).await, None),
            Ok(code) => {
                warn!(
                    pid = self.pid,
                    status = %ShutdownStatus::from_code(code),
                    "Shutdown command failed, killing server"
                );
                (code, self.kill_server().await, None)
            }
            Err(reason) => {
                warn!(pid = self.pid, %reason, "Shutdown command could not run, killing server");
                (-1, self.kill_server().await, Some(reason))
            }
        };

        let drains = self.join_drains(options.drain_join_timeout).await;
        if let Err(err) = self.sink.close().await {
            warn!(error = %err, log = %self.sink.path().display(), "Failed to close server log");
        }
        self.state = ProcessState::Terminated;

        if let Some(reason) = failure {
            return Err(SupervisorError::Shutdown { reason });
        }

        let report = ShutdownReport {
            exit_code,
            status: ShutdownStatus::from_code(exit_code),
            server_killed: server_exit.was_killed(),
            server_exit,
            drains,
            lines_dropped: self.sink.lines_dropped(),
        };
        info!(
            pid = self.pid,
            label = %self.label,
            exit_code,
            server_killed = report.server_killed,
            "Server stopped"
        );
        Ok(report)
    }

    /// Run the companion and return its exit code, or why it could not be run.
    async fn run_companion(&self, options: &ShutdownOptions) -> Result<i32, String> {
        let spec = shutdown_command(
            &self.jvm,
            &self.classpath,
            &self.work_dir,
            options.port,
            options.timeout_ms,
        );
        debug!(command = %spec.display_line(), "Running shutdown companion");

        let mut command = spec.to_tokio_command();
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        let mut companion = command
            .spawn()
            .map_err(|err| format!("failed to spawn '{}': {err}", spec.program_name()))?;

        match tokio::time::timeout(options.companion_grace, companion.wait()).await {
            Ok(Ok(status)) => Ok(exit_code(status)),
            Ok(Err(err)) => {
                warn!(error = %err, "Waiting for shutdown companion failed, killing it");
                recollect(&mut companion).await
            }
            Err(_) => {
                warn!(grace = ?options.companion_grace, "Shutdown companion did not exit, killing it");
                recollect(&mut companion).await
            }
        }
    }

    /// Give the server `grace` to exit, then kill it.
    async fn await_exit(&mut self, grace: Duration) -> ServerExit {
        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => ServerExit::Exited {
                code: status.code(),
            },
            Ok(Err(err)) => {
                warn!(error = %err, "Waiting for server exit failed, killing it");
                self.force_kill(ServerExit::KilledAfterGrace).await
            }
            Err(_) => {
                warn!(pid = self.pid, ?grace, "Server still running after shutdown, killing it");
                self.force_kill(ServerExit::KilledAfterGrace).await
            }
        }
    }

    async fn kill_server(&mut self) -> ServerExit {
        self.force_kill(ServerExit::KilledAfterFailedShutdown).await
    }

    async fn force_kill(&mut self, killed: ServerExit) -> ServerExit {
        if let Ok(Some(status)) = self.child.try_wait() {
            return ServerExit::Exited {
                code: status.code(),
            };
        }
        if let Err(err) = self.child.kill().await {
            warn!(pid = self.pid, error = %err, "Failed to kill server");
        }
        killed
    }

    async fn join_drains(&mut self, timeout: Duration) -> Vec<DrainReport> {
        let mut reports = Vec::with_capacity(2);
        for handle in [self.stdout_drain.take(), self.stderr_drain.take()]
            .into_iter()
            .flatten()
        {
            let report = handle.join(timeout).await;
            if !report.is_clean() {
                warn!(stream = %report.stream, status = ?report.status, "Output drain did not finish cleanly");
            }
            reports.push(report);
        }
        reports
    }

    #[must_use]
    pub const fn state(&self) -> ProcessState {
        self.state
    }

    /// OS process id captured at spawn.
    #[must_use]
    pub const fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// True while the OS process has not exited.
    pub fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    #[must_use]
    pub fn log_path(&self) -> &Path {
        self.sink.path()
    }

    #[must_use]
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Classpath handed to both the server and the companion.
    #[must_use]
    pub fn classpath(&self) -> &str {
        &self.classpath
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

fn spawn_piped(spec: &CommandSpec) -> io::Result<Child> {
    let mut command: Command = spec.to_tokio_command();
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    command.spawn()
}

async fn wait_for_marker<R>(
    stdout: &mut R,
    sink: &LogSink,
    launch: &ServerLaunch,
) -> Result<u64, SupervisorError>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    let marker = launch.marker.as_str();
    let waiting = drain_until_marker(stdout, sink, marker);
    let drained = match launch.startup_timeout {
        Some(limit) => match tokio::time::timeout(limit, waiting).await {
            Ok(drained) => drained,
            Err(_) => {
                return Err(SupervisorError::StartupTimeout {
                    marker: marker.to_string(),
                    timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                });
            }
        },
        None => waiting.await,
    };

    drained.map_err(|err| match err {
        DrainError::EofBeforeMarker { marker } => SupervisorError::StartupEof { marker },
        DrainError::Io(source) => SupervisorError::StartupRead {
            marker: marker.to_string(),
            source,
        },
    })
}

/// Kill the child if it is still running and wait for it.
async fn reap(child: &mut Child) {
    if let Ok(Some(_)) = child.try_wait() {
        return;
    }
    if let Err(err) = child.kill().await {
        warn!(pid = child.id(), error = %err, "Failed to kill child process");
    }
}

/// Kill an abandoned companion and wait again for its exit code.
async fn recollect(companion: &mut Child) -> Result<i32, String> {
    if let Err(err) = companion.start_kill() {
        debug!(error = %err, "Shutdown companion could not be signalled");
    }
    companion
        .wait()
        .await
        .map(exit_code)
        .map_err(|err| format!("failed to collect shutdown companion exit code: {err}"))
}

/// Exit code of a finished process; `-1` when a signal ended it.
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_exit_was_killed() {
        assert!(!ServerExit::Exited { code: Some(0) }.was_killed());
        assert!(!ServerExit::Exited { code: None }.was_killed());
        assert!(ServerExit::KilledAfterGrace.was_killed());
        assert!(ServerExit::KilledAfterFailedShutdown.was_killed());
    }

    #[test]
    fn test_shutdown_report_serializes_tagged_exit() {
        let report = ShutdownReport {
            exit_code: 2,
            status: ShutdownStatus::Error,
            server_killed: true,
            server_exit: ServerExit::KilledAfterFailedShutdown,
            drains: Vec::new(),
            lines_dropped: 0,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["exit_code"], 2);
        assert_eq!(json["server_exit"]["kind"], "killed_after_failed_shutdown");
        assert!(!report.is_clean());
    }

    #[tokio::test]
    async fn test_start_fails_when_program_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut launch = ServerLaunch::new(
            dir.path(),
            dir.path(),
            dir.path().join("rss.log"),
            dir.path().join("server.ini"),
            0,
            "missing",
        );
        launch.jvm.java = dir.path().join("no-such-java");

        let err = ServerProcess::start(&launch).await.unwrap_err();
        assert!(err.is_launch_failure(), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn test_start_fails_when_log_dir_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let launch = ServerLaunch::new(
            dir.path(),
            dir.path(),
            dir.path().join("absent").join("rss.log"),
            dir.path().join("server.ini"),
            0,
            "no-log-dir",
        );

        let err = ServerProcess::start(&launch).await.unwrap_err();
        assert!(matches!(err, SupervisorError::LogSink { .. }));
    }
}
