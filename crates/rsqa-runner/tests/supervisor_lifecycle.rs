//! Lifecycle tests for `ServerProcess` against a scripted stand-in for `java`
//!
//! The script behaves like the server unless its arguments name the shutdown
//! class, in which case it behaves like the companion. Per-test behaviour is
//! selected through files in the work directory so one script serves every
//! test in this binary.

#![cfg(unix)]

use nix::sys::signal::kill;
use nix::unistd::Pid;
use rsqa_runner::{
    DrainStatus, JvmSettings, ProcessState, ServerExit, ServerLaunch, ServerProcess,
    ShutdownOptions, ShutdownStatus, StreamKind, SupervisorError,
};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;
use tempfile::TempDir;

const FAKE_JAVA: &str = r#"#!/bin/sh
mode=$(cat fake-server.mode 2>/dev/null)
for arg in "$@"; do
  if [ "$arg" = "com.riskshield.server.Shutdown" ]; then
    echo "$*" > fake-companion.args
    if [ "$(cat fake-companion.mode 2>/dev/null)" = "hang" ]; then
      while true; do sleep 0.05; done
    fi
    code=$(cat fake-companion.exit 2>/dev/null || echo 0)
    [ "$code" = "0" ] && touch stop
    exit "$code"
  fi
done
echo $$ > fake-server.pid
echo "$*" > fake-server.args
echo "2026-10-16 12:00:00 | I | starting instance"
echo "2026-10-16 12:00:00 | I | native libraries loaded" >&2
if [ "$mode" = "no-marker" ]; then
  echo "2026-10-16 12:00:01 | F | cannot bind command port"
  exit 3
fi
if [ "$mode" = "silent" ]; then
  while true; do sleep 0.05; done
fi
echo "2026-10-16 12:00:01 | I | SYS0002 server ready"
while [ ! -f stop ]; do sleep 0.05; done
echo "2026-10-16 12:00:02 | I | SYS0003 server stopped"
if [ "$mode" = "linger" ]; then
  while true; do sleep 0.05; done
fi
exit 0
"#;

/// Path of the shared stand-in script, written once per test binary.
fn fake_java() -> &'static Path {
    static SCRIPT: OnceLock<PathBuf> = OnceLock::new();
    SCRIPT.get_or_init(|| {
        let dir = tempfile::tempdir().unwrap().keep();
        let path = dir.join("java");
        fs::write(&path, FAKE_JAVA).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    })
}

struct Fixture {
    root: TempDir,
    launch: ServerLaunch,
}

impl Fixture {
    fn new(label: &str) -> Self {
        let script = fake_java();
        let root = tempfile::tempdir().unwrap();
        let work = root.path().join("work");
        fs::create_dir_all(&work).unwrap();
        fs::create_dir_all(root.path().join("rss/lib")).unwrap();
        fs::write(root.path().join("server.ini"), "[server]\nport=55556\n").unwrap();

        let launch = ServerLaunch::new(
            root.path().join("rss"),
            &work,
            work.join("rss.log"),
            root.path().join("server.ini"),
            7,
            label,
        )
        .with_jvm(JvmSettings {
            java: script.to_path_buf(),
            caller_classpath: Some("/build/test-classes".to_string()),
            ..JvmSettings::default()
        });

        Self { root, launch }
    }

    fn work(&self) -> PathBuf {
        self.root.path().join("work")
    }

    fn set(&self, file: &str, content: &str) {
        fs::write(self.work().join(file), content).unwrap();
    }

    fn read(&self, file: &str) -> String {
        fs::read_to_string(self.work().join(file)).unwrap()
    }

    /// Give this fixture its own copy of the script, so a test can remove it.
    fn private_java(&mut self) -> PathBuf {
        let path = self.root.path().join("java");
        fs::copy(fake_java(), &path).unwrap();
        self.launch.jvm.java = path.clone();
        path
    }

    fn server_pid(&self) -> Pid {
        Pid::from_raw(self.read("fake-server.pid").trim().parse().unwrap())
    }
}

fn fast_options() -> ShutdownOptions {
    ShutdownOptions::new(55556, 2000)
        .with_companion_grace(Duration::from_secs(10))
        .with_exit_grace(Duration::from_secs(5))
        .with_drain_join_timeout(Duration::from_secs(5))
}

fn assert_gone(pid: Pid) {
    assert!(kill(pid, None).is_err(), "process {pid} is still alive");
}

#[tokio::test]
async fn test_startup_and_clean_shutdown() {
    let fixture = Fixture::new("RssUtilTest.startupAndShutdown");

    let mut server = ServerProcess::start(&fixture.launch).await.unwrap();
    assert_eq!(server.state(), ProcessState::Running);
    assert!(server.is_alive());
    assert!(server.pid().is_some());

    // everything up to and including the marker is in the log before start returns
    let log = fixture.read("rss.log");
    assert!(log.contains("| I | starting instance"));
    assert!(log.contains("SYS0002 server ready"));

    let report = server.shutdown(&fast_options()).await.unwrap();
    assert_eq!(report.exit_code, 0);
    assert_eq!(report.status, ShutdownStatus::Ok);
    assert!(!report.server_killed);
    assert_eq!(report.server_exit, ServerExit::Exited { code: Some(0) });
    assert!(report.is_clean());
    assert_eq!(report.drains.len(), 2);
    assert!(report.drains.iter().all(|d| d.status == DrainStatus::Finished));
    assert_eq!(server.state(), ProcessState::Terminated);

    let log = fixture.read("rss.log");
    assert!(log.contains("SYS0003 server stopped"));
    assert!(log.contains("native libraries loaded"));
    for level in ["| W |", "| E |", "| F |"] {
        assert!(!log.contains(level), "unexpected {level} line in:\n{log}");
    }
    assert_gone(fixture.server_pid());
}

#[tokio::test]
async fn test_server_and_companion_command_lines() {
    let fixture = Fixture::new("CommandLineTest.layout");
    let mut server = ServerProcess::start(&fixture.launch).await.unwrap();
    server.shutdown(&fast_options()).await.unwrap();

    let rss = std::path::absolute(fixture.root.path().join("rss")).unwrap();
    let classpath = format!("{}/lib/*:/build/test-classes", rss.display());
    assert_eq!(server.classpath(), classpath);

    let server_args = fixture.read("fake-server.args");
    assert!(server_args.starts_with("-Dtest.method=CommandLineTest.layout "));
    assert!(server_args.contains(&format!("-Djava.library.path={}/bin", rss.display())));
    assert!(server_args.contains(&format!("-classpath {classpath} com.riskshield.server.Starter")));
    assert!(server_args.trim_end().ends_with("-s7"));

    let companion_args = fixture.read("fake-companion.args");
    assert_eq!(
        companion_args.trim_end(),
        format!("-classpath {classpath} com.riskshield.server.Shutdown -p55556 -t2000")
    );
}

#[tokio::test]
async fn test_eof_before_marker_fails_and_leaves_no_process() {
    let fixture = Fixture::new("StartupTest.noMarker");
    fixture.set("fake-server.mode", "no-marker");

    let err = ServerProcess::start(&fixture.launch).await.unwrap_err();
    assert!(matches!(err, SupervisorError::StartupEof { .. }));
    assert_eq!(
        err.to_string(),
        "could not find 'SYS0002': unexpected EOF occurred"
    );

    assert!(fixture.read("rss.log").contains("| F | cannot bind command port"));
    assert_gone(fixture.server_pid());
}

#[tokio::test]
async fn test_startup_timeout_kills_silent_server() {
    let mut fixture = Fixture::new("StartupTest.silent");
    fixture.set("fake-server.mode", "silent");
    fixture.launch.startup_timeout = Some(Duration::from_millis(500));

    let err = ServerProcess::start(&fixture.launch).await.unwrap_err();
    assert!(
        matches!(err, SupervisorError::StartupTimeout { timeout_ms: 500, .. }),
        "unexpected error: {err}"
    );
    assert_gone(fixture.server_pid());
}

#[tokio::test]
async fn test_failed_shutdown_command_kills_server() {
    let fixture = Fixture::new("ShutdownTest.companionError");
    fixture.set("fake-companion.exit", "2");

    let mut server = ServerProcess::start(&fixture.launch).await.unwrap();
    let pid = fixture.server_pid();
    let report = server.shutdown(&fast_options()).await.unwrap();

    assert_eq!(report.exit_code, 2);
    assert_eq!(report.status, ShutdownStatus::Error);
    assert!(report.server_killed);
    assert_eq!(report.server_exit, ServerExit::KilledAfterFailedShutdown);
    assert!(!report.is_clean());
    assert_eq!(server.state(), ProcessState::Terminated);
    assert_gone(pid);
}

#[tokio::test]
async fn test_server_outliving_exit_grace_is_killed() {
    let fixture = Fixture::new("ShutdownTest.linger");
    fixture.set("fake-server.mode", "linger");

    let mut server = ServerProcess::start(&fixture.launch).await.unwrap();
    let pid = fixture.server_pid();
    let options = fast_options().with_exit_grace(Duration::from_millis(300));
    let report = server.shutdown(&options).await.unwrap();

    assert_eq!(report.exit_code, 0);
    assert_eq!(report.server_exit, ServerExit::KilledAfterGrace);
    assert!(report.server_killed);
    assert_gone(pid);
}

#[tokio::test]
async fn test_second_shutdown_is_rejected() {
    let fixture = Fixture::new("ShutdownTest.twice");

    let mut server = ServerProcess::start(&fixture.launch).await.unwrap();
    server.shutdown(&fast_options()).await.unwrap();

    let err = server.shutdown(&fast_options()).await.unwrap_err();
    assert!(matches!(err, SupervisorError::AlreadyTerminated));
}

#[tokio::test]
async fn test_drain_reports_name_both_streams() {
    let fixture = Fixture::new("DrainTest.streams");

    let mut server = ServerProcess::start(&fixture.launch).await.unwrap();
    let report = server.shutdown(&fast_options()).await.unwrap();

    let streams: Vec<StreamKind> = report.drains.iter().map(|d| d.stream).collect();
    assert_eq!(streams, vec![StreamKind::Stdout, StreamKind::Stderr]);
    let stdout = &report.drains[0];
    // only lines after the marker go through the background drain
    assert_eq!(stdout.lines_forwarded, 1);
}

#[tokio::test]
async fn test_hanging_companion_is_killed_and_server_too() {
    let fixture = Fixture::new("ShutdownTest.companionHangs");
    fixture.set("fake-companion.mode", "hang");

    let mut server = ServerProcess::start(&fixture.launch).await.unwrap();
    let pid = fixture.server_pid();
    let options = fast_options().with_companion_grace(Duration::from_millis(300));
    let report = server.shutdown(&options).await.unwrap();

    assert_eq!(report.exit_code, -1);
    assert_eq!(report.status, ShutdownStatus::from_code(-1));
    assert!(report.server_killed);
    assert_eq!(report.server_exit, ServerExit::KilledAfterFailedShutdown);
    assert_eq!(server.state(), ProcessState::Terminated);
    assert_gone(pid);
}

#[tokio::test]
async fn test_companion_that_cannot_spawn_still_cleans_up() {
    let mut fixture = Fixture::new("ShutdownTest.noCompanion");
    let java = fixture.private_java();

    let mut server = ServerProcess::start(&fixture.launch).await.unwrap();
    let pid = fixture.server_pid();
    fs::remove_file(&java).unwrap();

    let err = server.shutdown(&fast_options()).await.unwrap_err();
    assert!(
        matches!(err, SupervisorError::Shutdown { ref reason } if reason.contains("failed to spawn")),
        "unexpected error: {err}"
    );
    assert_eq!(server.state(), ProcessState::Terminated);
    assert!(!server.is_alive());
    assert_gone(pid);
}

#[tokio::test]
async fn test_log_is_final_after_shutdown() {
    let fixture = Fixture::new("ShutdownTest.logClosed");

    let mut server = ServerProcess::start(&fixture.launch).await.unwrap();
    let report = server.shutdown(&fast_options()).await.unwrap();
    assert_eq!(report.lines_dropped, 0);

    let closed = fixture.read("rss.log");
    assert!(closed.ends_with("SYS0003 server stopped\n"));
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(fixture.read("rss.log"), closed);
}
