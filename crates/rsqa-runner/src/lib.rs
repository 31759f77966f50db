//! Process supervision for RiskShield-Server integration tests
//!
//! Starts the server JVM, waits for its startup marker, drains both output
//! streams into a log file, and stops it again through the shutdown companion.
//!
//! # Process Model
//!
//! All process execution goes through [`CommandSpec`], so arguments reach the
//! JVM as discrete elements and classpath wildcards are never shell-expanded.
//! Children are spawned with `kill_on_drop`; drain tasks are owned by
//! [`DrainHandle`] and aborted when dropped.

pub mod command_spec;
pub mod drain;
pub mod error;
pub mod launch;
pub mod log_sink;
pub mod supervisor;
pub mod types;

pub use command_spec::CommandSpec;
pub use drain::{DrainHandle, DrainReport, DrainStatus, drain_until_marker, spawn_drain};
pub use error::{DrainError, SupervisorError};
pub use launch::{
    CLASSPATH_SEPARATOR, DEFAULT_JAVA, DEFAULT_SERVER_CLASS, DEFAULT_SHUTDOWN_CLASS,
    DEFAULT_STARTUP_MARKER, JvmSettings, ServerLaunch, ShutdownOptions, shutdown_command,
};
pub use log_sink::LogSink;
pub use supervisor::{ServerExit, ServerProcess, ShutdownReport};
pub use types::{ProcessState, ShutdownStatus, StreamKind};
