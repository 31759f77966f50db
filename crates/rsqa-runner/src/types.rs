//! Types used by the runner module

use serde::{Deserialize, Serialize};

/// Lifecycle of a supervised server process.
///
/// `Launching -> AwaitingMarker -> Running -> ShuttingDown -> Terminated`, with
/// `AwaitingMarker -> Terminated` when stdout closes before the startup marker.
///
/// `Launching` and `AwaitingMarker` are the phases inside
/// [`ServerProcess::start`](crate::ServerProcess::start); they show up in its
/// debug events, never on a returned handle, which starts out `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    Launching,
    AwaitingMarker,
    Running,
    ShuttingDown,
    Terminated,
}

impl ProcessState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Launching => "launching",
            Self::AwaitingMarker => "awaiting_marker",
            Self::Running => "running",
            Self::ShuttingDown => "shutting_down",
            Self::Terminated => "terminated",
        }
    }
}

impl std::fmt::Display for ProcessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which output stream of the child a drain reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl StreamKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exit code taxonomy of the shutdown companion process.
///
/// | Code | Variant        | Description                          |
/// |------|----------------|--------------------------------------|
/// | 0    | `Ok`           | shutdown command executed            |
/// | 1    | `Usage`        | wrong command line arguments         |
/// | 2    | `Error`        | error during execution               |
/// | 3    | `Fatal`        | fatal error during execution         |
/// | 4    | `SystemError`  | tool could not be instantiated       |
///
/// Any other value (including `-1` for a companion killed by a signal) maps to
/// `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownStatus {
    Ok,
    Usage,
    Error,
    Fatal,
    SystemError,
    Other(i32),
}

impl ShutdownStatus {
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Ok,
            1 => Self::Usage,
            2 => Self::Error,
            3 => Self::Fatal,
            4 => Self::SystemError,
            other => Self::Other(other),
        }
    }

    #[must_use]
    pub const fn code(&self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::Usage => 1,
            Self::Error => 2,
            Self::Fatal => 3,
            Self::SystemError => 4,
            Self::Other(code) => *code,
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Ok)
    }

    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Ok => "tool execution successful",
            Self::Usage => "wrong command line arguments",
            Self::Error => "error during execution",
            Self::Fatal => "fatal error during execution",
            Self::SystemError => "could not instantiate tool",
            Self::Other(_) => "unknown exit code",
        }
    }
}

impl std::fmt::Display for ShutdownStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code(), self.description())
    }
}
