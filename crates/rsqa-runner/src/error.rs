//! Error types for runner module

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Supervision errors for a RiskShield-Server process and its shutdown companion.
#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("Failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to open log file {}: {source}", path.display())]
    LogSink {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not find '{marker}': unexpected EOF occurred")]
    StartupEof { marker: String },

    #[error("Timed out after {timeout_ms} ms waiting for '{marker}'")]
    StartupTimeout { marker: String, timeout_ms: u64 },

    #[error("Failed to read server stdout while waiting for '{marker}': {source}")]
    StartupRead {
        marker: String,
        #[source]
        source: io::Error,
    },

    #[error("Shutdown failed: {reason}")]
    Shutdown { reason: String },

    #[error("Server process already terminated")]
    AlreadyTerminated,
}

impl SupervisorError {
    /// True for both startup failures that leave the server unready.
    #[must_use]
    pub const fn is_startup_failure(&self) -> bool {
        matches!(
            self,
            Self::StartupEof { .. } | Self::StartupTimeout { .. } | Self::StartupRead { .. }
        )
    }

    /// True when the failure surfaced as an end-of-file condition.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self, Self::StartupEof { .. })
    }

    #[must_use]
    pub const fn is_launch_failure(&self) -> bool {
        matches!(self, Self::Launch { .. } | Self::LogSink { .. })
    }

    #[must_use]
    pub const fn is_shutdown_failure(&self) -> bool {
        matches!(self, Self::Shutdown { .. } | Self::AlreadyTerminated)
    }
}

/// Failure of the blocking marker read, before it is mapped to a [`SupervisorError`].
#[derive(Error, Debug)]
pub enum DrainError {
    #[error("end of stream before marker '{marker}'")]
    EofBeforeMarker { marker: String },

    #[error("I/O error reading stream: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startup_eof_message_names_marker() {
        let err = SupervisorError::StartupEof {
            marker: "SYS0002".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "could not find 'SYS0002': unexpected EOF occurred"
        );
        assert!(err.is_eof());
        assert!(err.is_startup_failure());
        assert!(!err.is_shutdown_failure());
    }

    #[test]
    fn test_launch_error_keeps_source() {
        let err = SupervisorError::Launch {
            program: "java".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        assert!(err.is_launch_failure());
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("'java'"));
    }
}
