use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub use rsqa_runner::SupervisorError;

use crate::exit_codes::ExitCode;

/// Top-level error for harness operations.
///
/// `QaError` is what the harness, the fixture helpers and the CLI hand back.
/// It provides:
/// - the underlying error for programmatic handling
/// - user-facing messages with context and suggestions via [`UserFriendlyError`]
/// - a mapping to CLI exit codes via [`to_exit_code()`](Self::to_exit_code)
///
/// # Exit Code Mapping
///
/// | Exit Code | Error Type |
/// |-----------|------------|
/// | 2 | Configuration and fixture input errors |
/// | 3 | Assertion failures |
/// | 4 | Server launch and startup failures |
/// | 5 | Server shutdown failures |
/// | 6 | Directory errors |
/// | 1 | Other errors |
///
/// # Example
///
/// ```rust
/// use rsqa_utils::error::{AssertionError, QaError};
/// use rsqa_utils::exit_codes::ExitCode;
///
/// let err = QaError::from(AssertionError::LogMissingExpected {
///     path: "work/rss.log".into(),
///     targets: vec!["SYS0002".to_string()],
/// });
/// assert_eq!(err.to_exit_code(), ExitCode::ASSERTION_FAILED);
/// assert!(err.display_for_user().contains("Suggestions:"));
/// ```
#[derive(Error, Debug)]
pub enum QaError {
    #[error("Server supervision error: {0}")]
    Supervisor(#[from] SupervisorError),

    #[error("Assertion failed: {0}")]
    Assertion(#[from] AssertionError),

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Fixture error: {0}")]
    Fixture(#[from] FixtureError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Trait for providing user-friendly error reporting with context and suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get contextual information about the error
    fn context(&self) -> Option<String>;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    ServerLaunch,
    ServerShutdown,
    Assertion,
    Fixture,
    FileSystem,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::ServerLaunch => write!(f, "Server Launch"),
            Self::ServerShutdown => write!(f, "Server Shutdown"),
            Self::Assertion => write!(f, "Assertion"),
            Self::Fixture => write!(f, "Fixture"),
            Self::FileSystem => write!(f, "File System"),
        }
    }
}

// ============================================================================
// Assertions
// ============================================================================

/// A comparison or log check did not hold.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssertionError {
    #[error(
        "number of columns {left_count} in left file != number of columns {right_count} in right file{} (left file='{}', right file='{}')",
        describe_asymmetry(.only_in_left, .only_in_right),
        .left.display(),
        .right.display()
    )]
    ColumnSetMismatch {
        left: PathBuf,
        right: PathBuf,
        left_count: usize,
        right_count: usize,
        /// Columns the right file lacks
        only_in_left: Vec<String>,
        /// Columns the left file lacks
        only_in_right: Vec<String>,
    },

    #[error(
        "column {column}: number of rows on the right file {right_rows} does not match number of rows on the left file {left_rows}"
    )]
    RowCountMismatch {
        column: String,
        left_rows: usize,
        right_rows: usize,
    },

    /// `row` is the 0-based index of the data row, header excluded.
    #[error(
        "column {column}, row {row} [{left_value}] != [{right_value}] ([{left_hex}] != [{right_hex}])"
    )]
    CellMismatch {
        column: String,
        row: usize,
        left_value: String,
        right_value: String,
        left_hex: String,
        right_hex: String,
    },

    #[error(
        "log file {} is expected to have no lines containing {targets:?}, but found {total}:\n{}",
        .path.display(),
        .lines.join("\n")
    )]
    LogContainsUnexpected {
        path: PathBuf,
        targets: Vec<String>,
        /// Total number of matching lines
        total: usize,
        /// The first matching lines, capped for readability
        lines: Vec<String>,
    },

    #[error(
        "log file {} is expected to have at least one line containing {targets:?}",
        .path.display()
    )]
    LogMissingExpected { path: PathBuf, targets: Vec<String> },

    #[error(
        "log file {} is expected to have {expected} lines containing {targets:?}, but it has {actual} lines",
        .path.display()
    )]
    LogCountMismatch {
        path: PathBuf,
        targets: Vec<String>,
        expected: usize,
        actual: usize,
    },
}

fn describe_asymmetry(only_in_left: &[String], only_in_right: &[String]) -> String {
    let mut parts = Vec::new();
    parts.extend(only_in_left.iter().map(|c| format!("column {c} not found in right file")));
    parts.extend(only_in_right.iter().map(|c| format!("column {c} not found in left file")));
    if parts.is_empty() {
        String::new()
    } else {
        format!("; {}", parts.join("; "))
    }
}

impl UserFriendlyError for AssertionError {
    fn user_message(&self) -> String {
        match self {
            Self::ColumnSetMismatch { .. } => {
                "The two CSV files do not have the same columns".to_string()
            }
            Self::RowCountMismatch { column, .. } => {
                format!("Column '{column}' has a different number of rows in the two CSV files")
            }
            Self::CellMismatch { column, row, .. } => {
                format!("CSV files differ in column '{column}' at row {row}")
            }
            Self::LogContainsUnexpected { total, .. } => {
                format!("The log file contains {total} unexpected line(s)")
            }
            Self::LogMissingExpected { .. } => {
                "The log file does not contain an expected line".to_string()
            }
            Self::LogCountMismatch {
                expected, actual, ..
            } => format!("Expected {expected} matching log line(s), found {actual}"),
        }
    }

    fn context(&self) -> Option<String> {
        Some(self.to_string())
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::ColumnSetMismatch { .. } | Self::RowCountMismatch { .. } => vec![
                "Check that both files were written with the same separator and quote character"
                    .to_string(),
                "Regenerate the expected fixture if the output format changed on purpose"
                    .to_string(),
            ],
            Self::CellMismatch { .. } => vec![
                "Compare the hex encodings to spot invisible or mis-encoded characters"
                    .to_string(),
                "Check the charset used to read both files".to_string(),
            ],
            Self::LogContainsUnexpected { .. } => vec![
                "Inspect the server log around the reported lines".to_string(),
                "Keep the work directory with --keep-work to look at the full log".to_string(),
            ],
            Self::LogMissingExpected { .. } | Self::LogCountMismatch { .. } => vec![
                "Verify the log file path and that the server wrote to it".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Assertion
    }
}

// ============================================================================
// Directories
// ============================================================================

/// Work-directory and file-copy failures.
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("[{}] is not a directory", .path.display())]
    NotADirectory { path: PathBuf },

    #[error("Directory is not read/write: {}", .path.display())]
    NotReadWrite { path: PathBuf },

    #[error("Could not create directory {}: {source}", .path.display())]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not delete {}: {source}", .path.display())]
    DeleteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not list directory {}: {source}", .path.display())]
    ListFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not copy {} to {}: {source}", .from.display(), .to.display())]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl UserFriendlyError for DirectoryError {
    fn user_message(&self) -> String {
        self.to_string()
    }

    fn context(&self) -> Option<String> {
        Some("Each test runs in a fresh work directory that is deleted afterwards.".to_string())
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::NotADirectory { path } => vec![format!(
                "Remove or rename the file at {} so a directory can take its place",
                path.display()
            )],
            Self::NotReadWrite { path } | Self::CreateFailed { path, .. } => vec![format!(
                "Check the permissions of {} and its parent directories",
                path.display()
            )],
            Self::DeleteFailed { .. } | Self::ListFailed { .. } => vec![
                "Make sure no server process from an earlier run still holds files open"
                    .to_string(),
            ],
            Self::CopyFailed { from, .. } => {
                vec![format!("Check that {} exists and is readable", from.display())]
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::FileSystem
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// A fixture file could not be read or interpreted.
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse CSV file {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("Unknown character encoding '{label}'")]
    UnknownEncoding { label: String },

    #[error("Invalid CSV dialect: {reason}")]
    InvalidDialect { reason: String },

    #[error("Duplicate column '{column}' in header of {}", .path.display())]
    DuplicateColumn { path: PathBuf, column: String },
}

impl UserFriendlyError for FixtureError {
    fn user_message(&self) -> String {
        self.to_string()
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::UnknownEncoding { .. } => Some(
                "Encodings are named by their WHATWG label, e.g. UTF-8, ISO-8859-1, windows-1252."
                    .to_string(),
            ),
            Self::InvalidDialect { .. } => {
                Some("Separator and quote must each be a single ASCII character.".to_string())
            }
            Self::DuplicateColumn { .. } => Some(
                "Columns are matched by name, so every header name must be unique.".to_string(),
            ),
            Self::Read { .. } | Self::Parse { .. } => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Read { path, .. } => vec![format!("Check that {} exists", path.display())],
            Self::Parse { .. } => vec![
                "Check the separator and quote character passed for this file".to_string(),
            ],
            Self::UnknownEncoding { .. } => vec!["Use a label such as 'UTF-8'".to_string()],
            Self::InvalidDialect { .. } => {
                vec!["Pass e.g. --separator ';' --quote '\"'".to_string()]
            }
            Self::DuplicateColumn { column, .. } => {
                vec![format!("Rename one of the '{column}' columns in the fixture")]
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Fixture
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found at {path}")]
    NotFound { path: String },

    #[error("Configuration discovery failed: {reason}")]
    DiscoveryFailed { reason: String },

    #[error("Configuration validation failed: {error_count} errors")]
    ValidationFailed {
        errors: Vec<String>,
        error_count: usize,
    },
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(reason) => {
                format!("Configuration file has invalid format: {reason}")
            }
            Self::InvalidValue { key, value } => {
                format!("Configuration '{key}' has invalid value: {value}")
            }
            Self::NotFound { path } => {
                format!("Configuration file not found: {path}")
            }
            Self::DiscoveryFailed { reason } => {
                format!("Failed to discover configuration: {reason}")
            }
            Self::ValidationFailed { errors, .. } => {
                format!(
                    "Configuration validation failed with {} errors: {}",
                    errors.len(),
                    errors.join(", ")
                )
            }
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::InvalidFile(_) => Some(
                "Configuration files must be valid TOML with [server] and [shutdown] sections."
                    .to_string(),
            ),
            Self::NotFound { .. } | Self::DiscoveryFailed { .. } => Some(
                "rsqa searches for .rsqa/config.toml starting from the current directory upward."
                    .to_string(),
            ),
            Self::InvalidValue { .. } | Self::ValidationFailed { .. } => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile(_) => vec![
                "Check the TOML syntax using a TOML validator".to_string(),
                "Run 'rsqa config' to see the effective configuration".to_string(),
            ],
            Self::InvalidValue { key, .. } => match key.as_str() {
                "startup_marker" | "main_class" | "shutdown_class" => {
                    vec![format!("Set '{key}' to a non-empty string")]
                }
                "port" => vec!["Use a port between 1 and 65535".to_string()],
                _ => vec!["Use a positive value".to_string()],
            },
            Self::NotFound { path } => vec![
                format!("Create the file at {path} or unset RSQA_CONFIG"),
                "Pass --config to point at an existing file".to_string(),
            ],
            Self::DiscoveryFailed { .. } => {
                vec!["Pass --config to skip discovery".to_string()]
            }
            Self::ValidationFailed { .. } => {
                vec!["Fix the listed values in .rsqa/config.toml or on the command line".to_string()]
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

// ============================================================================
// Supervisor errors
// ============================================================================

impl UserFriendlyError for SupervisorError {
    fn user_message(&self) -> String {
        match self {
            Self::Launch { program, .. } => format!("Could not start '{program}'"),
            Self::LogSink { path, .. } => {
                format!("Could not create the server log {}", path.display())
            }
            Self::StartupEof { marker } => {
                format!("Server exited before printing '{marker}'")
            }
            Self::StartupTimeout { marker, timeout_ms } => {
                format!("Server did not print '{marker}' within {timeout_ms} ms")
            }
            Self::StartupRead { .. } => "Could not read server output during startup".to_string(),
            Self::Shutdown { reason } => format!("Server shutdown failed: {reason}"),
            Self::AlreadyTerminated => "The server was already shut down".to_string(),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::StartupEof { .. } | Self::StartupTimeout { .. } => {
                Some("The server log holds everything it printed before giving up.".to_string())
            }
            Self::Shutdown { .. } => Some(
                "The server was killed after the shutdown command could not run.".to_string(),
            ),
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Launch { .. } => vec![
                "Check that java is installed and on PATH, or pass --java".to_string(),
                "Check --runtime-dir points at the server distribution".to_string(),
            ],
            Self::LogSink { .. } => {
                vec!["Check that the work directory exists and is writable".to_string()]
            }
            Self::StartupEof { .. } | Self::StartupRead { .. } => vec![
                "Look for '| E |' or '| F |' lines in the server log".to_string(),
                "Check the server initialization file".to_string(),
            ],
            Self::StartupTimeout { .. } => vec![
                "Raise server.startup_timeout_ms in .rsqa/config.toml".to_string(),
                "Check that the startup marker matches the server version".to_string(),
            ],
            Self::Shutdown { .. } => {
                vec!["Check that the shutdown class is on the classpath".to_string()]
            }
            Self::AlreadyTerminated => Vec::new(),
        }
    }

    fn category(&self) -> ErrorCategory {
        if self.is_shutdown_failure() {
            ErrorCategory::ServerShutdown
        } else {
            ErrorCategory::ServerLaunch
        }
    }
}

impl UserFriendlyError for QaError {
    fn user_message(&self) -> String {
        match self {
            Self::Supervisor(err) => err.user_message(),
            Self::Assertion(err) => err.user_message(),
            Self::Directory(err) => err.user_message(),
            Self::Fixture(err) => err.user_message(),
            Self::Config(err) => err.user_message(),
            Self::Io(err) => format!("File operation failed: {err}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Supervisor(err) => err.context(),
            Self::Assertion(err) => err.context(),
            Self::Directory(err) => err.context(),
            Self::Fixture(err) => err.context(),
            Self::Config(err) => err.context(),
            Self::Io(_) => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Supervisor(err) => err.suggestions(),
            Self::Assertion(err) => err.suggestions(),
            Self::Directory(err) => err.suggestions(),
            Self::Fixture(err) => err.suggestions(),
            Self::Config(err) => err.suggestions(),
            Self::Io(_) => vec!["Check file permissions and available disk space".to_string()],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Supervisor(err) => err.category(),
            Self::Assertion(err) => err.category(),
            Self::Directory(err) => err.category(),
            Self::Fixture(err) => err.category(),
            Self::Config(err) => err.category(),
            Self::Io(_) => ErrorCategory::FileSystem,
        }
    }
}

impl QaError {
    /// Get a user-friendly error message with context and actionable suggestions.
    #[must_use]
    pub fn display_for_user(&self) -> String {
        let mut output = format!("Error: {}\n", self.user_message());

        if let Some(ctx) = self.context() {
            output.push_str(&format!("\nContext: {ctx}\n"));
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for suggestion in suggestions {
                output.push_str(&format!("  • {suggestion}\n"));
            }
        }

        output
    }

    /// Map this error to the CLI exit code.
    #[must_use]
    pub fn to_exit_code(&self) -> ExitCode {
        match self {
            Self::Config(_) | Self::Fixture(_) => ExitCode::CLI_ARGS,
            Self::Assertion(_) => ExitCode::ASSERTION_FAILED,
            Self::Supervisor(err) if err.is_shutdown_failure() => ExitCode::SHUTDOWN_FAILED,
            Self::Supervisor(_) => ExitCode::LAUNCH_FAILED,
            Self::Directory(_) => ExitCode::DIRECTORY,
            Self::Io(_) => ExitCode::INTERNAL,
        }
    }
}
