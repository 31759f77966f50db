//! Shared error types, exit codes and logging setup for rsqa
//!
//! Every other rsqa crate reports failures through the types in [`error`];
//! the CLI maps them to [`exit_codes::ExitCode`] values.

pub mod error;
pub mod exit_codes;
pub mod logging;

pub use error::{
    AssertionError, ConfigError, DirectoryError, ErrorCategory, FixtureError, QaError,
    UserFriendlyError,
};
pub use exit_codes::ExitCode;
