//! Exit code constants for the `rsqa` CLI.
//!
//! # Exit Code Table
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Operation completed successfully |
//! | 1 | `INTERNAL` | General/internal failure |
//! | 2 | `CLI_ARGS` | Invalid CLI arguments, configuration or fixture input |
//! | 3 | `ASSERTION_FAILED` | A CSV comparison or log check failed |
//! | 4 | `LAUNCH_FAILED` | The server could not be started or never became ready |
//! | 5 | `SHUTDOWN_FAILED` | The shutdown command could not be run |
//! | 6 | `DIRECTORY` | Work directory could not be prepared or cleaned |

/// Exit codes matching the documented exit code table.
///
/// Use the named constants, or [`as_i32()`](Self::as_i32) to get the numeric
/// value for `std::process::exit()`.
///
/// # Example
///
/// ```rust
/// use rsqa_utils::exit_codes::ExitCode;
///
/// let code = ExitCode::ASSERTION_FAILED;
/// assert_eq!(code.as_i32(), 3);
/// assert_eq!(ExitCode::SUCCESS, ExitCode::from_i32(0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Success - operation completed successfully
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Internal error - general failure
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// CLI arguments error - invalid arguments, configuration or fixture input
    pub const CLI_ARGS: ExitCode = ExitCode(2);

    /// Assertion failed - CSV files differ or the log check did not hold
    pub const ASSERTION_FAILED: ExitCode = ExitCode(3);

    /// Launch failed - server could not be spawned or exited before its marker
    pub const LAUNCH_FAILED: ExitCode = ExitCode(4);

    /// Shutdown failed - shutdown companion could not be run
    pub const SHUTDOWN_FAILED: ExitCode = ExitCode(5);

    /// Directory error - work directory could not be prepared or cleaned up
    pub const DIRECTORY: ExitCode = ExitCode(6);

    /// Get the numeric exit code value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Create an ExitCode from a raw i32 value.
    ///
    /// Prefer using the named constants when possible.
    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }

    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 == 0
    }
}

impl From<i32> for ExitCode {
    fn from(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values_are_stable() {
        assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
        assert_eq!(ExitCode::INTERNAL.as_i32(), 1);
        assert_eq!(ExitCode::CLI_ARGS.as_i32(), 2);
        assert_eq!(ExitCode::ASSERTION_FAILED.as_i32(), 3);
        assert_eq!(ExitCode::LAUNCH_FAILED.as_i32(), 4);
        assert_eq!(ExitCode::SHUTDOWN_FAILED.as_i32(), 5);
        assert_eq!(ExitCode::DIRECTORY.as_i32(), 6);
    }

    #[test]
    fn test_conversions() {
        let code: ExitCode = 3.into();
        assert_eq!(code, ExitCode::ASSERTION_FAILED);
        assert_eq!(i32::from(ExitCode::DIRECTORY), 6);
        assert!(ExitCode::SUCCESS.is_success());
        assert!(!ExitCode::INTERNAL.is_success());
        assert_eq!(ExitCode::LAUNCH_FAILED.to_string(), "4");
    }
}
