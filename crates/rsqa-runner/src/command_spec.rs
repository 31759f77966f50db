use std::ffi::OsString;
use std::path::PathBuf;
use tokio::process::Command as TokioCommand;

// ============================================================================
// CommandSpec - argv-style process specification
// ============================================================================

/// Specification for a process the supervisor starts.
///
/// Both the server and the shutdown companion are described by a `CommandSpec`
/// so the command line is inspectable (and testable) before anything is spawned.
/// Arguments are discrete `OsString` elements; no shell is ever involved, so a
/// classpath wildcard such as `lib/*` reaches the JVM literally.
///
/// # Example
///
/// ```rust
/// use rsqa_runner::CommandSpec;
/// use std::ffi::OsString;
///
/// let cmd = CommandSpec::new("java")
///     .arg("-classpath")
///     .arg("lib/*")
///     .arg("com.riskshield.server.Shutdown")
///     .cwd("work");
///
/// assert_eq!(cmd.program, OsString::from("java"));
/// assert_eq!(cmd.args.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// The program to execute
    pub program: OsString,
    /// Arguments as discrete elements (NOT shell strings)
    pub args: Vec<OsString>,
    /// Optional working directory
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    #[must_use]
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Set the working directory of the child.
    #[must_use]
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Lossy program name, used in error messages.
    #[must_use]
    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    /// Space-joined rendering of the command line for log output.
    ///
    /// This is for humans only; it is never handed to a shell.
    #[must_use]
    pub fn display_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|part| part.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Convert this `CommandSpec` into a `tokio::process::Command`.
    ///
    /// Stdio configuration is left to the caller.
    #[must_use]
    pub fn to_tokio_command(&self) -> TokioCommand {
        let mut cmd = TokioCommand::new(&self.program);
        cmd.args(&self.args);

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }
}
