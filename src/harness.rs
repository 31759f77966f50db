//! Project defaults for starting and stopping RiskShield-Server in tests.
//!
//! [`Harness`] turns a [`Config`] into server launches and shutdowns and logs
//! both through `tracing`. A typical test:
//!
//! ```rust,no_run
//! use rsqa::{Harness, LOG_LEVEL_MARKERS};
//! use rsqa::fixtures::confirm_not_contains;
//! use std::path::Path;
//!
//! # async fn smoke() -> Result<(), rsqa::QaError> {
//! let harness = Harness::discover()?;
//! let workspace = harness.prepare_workspace("tests/smoke")?;
//!
//! let mut server = harness
//!     .startup(workspace.work_dir().as_std_path(), Path::new("tests/smoke/server.ini"), "smoke")
//!     .await?;
//! let report = harness.shutdown(&mut server, None).await?;
//! assert_eq!(report.exit_code, 0);
//!
//! confirm_not_contains(server.log_path(), &LOG_LEVEL_MARKERS)?;
//! workspace.finish()?;
//! # Ok(())
//! # }
//! ```

use camino::Utf8PathBuf;
use std::path::Path;
use tracing::Instrument;

use rsqa_config::{CliArgs, Config};
use rsqa_runner::{ServerProcess, ShutdownReport, SupervisorError};
use rsqa_utils::error::QaError;
use rsqa_utils::logging::{log_server_started, log_server_stopped, server_span};
use rsqa_workspace::TestWorkspace;

/// Substrings marking warning, error and fatal lines in the server log.
pub const LOG_LEVEL_MARKERS: [&str; 3] = ["| W |", "| E |", "| F |"];

/// Starts and stops servers using one resolved configuration.
#[derive(Debug, Clone)]
pub struct Harness {
    config: Config,
}

impl Harness {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Harness configured from the discovered config file and environment.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::Config`] when the config file is invalid.
    pub fn discover() -> Result<Self, QaError> {
        Ok(Self::new(Config::discover(&CliArgs::default())?))
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fresh `work/` directory below `test_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::Directory`] when the directory cannot be recreated.
    pub fn prepare_workspace(
        &self,
        test_dir: impl Into<Utf8PathBuf>,
    ) -> Result<TestWorkspace, QaError> {
        Ok(TestWorkspace::prepare(test_dir)?)
    }

    /// Start a server in `work_dir` with `server_ini` and wait for readiness.
    ///
    /// `label` names the test; it is passed to the JVM and attached to every
    /// log event of this startup.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::Supervisor`] when the server cannot be launched or
    /// never prints its startup marker.
    pub async fn startup(
        &self,
        work_dir: &Path,
        server_ini: &Path,
        label: &str,
    ) -> Result<ServerProcess, QaError> {
        let launch = self.config.server_launch(work_dir, server_ini, label);
        let span = server_span(label, launch.instance_id);

        let server = ServerProcess::start(&launch).instrument(span).await?;
        log_server_started(label, server.pid(), server.log_path());
        Ok(server)
    }

    /// Stop `server`, using `port` instead of the configured shutdown port
    /// when given.
    ///
    /// A non-zero companion exit code is part of the report, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::Supervisor`] when the companion cannot be run or the
    /// server was already stopped.
    pub async fn shutdown(
        &self,
        server: &mut ServerProcess,
        port: Option<u16>,
    ) -> Result<ShutdownReport, QaError> {
        let options = self.config.shutdown_options(port);
        let span = server_span(server.label(), self.config.server.instance_id);

        let report = server.shutdown(&options).instrument(span).await?;
        log_server_stopped(server.label(), &report);
        Ok(report)
    }

    /// Like [`Harness::shutdown`], but a non-zero companion exit code is an
    /// error too.
    ///
    /// # Errors
    ///
    /// As [`Harness::shutdown`], plus [`SupervisorError::Shutdown`] naming
    /// the companion's exit status.
    pub async fn shutdown_ok(
        &self,
        server: &mut ServerProcess,
        port: Option<u16>,
    ) -> Result<ShutdownReport, QaError> {
        let report = self.shutdown(server, port).await?;
        if report.status.is_success() {
            return Ok(report);
        }
        Err(SupervisorError::Shutdown {
            reason: format!(
                "shutdown command exited with {} ({})",
                report.exit_code,
                report.status.description()
            ),
        }
        .into())
    }
}
