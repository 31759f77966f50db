//! rsqa - integration-test harness for RiskShield-Server
//!
//! Tests use rsqa to start the server JVM in a scratch directory, wait for
//! its startup marker, stop it through the shutdown companion, and compare
//! what it produced against fixtures.
//!
//! The work is split over several crates, re-exported here:
//!
//! - [`runner`]: process supervision and output draining
//! - [`fixtures`]: CSV comparison and log assertions
//! - [`workspace`]: per-test work directories
//! - [`config`]: configuration discovery and precedence
//! - [`utils`]: errors, exit codes and logging setup
//!
//! # Stable Public API
//!
//! - [`Harness`] and [`LOG_LEVEL_MARKERS`]
//! - [`Config`], [`ConfigSource`], [`CliArgs`]
//! - [`ServerProcess`], [`ShutdownReport`], [`ServerExit`]
//! - [`QaError`], [`ExitCode`]

pub mod cli;
pub mod harness;

pub use rsqa_config as config;
pub use rsqa_fixtures as fixtures;
pub use rsqa_runner as runner;
pub use rsqa_utils as utils;
pub use rsqa_workspace as workspace;

pub use harness::{Harness, LOG_LEVEL_MARKERS};
pub use rsqa_config::{CliArgs, Config, ConfigSource};
pub use rsqa_runner::{ServerExit, ServerProcess, ShutdownReport, ShutdownStatus};
pub use rsqa_utils::{ExitCode, QaError};
pub use rsqa_workspace::TestWorkspace;
