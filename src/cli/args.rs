//! CLI argument definitions and parsing structures
//!
//! This module defines the command-line interface structure using clap,
//! including the main `Cli` struct and the subcommand enum.

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// rsqa - integration-test harness for RiskShield-Server
#[derive(Parser, Debug)]
#[command(name = "rsqa")]
#[command(about = "Start, stop and check RiskShield-Server instances for integration tests")]
#[command(long_about = r#"
rsqa launches a RiskShield-Server JVM, waits for its startup marker, stops it
through the shutdown companion and checks what it left behind.

EXAMPLES:
  # Start a server in tests/smoke/work, stop it and check its log
  rsqa smoke --work-dir tests/smoke --server-ini tests/smoke/server.ini

  # Keep the server up for five seconds and print the report as JSON
  rsqa smoke --work-dir tests/smoke --server-ini tests/smoke/server.ini --hold-ms 5000 --json

  # Compare a produced CSV file with its fixture
  rsqa compare-csv tests/batch/expected.csv tests/batch/work/out.csv --separator ';'

  # Make sure a log has no warning, error or fatal lines
  rsqa check-log tests/smoke/work/rss.log --absent

  # Show the effective configuration and where each value came from
  rsqa config

CONFIGURATION:
  Precedence: CLI flags > config file > CLASSPATH environment variable > defaults
  The config file is discovered by searching upward from CWD for .rsqa/config.toml
  Use --config or RSQA_CONFIG to name a config file explicitly
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Server distribution root containing bin/ and lib/
    #[arg(long, global = true)]
    pub runtime_dir: Option<PathBuf>,

    /// Java binary used for the server and the shutdown companion
    #[arg(long, global = true)]
    pub java: Option<PathBuf>,

    /// Stdout substring that signals the server is ready
    #[arg(long, global = true)]
    pub marker: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start a server, stop it again and check its log
    Smoke(SmokeArgs),

    /// Compare two CSV files column by column
    CompareCsv(CompareCsvArgs),

    /// Check a log file for lines containing target strings
    CheckLog(CheckLogArgs),

    /// Show the effective configuration with value sources
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct SmokeArgs {
    /// Test directory; the server runs in its work/ sub-directory
    #[arg(long)]
    pub work_dir: Utf8PathBuf,

    /// Server initialization file
    #[arg(long)]
    pub server_ini: PathBuf,

    /// Shutdown port (overrides configuration)
    #[arg(long)]
    pub port: Option<u16>,

    /// Test label passed to the JVM as -Dtest.method
    #[arg(long, default_value = "smoke")]
    pub label: String,

    /// Keep the server running this long before shutting it down
    #[arg(long, default_value_t = 0)]
    pub hold_ms: u64,

    /// Report warning, error and fatal log lines without failing
    #[arg(long)]
    pub allow_log_warnings: bool,

    /// Keep the work directory after the run
    #[arg(long)]
    pub keep_work: bool,

    /// Output the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct CompareCsvArgs {
    /// Expected CSV file
    pub left: PathBuf,

    /// Actual CSV file
    pub right: PathBuf,

    /// Field separator
    #[arg(long, default_value_t = ',')]
    pub separator: char,

    /// Quote character
    #[arg(long, default_value_t = '"')]
    pub quote: char,

    /// Character encoding label, e.g. UTF-8 or ISO-8859-1
    #[arg(long, default_value = "UTF-8")]
    pub charset: String,
}

#[derive(Args, Debug)]
pub struct CheckLogArgs {
    /// Log file to scan; a missing file has no lines
    pub file: PathBuf,

    /// Substring to look for (repeatable); defaults to the W/E/F level markers
    #[arg(long = "target", short = 't')]
    pub targets: Vec<String>,

    /// Fail if any line matches (default)
    #[arg(long, conflicts_with_all = ["present", "count"])]
    pub absent: bool,

    /// Fail unless at least one line matches
    #[arg(long, conflicts_with = "count")]
    pub present: bool,

    /// Fail unless exactly this many lines match
    #[arg(long)]
    pub count: Option<usize>,

    /// Character encoding label of the log file
    #[arg(long)]
    pub charset: Option<String>,
}

/// Build the clap command, for tests and completions.
#[must_use]
pub fn build_cli() -> clap::Command {
    <Cli as clap::CommandFactory>::command()
}
