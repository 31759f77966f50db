//! Smoke command implementation
//!
//! Handles `rsqa smoke`: start a server in a fresh work directory, optionally
//! keep it up for a while, stop it and check its log for level markers.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::args::SmokeArgs;
use crate::fixtures::LogScan;
use crate::{Config, Harness, LOG_LEVEL_MARKERS, QaError, ShutdownReport};

/// Result of one smoke run, printed as text or JSON.
#[derive(Debug, Clone, Serialize)]
pub struct SmokeSummary {
    pub label: String,
    pub pid: Option<u32>,
    pub log_file: PathBuf,
    pub work_dir: PathBuf,
    pub shutdown: ShutdownReport,
    /// Log lines carrying a warning, error or fatal marker
    pub log_findings: usize,
}

/// Execute the smoke command.
pub async fn execute_smoke_command(args: &SmokeArgs, config: &Config) -> Result<()> {
    let harness = Harness::new(config.clone());
    let mut workspace = harness.prepare_workspace(args.work_dir.clone())?;
    if args.keep_work {
        workspace.preserve();
    }
    let work_dir = workspace.work_dir().as_std_path().to_path_buf();

    let mut server = harness
        .startup(&work_dir, &args.server_ini, &args.label)
        .await?;

    if args.hold_ms > 0 {
        tracing::info!(hold_ms = args.hold_ms, "Holding server before shutdown");
        tokio::time::sleep(Duration::from_millis(args.hold_ms)).await;
    }

    let shutdown = harness.shutdown_ok(&mut server, args.port).await?;

    let scan = LogScan::new(server.log_path());
    let log_findings = scan
        .count_matching_lines(&LOG_LEVEL_MARKERS)
        .map_err(QaError::from)?;

    let summary = SmokeSummary {
        label: args.label.clone(),
        pid: server.pid(),
        log_file: server.log_path().to_path_buf(),
        work_dir,
        shutdown,
        log_findings,
    };

    if args.json {
        let json = serde_json::to_string_pretty(&summary).context("Failed to emit smoke JSON")?;
        println!("{json}");
    } else {
        print_summary(&summary);
    }

    if !args.allow_log_warnings {
        scan.confirm_not_contains(&LOG_LEVEL_MARKERS)?;
    }

    workspace.finish().map_err(QaError::from)?;
    Ok(())
}

fn print_summary(summary: &SmokeSummary) {
    let pid = summary
        .pid
        .map_or_else(|| "unknown".to_string(), |pid| pid.to_string());
    println!("Server '{}' (pid {pid})", summary.label);
    println!(
        "  shutdown: exit code {} ({})",
        summary.shutdown.exit_code,
        summary.shutdown.status.description()
    );
    if summary.shutdown.server_killed {
        println!("  server was killed: {:?}", summary.shutdown.server_exit);
    }
    println!("  log file: {}", summary.log_file.display());
    if summary.log_findings == 0 {
        println!("  log: no warning, error or fatal lines");
    } else {
        println!(
            "  log: {} warning, error or fatal lines",
            summary.log_findings
        );
    }
}
