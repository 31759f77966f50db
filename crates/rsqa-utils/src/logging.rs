//! Tracing setup and structured log helpers for rsqa
//!
//! Harness events go through `tracing` to stderr. Server output never does;
//! it is written to the server log file by the runner.

use std::io::IsTerminal;
use std::path::Path;
use tracing::{Level, info, span, warn};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use rsqa_runner::{DrainReport, ShutdownReport};

fn use_color() -> bool {
    std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins when set. Otherwise the filter is `rsqa=info,warn`, or
/// `rsqa=debug,info` when `verbose` is set, which also adds targets and span
/// close events.
///
/// # Errors
///
/// Fails when a global subscriber is already installed.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("rsqa=debug,info")
            } else {
                EnvFilter::try_new("rsqa=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if verbose {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(use_color())
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_line_number(false)
                    .with_file(false)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(use_color())
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_line_number(false)
                    .with_file(false)
                    .compact(),
            )
            .try_init()?;
    }

    Ok(())
}

/// Span covering one server from startup to shutdown.
pub fn server_span(label: &str, instance_id: u32) -> tracing::Span {
    span!(
        Level::INFO,
        "server",
        label = %label,
        instance_id = instance_id,
    )
}

pub fn log_server_started(label: &str, pid: Option<u32>, log_file: &Path) {
    info!(
        label = %label,
        pid = ?pid,
        log_file = %log_file.display(),
        "Server started"
    );
}

pub fn log_server_stopped(label: &str, report: &ShutdownReport) {
    if report.is_clean() {
        info!(
            label = %label,
            exit_code = report.exit_code,
            "Server stopped"
        );
    } else {
        warn!(
            label = %label,
            exit_code = report.exit_code,
            status = %report.status,
            server_killed = report.server_killed,
            "Server stopped uncleanly"
        );
    }
    for drain in report.drains.iter().filter(|d| !d.is_clean()) {
        log_drain_failure(drain);
    }
}

/// Drain failures never fail a test; they are surfaced here instead.
pub fn log_drain_failure(report: &DrainReport) {
    warn!(
        stream = %report.stream,
        status = ?report.status,
        lines_forwarded = report.lines_forwarded,
        "Server output drain did not finish cleanly"
    );
}
