//! CLI entry point and dispatch logic
//!
//! This module owns the `run()` function which:
//! - Parses CLI arguments
//! - Builds CliArgs and discovers Config
//! - Creates the tokio runtime
//! - Dispatches to command handlers
//! - Handles all error output

use clap::Parser;

use super::args::{Cli, Commands};
use super::commands;

use crate::{CliArgs, Config, ExitCode, QaError};
use rsqa_utils::logging::init_tracing;

/// Main CLI execution function.
///
/// Handles ALL output including errors and returns the exit code to use on
/// failure; main.rs only calls `std::process::exit(code.as_i32())`.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("warning: logging not initialized: {e}");
    }

    let cli_args = CliArgs {
        config_path: cli.config.clone(),
        runtime_dir: cli.runtime_dir.clone(),
        java: cli.java.clone(),
        startup_marker: cli.marker.clone(),
        port: match &cli.command {
            Commands::Smoke(args) => args.port,
            _ => None,
        },
    };

    let config = match Config::discover(&cli_args) {
        Ok(config) => config,
        Err(err) => {
            let err = QaError::from(err);
            eprintln!("{}", err.display_for_user());
            return Err(err.to_exit_code());
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("✗ Failed to create async runtime: {e}");
            return Err(ExitCode::INTERNAL);
        }
    };

    let result = rt.block_on(async {
        match cli.command {
            Commands::Smoke(args) => commands::execute_smoke_command(&args, &config).await,
            Commands::CompareCsv(args) => commands::execute_compare_csv_command(&args),
            Commands::CheckLog(args) => commands::execute_check_log_command(&args),
            Commands::Config { json } => commands::execute_config_command(json, &config),
        }
    });

    if let Err(error) = result {
        if let Some(qa_error) = error.downcast_ref::<QaError>() {
            eprintln!("{}", qa_error.display_for_user());
            return Err(qa_error.to_exit_code());
        }

        eprintln!("✗ Unexpected error: {error:#}");
        eprintln!("\n  General troubleshooting:");
        eprintln!("    - Run with --verbose for more detailed output");
        eprintln!("    - Run `rsqa config` to check the effective configuration");
        return Err(ExitCode::INTERNAL);
    }

    Ok(())
}
