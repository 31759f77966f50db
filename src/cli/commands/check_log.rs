//! Check-log command implementation
//!
//! Handles `rsqa check-log FILE`.

use anyhow::Result;

use crate::LOG_LEVEL_MARKERS;
use crate::cli::args::CheckLogArgs;
use crate::fixtures::LogScan;

/// Execute the check-log command.
///
/// Without `--target` the warning, error and fatal markers are used; without
/// `--present` or `--count` the check is `--absent`.
pub fn execute_check_log_command(args: &CheckLogArgs) -> Result<()> {
    let targets: Vec<String> = if args.targets.is_empty() {
        LOG_LEVEL_MARKERS.iter().map(ToString::to_string).collect()
    } else {
        args.targets.clone()
    };

    let mut scan = LogScan::new(&args.file);
    if let Some(charset) = &args.charset {
        scan = scan.with_charset(charset);
    }

    if let Some(expected) = args.count {
        scan.confirm_contains_count(expected, &targets)?;
        println!("✓ {expected} matching lines in {}", args.file.display());
    } else if args.present {
        scan.confirm_contains(&targets)?;
        println!("✓ {} contains {targets:?}", args.file.display());
    } else {
        scan.confirm_not_contains(&targets)?;
        println!("✓ {} has no lines containing {targets:?}", args.file.display());
    }
    Ok(())
}
