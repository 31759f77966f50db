//! Compare-csv command implementation
//!
//! Handles `rsqa compare-csv LEFT RIGHT`.

use anyhow::Result;

use crate::cli::args::CompareCsvArgs;
use crate::fixtures::{CsvDialect, compare_csv_files};

/// Execute the compare-csv command. Differences surface as assertion errors.
pub fn execute_compare_csv_command(args: &CompareCsvArgs) -> Result<()> {
    let dialect = CsvDialect::new(args.separator, args.quote).with_charset(&args.charset);
    compare_csv_files(&args.left, &args.right, &dialect)?;

    println!(
        "✓ {} matches {}",
        args.right.display(),
        args.left.display()
    );
    Ok(())
}
