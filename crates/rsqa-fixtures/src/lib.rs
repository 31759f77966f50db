//! Fixture comparison and log assertions for RiskShield-Server tests.
//!
//! - [`csv`]: column-oriented CSV comparison, independent of column order
//! - [`log`]: line-based checks on server log files
//! - [`hex`]: hex rendering used in mismatch diagnostics

pub mod csv;
pub mod hex;
pub mod log;

mod charset;

pub use crate::csv::{CsvDialect, CsvTable, compare_csv_files, compare_tables, parse_csv, parse_csv_text};
pub use crate::hex::to_hex;
pub use crate::log::{
    LogScan, MAX_REPORTED_LINES, confirm_contains, confirm_contains_count, confirm_not_contains,
    count_matching_lines, matching_lines,
};
