//! Test work directories for RiskShield-Server tests.
//!
//! Each test owns a directory holding its fixtures and a `work/`
//! sub-directory the server writes into. [`TestWorkspace`] recreates `work/`
//! before the test and deletes it afterwards unless asked to keep it.

pub mod fs_ops;
mod workspace;

pub use fs_ops::{copy_file, delete_all_in, delete_directory, ensure_directory};
pub use workspace::{TestWorkspace, WORK_DIR_NAME};
