//! CLI command implementations (facade).
//!
//! Re-exports the command surface used by `run.rs`. Implementations live in
//! `commands/*`.

mod check_log;
mod compare_csv;
mod config_cmd;
mod smoke;

pub use check_log::execute_check_log_command;
pub use compare_csv::execute_compare_csv_command;
pub use config_cmd::execute_config_command;
pub use smoke::execute_smoke_command;
