use std::path::PathBuf;

/// Command-line overrides, applied on top of file and defaults.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Explicit config file; disables discovery
    pub config_path: Option<PathBuf>,
    pub runtime_dir: Option<PathBuf>,
    pub java: Option<PathBuf>,
    pub startup_marker: Option<String>,
    pub port: Option<u16>,
}
