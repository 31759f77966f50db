//! Config command implementation
//!
//! Handles `rsqa config`: print every effective setting with its source.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::Config;
use rsqa_config::EffectiveValue;

#[derive(Serialize)]
struct ConfigOutput<'a> {
    config_file: Option<&'a Path>,
    values: BTreeMap<String, EffectiveValue>,
}

/// Execute the config command.
pub fn execute_config_command(json: bool, config: &Config) -> Result<()> {
    let output = ConfigOutput {
        config_file: config.config_file.as_deref(),
        values: config.effective_config(),
    };

    if json {
        let json = serde_json::to_string_pretty(&output).context("Failed to emit config JSON")?;
        println!("{json}");
        return Ok(());
    }

    match output.config_file {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: none (using defaults)"),
    }
    let width = output.values.keys().map(String::len).max().unwrap_or(0);
    for (key, effective) in &output.values {
        println!("  {key:<width$} = {}  [{}]", effective.value, effective.source);
    }
    Ok(())
}
