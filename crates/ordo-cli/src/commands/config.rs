//! Config command handlers

use anyhow::{bail, Context, Result};
use std::path::PathBuf;

use ordo_core::Config;

use crate::output::Output;

/// Show the current configuration
pub fn show(output: &Output) -> Result<()> {
    let config = Config::load()?;

    if output.is_json() {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        println!("Config file: {}", Config::config_file_path().display());
        println!();
        println!("data_dir   = {}", config.data_dir.display());
        println!(
            "server_url = {}",
            config.server_url.as_deref().unwrap_or("(not set, using local store)")
        );
        println!(
            "access_key = {}",
            if config.access_key.is_some() {
                "(set)"
            } else {
                "(not set)"
            }
        );
    }
    Ok(())
}

/// Set a configuration value
pub fn set(key: String, value: String, output: &Output) -> Result<()> {
    let mut config = Config::load()?;

    match key.as_str() {
        "data_dir" => config.data_dir = PathBuf::from(&value),
        "server_url" => {
            config.server_url = if value.is_empty() { None } else { Some(value.clone()) }
        }
        "access_key" => {
            config.access_key = if value.is_empty() { None } else { Some(value.clone()) }
        }
        other => bail!(
            "Unknown config key: '{}' (expected data_dir, server_url, or access_key)",
            other
        ),
    }

    config.save().context("Failed to save configuration")?;
    output.success(&format!("Set {} = {}", key, value));
    Ok(())
}
