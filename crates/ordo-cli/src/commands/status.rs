//! Status command handler

use anyhow::Result;

use ordo_core::{AccessMode, Config, ListManager};

use crate::output::Output;

/// Show store location, access mode, and item count
pub fn show(config: &Config, manager: &ListManager, output: &Output) -> Result<()> {
    let access = AccessMode::from_parts(config.access_key.clone(), config.load_token()?);

    if output.is_json() {
        println!(
            "{}",
            serde_json::json!({
                "store": config.server_url.clone()
                    .unwrap_or_else(|| config.items_path().display().to_string()),
                "remote": config.server_url.is_some(),
                "access": access.as_ref().map(|a| a.label()),
                "items": manager.items().len(),
            })
        );
        return Ok(());
    }

    match &config.server_url {
        Some(url) => println!("Store:  {} (remote)", url),
        None => println!("Store:  {} (local)", config.items_path().display()),
    }
    match access {
        Some(mode) => println!("Access: {}", mode.label()),
        None => println!("Access: none configured"),
    }
    println!("Items:  {}", manager.items().len());

    Ok(())
}
