//! Item command handlers

use anyhow::{bail, Result};
use uuid::Uuid;

use ordo_core::{Direction, ListManager};

use crate::output::Output;

/// Add a new item
///
/// Blank input is dropped without an error, matching the manager's
/// validation behavior.
pub async fn add(manager: &mut ListManager, content: String, output: &Output) -> Result<()> {
    if manager.create(&content).await? {
        output.success(&format!("Added: {}", content.trim()));
    } else {
        output.message("Nothing to add.");
    }
    Ok(())
}

/// List all items in rendered order
pub fn list(manager: &ListManager, output: &Output) -> Result<()> {
    output.print_items(manager.items());
    Ok(())
}

/// Move an item one position up or down
pub async fn move_item(
    manager: &mut ListManager,
    id: String,
    direction: Direction,
    output: &Output,
) -> Result<()> {
    let id = resolve_item_id(manager, &id)?;

    if manager.move_item(id, direction).await? {
        output.success(&format!("Moved {}", direction));
    } else {
        let edge = match direction {
            Direction::Up => "top",
            Direction::Down => "bottom",
        };
        output.message(&format!("Item is already at the {}.", edge));
    }
    Ok(())
}

/// Delete an item
pub async fn delete(manager: &mut ListManager, id: String, output: &Output) -> Result<()> {
    let id = resolve_item_id(manager, &id)?;
    let content = manager
        .get(id)
        .map(|item| item.content.clone())
        .unwrap_or_default();

    manager.delete(id).await?;
    output.success(&format!("Deleted: {}", content));
    Ok(())
}

/// Resolve a full UUID or an unambiguous prefix against the current list
fn resolve_item_id(manager: &ListManager, input: &str) -> Result<Uuid> {
    if let Ok(id) = Uuid::parse_str(input) {
        return Ok(id);
    }

    if input.len() < 4 {
        bail!("ID prefix too short: '{}' (use at least 4 characters)", input);
    }

    // Rendered ids are lowercase hex; accept prefixes in either case
    let input = input.to_ascii_lowercase();
    let matches: Vec<Uuid> = manager
        .items()
        .iter()
        .filter(|item| item.id.to_string().starts_with(&input))
        .map(|item| item.id)
        .collect();

    match matches.len() {
        0 => bail!("No item matches ID '{}'", input),
        1 => Ok(matches[0]),
        n => bail!("ID prefix '{}' is ambiguous ({} matches)", input, n),
    }
}
