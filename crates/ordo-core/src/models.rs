//! Data models for ordo
//!
//! Defines the core data structures: Item and Direction. Items carry an
//! integer `order` key; the rendered sequence is always the ascending sort
//! of items by that key.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Spacing between consecutive order keys.
///
/// Keys are assigned as multiples of this step. Gaps between keys are
/// permitted; only the relative order matters.
pub const ORDER_STEP: i64 = 1000;

/// Order key for an item at the given 0-based position
pub fn order_for_position(position: usize) -> i64 {
    (position as i64 + 1) * ORDER_STEP
}

/// A single task list entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    /// Unique identifier, assigned by the store at creation
    pub id: Uuid,
    /// Free-form text, set at creation
    pub content: String,
    /// Integer sort key; the sole field the list manager mutates
    pub order: i64,
    /// When this item was created
    pub created_at: DateTime<Utc>,
    /// When this item was last updated
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Create a new item with a fresh id
    pub fn new(content: impl Into<String>, order: i64) -> Self {
        Self::with_id(Uuid::new_v4(), content, order)
    }

    /// Create an item with a specific id (for loading from storage)
    pub fn with_id(id: Uuid, content: impl Into<String>, order: i64) -> Self {
        let now = Utc::now();
        Self {
            id,
            content: content.into(),
            order,
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the order key
    pub fn set_order(&mut self, order: i64) {
        self.order = order;
        self.updated_at = Utc::now();
    }
}

/// Direction for a single-position move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Toward the front of the list (lower order keys)
    Up,
    /// Toward the back of the list (higher order keys)
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            other => Err(format!("Invalid direction: '{}' (expected up or down)", other)),
        }
    }
}

/// Sort items into rendered sequence: ascending by order key.
///
/// Equal keys are broken by id so rendering stays deterministic even when
/// a race has produced a tie.
pub fn sort_items(items: &mut [Item]) {
    items.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
}
