//! CLI command handlers

pub mod config;
pub mod item;
pub mod status;
pub mod watch;
